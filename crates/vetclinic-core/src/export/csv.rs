//! CSV report export.
//!
//! Files start with a UTF-8 byte order mark so spreadsheet tools detect the
//! encoding. Every field is quoted; lines end with `\n`.

use serde::{Deserialize, Serialize};

use crate::db::{GroomingReportRow, InvoiceReportRow};
use crate::money;

/// UTF-8 byte order mark.
pub const UTF8_BOM: &str = "\u{feff}";

const INVOICE_HEADER: [&str; 8] = [
    "Número",
    "Fecha",
    "Propietario",
    "Total",
    "Moneda",
    "Pagado USD",
    "Pendiente USD",
    "Estado",
];

const GROOMING_HEADER: [&str; 7] = [
    "Fecha",
    "Paciente",
    "Propietario",
    "Servicio",
    "Precio",
    "Moneda",
    "Estado",
];

/// Invoice report as CSV.
pub fn invoice_report_csv(rows: &[InvoiceReportRow]) -> String {
    let mut csv = String::from(UTF8_BOM);
    push_record(&mut csv, &INVOICE_HEADER);

    for row in rows {
        push_record(
            &mut csv,
            &[
                row.number.as_str(),
                row.issued_at.as_str(),
                row.owner_name.as_str(),
                amount(row.total).as_str(),
                row.currency.as_str(),
                amount(row.paid_usd).as_str(),
                amount(row.pending_usd).as_str(),
                row.status.as_str(),
            ],
        );
    }

    csv
}

/// Grooming report as CSV.
pub fn grooming_report_csv(rows: &[GroomingReportRow]) -> String {
    let mut csv = String::from(UTF8_BOM);
    push_record(&mut csv, &GROOMING_HEADER);

    for row in rows {
        push_record(
            &mut csv,
            &[
                row.date.as_str(),
                row.patient_name.as_str(),
                row.owner_name.as_str(),
                row.service_type.as_str(),
                amount(row.price).as_str(),
                row.currency.as_str(),
                row.status.as_str(),
            ],
        );
    }

    csv
}

/// Both reports for a date range, for JSON consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    pub from: String,
    pub to: String,
    pub exported_at: String,
    pub invoices: Vec<InvoiceReportRow>,
    pub grooming: Vec<GroomingReportRow>,
}

impl ReportExport {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        invoices: Vec<InvoiceReportRow>,
        grooming: Vec<GroomingReportRow>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            invoices,
            grooming,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn amount(value: f64) -> String {
    format!("{:.2}", money::round_display(value))
}

fn push_record(csv: &mut String, fields: &[&str]) {
    let line: Vec<String> = fields.iter().map(|f| quote_csv(f)).collect();
    csv.push_str(&line.join(","));
    csv.push('\n');
}

/// Quote a field, doubling embedded quotes.
fn quote_csv(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
