//! Printable HTML view of an invoice.

use crate::billing::PaymentSummary;
use crate::models::{ClinicSettings, Invoice, Owner, Payment};
use crate::money::{self, Currency};

/// Render an invoice as a self-contained HTML page for printing.
///
/// Only active payments are listed. All user text is escaped.
pub fn render_invoice_html(
    invoice: &Invoice,
    owner: &Owner,
    settings: &ClinicSettings,
    payments: &[Payment],
) -> String {
    let summary = PaymentSummary::of(invoice);
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Factura {}</title>\n", escape_html(&invoice.number)));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    // Clinic header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&settings.name)));
    for line in [&settings.tax_id, &settings.address, &settings.phone, &settings.email]
        .into_iter()
        .flatten()
    {
        html.push_str(&format!("<p>{}</p>\n", escape_html(line)));
    }
    html.push_str("</header>\n");

    html.push_str("<section class=\"invoice-meta\">\n");
    html.push_str(&format!("<p><strong>Factura:</strong> {}</p>\n", escape_html(&invoice.number)));
    html.push_str(&format!("<p><strong>Fecha:</strong> {}</p>\n", escape_html(&invoice.issued_at)));
    html.push_str(&format!("<p><strong>Cliente:</strong> {}</p>\n", escape_html(&owner.name)));
    if let Some(doc) = &owner.document_id {
        html.push_str(&format!("<p><strong>Documento:</strong> {}</p>\n", escape_html(doc)));
    }
    html.push_str(&format!("<p><strong>Tasa:</strong> {:.2} Bs/USD</p>\n", invoice.rate()));
    html.push_str(&format!("<p><strong>Estado:</strong> {}</p>\n", summary.status.as_str()));
    html.push_str("</section>\n");

    html.push_str("<table class=\"items\">\n<thead><tr><th>Descripción</th><th>Cant.</th><th>Precio</th><th>Subtotal</th></tr></thead>\n<tbody>\n");
    for item in &invoice.items {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&item.description),
            item.quantity,
            money::format_amount(item.unit_cost, invoice.currency),
            money::format_amount(item.subtotal(), invoice.currency),
        ));
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str("<table class=\"totals\">\n");
    total_row(&mut html, "Total USD", money::format_amount(summary.total_usd, Currency::Usd));
    total_row(&mut html, "Total Bs", money::format_amount(summary.total_bs, Currency::Bs));
    total_row(&mut html, "Pagado USD", money::format_amount(summary.paid_usd, Currency::Usd));
    total_row(&mut html, "Pendiente USD", money::format_amount(summary.pending_usd, Currency::Usd));
    total_row(&mut html, "Pendiente Bs", money::format_amount(summary.pending_bs, Currency::Bs));
    html.push_str("</table>\n");

    let active: Vec<&Payment> = payments
        .iter()
        .filter(|p| p.invoice_id == invoice.id && p.is_active())
        .collect();
    if !active.is_empty() {
        html.push_str("<h2>Pagos</h2>\n<table class=\"payments\">\n<thead><tr><th>Fecha</th><th>Método</th><th>Monto</th><th>Referencia</th></tr></thead>\n<tbody>\n");
        for payment in active {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(payment.created_at.get(..10).unwrap_or(payment.created_at.as_str())),
                payment.method.as_str(),
                money::format_amount(payment.amount, payment.currency),
                escape_html(payment.reference.as_deref().unwrap_or("")),
            ));
        }
        html.push_str("</tbody>\n</table>\n");
    }

    if let Some(notes) = &invoice.notes {
        html.push_str(&format!("<p class=\"notes\">{}</p>\n", escape_html(notes)));
    }
    if let Some(footer) = &settings.invoice_footer {
        html.push_str(&format!("<footer>{}</footer>\n", escape_html(footer)));
    }

    html.push_str("</body>\n</html>\n");
    html
}

const STYLE: &str = "<style>\n\
body { font-family: sans-serif; font-size: 12px; margin: 2em; }\n\
table { width: 100%; border-collapse: collapse; margin-top: 1em; }\n\
th, td { border-bottom: 1px solid #ccc; padding: 4px; text-align: left; }\n\
table.totals td:last-child { text-align: right; }\n\
@media print { body { margin: 0; } }\n\
</style>\n";

fn total_row(html: &mut String, label: &str, value: String) {
    html.push_str(&format!("<tr><td>{}</td><td>{}</td></tr>\n", label, value));
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceItem, PaymentMethod, PaymentState};

    fn fixture() -> (Invoice, Owner, ClinicSettings) {
        let owner = Owner::new("Ana <script>".into());
        let mut invoice = Invoice::from_items(
            owner.id.clone(),
            "F-000042".into(),
            Currency::Usd,
            40.0,
            vec![InvoiceItem::new("Consulta & control".into(), 1.0, 100.0)],
        );
        invoice.amount_paid_bs = 60.0;
        invoice.amount_paid = 1.5;
        let settings = ClinicSettings {
            invoice_footer: Some("Gracias por su visita".into()),
            ..ClinicSettings::default()
        };
        (invoice, owner, settings)
    }

    fn payment(invoice_id: &str, status: PaymentState) -> Payment {
        Payment {
            id: "p1".into(),
            invoice_id: invoice_id.into(),
            amount: 60.0,
            currency: Currency::Bs,
            exchange_rate: 40.0,
            amount_usd: 1.5,
            method: PaymentMethod::MobilePayment,
            reference: Some("REF-77".into()),
            status,
            created_at: "2024-06-01T10:00:00+00:00".into(),
            cancelled_at: None,
            cancel_reason: None,
            surplus_usd: 0.0,
        }
    }

    #[test]
    fn test_render_contains_totals_and_payments() {
        let (invoice, owner, settings) = fixture();
        let html = render_invoice_html(&invoice, &owner, &settings, &[payment(&invoice.id, PaymentState::Active)]);

        assert!(html.contains("Factura F-000042"));
        assert!(html.contains("$100.00"));
        assert!(html.contains("Bs 4000.00"));
        assert!(html.contains("$98.50"));
        assert!(html.contains("REF-77"));
        assert!(html.contains("2024-06-01"));
        assert!(html.contains("Gracias por su visita"));
        assert!(html.contains("Parcial"));
    }

    #[test]
    fn test_render_one_element_per_line() {
        let (invoice, owner, settings) = fixture();
        let html = render_invoice_html(&invoice, &owner, &settings, &[payment(&invoice.id, PaymentState::Active)]);

        assert!(html.lines().any(|l| l == "<p><strong>Factura:</strong> F-000042</p>"));
        assert!(html.lines().any(|l| l == "<tr><td>Total USD</td><td>$100.00</td></tr>"));
        assert!(html
            .lines()
            .any(|l| l == "<tr><td>2024-06-01</td><td>mobile_payment</td><td>Bs 60.00</td><td>REF-77</td></tr>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_render_escapes_text() {
        let (invoice, owner, settings) = fixture();
        let html = render_invoice_html(&invoice, &owner, &settings, &[]);
        assert!(html.contains("Ana &lt;script&gt;"));
        assert!(html.contains("Consulta &amp; control"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_cancelled_payments_not_listed() {
        let (invoice, owner, settings) = fixture();
        let html = render_invoice_html(&invoice, &owner, &settings, &[payment(&invoice.id, PaymentState::Cancelled)]);
        assert!(!html.contains("REF-77"));
        assert!(!html.contains("<h2>Pagos</h2>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
