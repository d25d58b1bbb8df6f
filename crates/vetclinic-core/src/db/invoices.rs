//! Invoice database operations.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_currency, Database, DbError, DbResult};
use crate::billing::{derive_status, pending_amount, paid_usd};
use crate::models::{Invoice, InvoiceStatus, ResourceType};
use crate::money::{self, Currency};

const INVOICE_COLUMNS: &str = "id, owner_id, patient_id, number, issued_at, total, currency, \
     exchange_rate, amount_paid, amount_paid_usd, amount_paid_bs, payment_status, items, notes, \
     created_at, updated_at";

/// One line of the invoice report export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceReportRow {
    pub number: String,
    pub issued_at: String,
    pub owner_name: String,
    pub total: f64,
    pub currency: Currency,
    pub paid_usd: f64,
    pub pending_usd: f64,
    pub status: InvoiceStatus,
}

impl InvoiceReportRow {
    pub fn new(invoice: &Invoice, owner_name: impl Into<String>) -> Self {
        Self {
            number: invoice.number.clone(),
            issued_at: invoice.issued_at.clone(),
            owner_name: owner_name.into(),
            total: invoice.total,
            currency: invoice.currency,
            paid_usd: paid_usd(invoice),
            pending_usd: pending_amount(invoice),
            status: invoice.payment_status,
        }
    }
}

impl Database {
    /// Insert a new invoice.
    ///
    /// Product lines linked to a catalog item take their quantity out of stock
    /// in the same transaction.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        if !invoice.total.is_finite() || invoice.total < 0.0 {
            return Err(DbError::Constraint(format!(
                "invoice total must be a non-negative number, got {}",
                invoice.total
            )));
        }
        if let Some(item) = invoice
            .items
            .iter()
            .find(|item| !valid_line(item.quantity, item.unit_cost))
        {
            return Err(DbError::Constraint(format!(
                "invalid line '{}': quantity {} unit cost {}",
                item.description, item.quantity, item.unit_cost
            )));
        }

        let tx = self.conn.unchecked_transaction()?;

        let items_json = serde_json::to_string(&invoice.items)?;
        self.conn.execute(
            &format!(
                "INSERT INTO invoices ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                INVOICE_COLUMNS
            ),
            params![
                invoice.id,
                invoice.owner_id,
                invoice.patient_id,
                invoice.number,
                invoice.issued_at,
                invoice.total,
                invoice.currency.as_str(),
                invoice.rate(),
                invoice.amount_paid,
                invoice.amount_paid_usd,
                invoice.amount_paid_bs,
                derive_status(invoice).as_str(),
                items_json,
                invoice.notes,
                invoice.created_at,
                invoice.updated_at,
            ],
        )?;

        for item in &invoice.items {
            if let (ResourceType::Product, Some(product_id)) = (item.resource_type, &item.resource_id) {
                self.adjust_stock(product_id, -item.quantity)?;
            }
        }

        tx.commit()?;
        info!(invoice_id = %invoice.id, number = %invoice.number, total = invoice.total, currency = %invoice.currency, "invoice created");
        Ok(())
    }

    /// Next sequential invoice number (`F-000001`, `F-000002`, ...).
    pub fn next_invoice_number(&self) -> DbResult<String> {
        let last: Option<i64> = self.conn.query_row(
            "SELECT MAX(CAST(SUBSTR(number, 3) AS INTEGER)) FROM invoices WHERE number LIKE 'F-%'",
            [],
            |row| row.get(0),
        )?;
        Ok(format!("F-{:06}", last.unwrap_or(0) + 1))
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS),
                [id],
                invoice_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get an invoice by ID, failing if it does not exist.
    pub(crate) fn require_invoice(&self, id: &str) -> DbResult<Invoice> {
        self.get_invoice(id)?
            .ok_or_else(|| DbError::NotFound(format!("invoice {}", id)))
    }

    /// All invoices, most recent first.
    pub fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        self.query_invoices(
            &format!(
                "SELECT {} FROM invoices ORDER BY issued_at DESC, number DESC",
                INVOICE_COLUMNS
            ),
            params![],
        )
    }

    /// Invoices for an owner, most recent first.
    pub fn list_invoices_for_owner(&self, owner_id: &str) -> DbResult<Vec<Invoice>> {
        self.query_invoices(
            &format!(
                "SELECT {} FROM invoices WHERE owner_id = ? ORDER BY issued_at DESC, number DESC",
                INVOICE_COLUMNS
            ),
            params![owner_id],
        )
    }

    /// Unsettled invoices for an owner, oldest first.
    pub fn list_open_invoices_for_owner(&self, owner_id: &str) -> DbResult<Vec<Invoice>> {
        self.query_invoices(
            &format!(
                "SELECT {} FROM invoices
                 WHERE owner_id = ? AND payment_status IN ('Pendiente', 'Parcial')
                 ORDER BY issued_at, number",
                INVOICE_COLUMNS
            ),
            params![owner_id],
        )
    }

    /// Invoices issued within `[from, to]` (YYYY-MM-DD, inclusive), oldest first.
    pub fn list_invoices_between(&self, from: &str, to: &str) -> DbResult<Vec<Invoice>> {
        self.query_invoices(
            &format!(
                "SELECT {} FROM invoices WHERE issued_at >= ?1 AND issued_at <= ?2 ORDER BY issued_at, number",
                INVOICE_COLUMNS
            ),
            params![from, to],
        )
    }

    fn query_invoices(&self, sql: &str, args: impl rusqlite::Params) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, invoice_row)?;

        let mut invoices = Vec::new();
        for row in rows {
            invoices.push(row?.try_into()?);
        }
        Ok(invoices)
    }

    /// Persist the running sums and status of an invoice.
    pub(crate) fn update_invoice_payment_state(&self, invoice: &Invoice) -> DbResult<()> {
        self.conn.execute(
            r#"
            UPDATE invoices SET
                amount_paid = ?2,
                amount_paid_usd = ?3,
                amount_paid_bs = ?4,
                payment_status = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                invoice.id,
                invoice.amount_paid,
                invoice.amount_paid_usd,
                invoice.amount_paid_bs,
                invoice.payment_status.as_str(),
                invoice.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Mark an invoice `Cancelado`. Its payments are kept as they are.
    ///
    /// Returns false when the invoice was already cancelled.
    pub fn cancel_invoice(&self, invoice_id: &str) -> DbResult<bool> {
        let mut invoice = self.require_invoice(invoice_id)?;
        if invoice.is_cancelled() {
            return Ok(false);
        }
        invoice.payment_status = InvoiceStatus::Cancelado;
        invoice.touch();
        self.update_invoice_payment_state(&invoice)?;
        info!(invoice_id = %invoice_id, number = %invoice.number, "invoice cancelled");
        Ok(true)
    }

    /// Report rows for invoices issued within `[from, to]`.
    pub fn invoice_report(&self, from: &str, to: &str) -> DbResult<Vec<InvoiceReportRow>> {
        let invoices = self.list_invoices_between(from, to)?;
        let mut rows = Vec::with_capacity(invoices.len());
        for invoice in &invoices {
            let owner_name = self
                .get_owner(&invoice.owner_id)?
                .map(|o| o.name)
                .unwrap_or_default();
            rows.push(InvoiceReportRow::new(invoice, owner_name));
        }
        Ok(rows)
    }

    /// Total pending for an owner, in USD.
    pub fn owner_pending_usd(&self, owner_id: &str) -> DbResult<f64> {
        let invoices = self.list_open_invoices_for_owner(owner_id)?;
        let total = invoices
            .iter()
            .map(|invoice| money::to_decimal(pending_amount(invoice)))
            .sum();
        Ok(money::to_f64(total))
    }
}

fn valid_line(quantity: f64, unit_cost: f64) -> bool {
    quantity.is_finite() && quantity > 0.0 && unit_cost.is_finite() && unit_cost >= 0.0
}

fn invoice_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvoiceRow> {
    Ok(InvoiceRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        patient_id: row.get(2)?,
        number: row.get(3)?,
        issued_at: row.get(4)?,
        total: row.get(5)?,
        currency: row.get(6)?,
        exchange_rate: row.get(7)?,
        amount_paid: row.get(8)?,
        amount_paid_usd: row.get(9)?,
        amount_paid_bs: row.get(10)?,
        payment_status: row.get(11)?,
        items: row.get(12)?,
        notes: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Intermediate row struct for database mapping.
struct InvoiceRow {
    id: String,
    owner_id: String,
    patient_id: Option<String>,
    number: String,
    issued_at: String,
    total: f64,
    currency: String,
    exchange_rate: f64,
    amount_paid: f64,
    amount_paid_usd: f64,
    amount_paid_bs: f64,
    payment_status: String,
    items: String,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            owner_id: row.owner_id,
            patient_id: row.patient_id,
            number: row.number,
            issued_at: row.issued_at,
            total: row.total,
            currency: parse_currency(&row.currency)?,
            exchange_rate: money::normalize_rate(Some(row.exchange_rate)),
            amount_paid: row.amount_paid,
            amount_paid_usd: row.amount_paid_usd,
            amount_paid_bs: row.amount_paid_bs,
            payment_status: InvoiceStatus::from_string(&row.payment_status),
            items: serde_json::from_str(&row.items)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
