//! Payment recording and cancellation.
//!
//! Recording and cancelling a payment each run in one SQLite transaction
//! that also updates the invoice's running sums and the owner's credit.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_currency, Database, DbError, DbResult};
use crate::billing::{
    apply_payment, recompute_from_payments, BatchOutcome, BatchPayment, BillingError,
    PaymentRecorder,
};
use crate::models::{Invoice, Payment, PaymentInput, PaymentMethod, PaymentState};
use crate::money::{Currency, PAYMENT_EPSILON};

const PAYMENT_COLUMNS: &str = "id, invoice_id, amount, currency, exchange_rate, amount_usd, method, \
     reference, status, created_at, cancelled_at, cancel_reason, surplus_usd";

/// What a recorded payment produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReceipt {
    /// Stored payments: a credit payment first when credit was used, then the entered one
    pub payments: Vec<Payment>,
    pub credit_used_usd: f64,
    /// Overpayment credited to the owner, in USD
    pub surplus_usd: f64,
    /// Invoice after the payment
    pub invoice: Invoice,
}

impl Database {
    /// Record a payment against an invoice.
    pub fn pay_invoice(&self, invoice_id: &str, input: &PaymentInput) -> DbResult<PaymentReceipt> {
        if input.method == PaymentMethod::Credit && input.amount > 0.0 {
            return Err(BillingError::InvalidCredit(
                "credit payments are made through the credit offset".to_string(),
            )
            .into());
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut invoice = self.require_invoice(invoice_id)?;

        let mut input = input.clone();
        let requested_credit = input.credit_offset_usd.unwrap_or(0.0);
        if requested_credit > 0.0 {
            let owner = self
                .get_owner(&invoice.owner_id)?
                .ok_or_else(|| DbError::NotFound(format!("owner {}", invoice.owner_id)))?;
            if requested_credit - owner.credit_balance > PAYMENT_EPSILON {
                return Err(BillingError::InsufficientCredit {
                    available: owner.credit_balance,
                    requested: requested_credit,
                }
                .into());
            }
            // Within tolerance of the balance: spend what is there.
            input.credit_offset_usd = Some(requested_credit.min(owner.credit_balance));
        }

        let application = apply_payment(&invoice, &input)?;
        let mut payments = Vec::new();

        if application.credit_used_usd > 0.0 {
            let payment = new_payment(
                &invoice.id,
                application.credit_used_usd,
                Currency::Usd,
                application.exchange_rate,
                application.credit_used_usd,
                PaymentMethod::Credit,
                None,
            );
            self.insert_payment(&payment)?;
            self.adjust_owner_credit(&invoice.owner_id, -application.credit_used_usd)?;
            payments.push(payment);
        }

        // The entered payment carries the surplus, even when credit already
        // covered the whole pending amount.
        if application.applied_amount > 0.0 || application.surplus_usd > 0.0 {
            let mut payment = new_payment(
                &invoice.id,
                application.applied_amount,
                application.applied_currency,
                application.exchange_rate,
                application.applied_usd,
                input.method,
                input.reference.clone(),
            );
            payment.surplus_usd = application.surplus_usd;
            self.insert_payment(&payment)?;
            payments.push(payment);
        }

        if application.surplus_usd > 0.0 {
            let balance = self.adjust_owner_credit(&invoice.owner_id, application.surplus_usd)?;
            info!(
                owner_id = %invoice.owner_id,
                surplus_usd = application.surplus_usd,
                credit_balance = balance,
                "overpayment credited to owner"
            );
        }

        application.apply_to(&mut invoice);
        self.update_invoice_payment_state(&invoice)?;
        tx.commit()?;

        info!(
            invoice_id = %invoice.id,
            amount = input.amount,
            currency = %input.currency,
            paid_usd = invoice.amount_paid,
            pending_usd = application.pending_usd,
            status = invoice.payment_status.as_str(),
            "payment recorded"
        );

        Ok(PaymentReceipt {
            payments,
            credit_used_usd: application.credit_used_usd,
            surplus_usd: application.surplus_usd,
            invoice,
        })
    }

    fn insert_payment(&self, payment: &Payment) -> DbResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO payments ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                PAYMENT_COLUMNS
            ),
            params![
                payment.id,
                payment.invoice_id,
                payment.amount,
                payment.currency.as_str(),
                payment.exchange_rate,
                payment.amount_usd,
                payment.method.as_str(),
                payment.reference,
                payment.status.as_str(),
                payment.created_at,
                payment.cancelled_at,
                payment.cancel_reason,
                payment.surplus_usd,
            ],
        )?;
        Ok(())
    }

    /// Get a payment by ID.
    pub fn get_payment(&self, id: &str) -> DbResult<Option<Payment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS),
                [id],
                payment_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All payments of an invoice, cancelled ones included, oldest first.
    pub fn list_payments_for_invoice(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        self.query_payments(
            &format!(
                "SELECT {} FROM payments WHERE invoice_id = ? ORDER BY created_at, rowid",
                PAYMENT_COLUMNS
            ),
            params![invoice_id],
        )
    }

    /// Payments made on days within `[from, to]` (YYYY-MM-DD, inclusive).
    pub fn list_payments_between(&self, from: &str, to: &str) -> DbResult<Vec<Payment>> {
        self.query_payments(
            &format!(
                "SELECT {} FROM payments
                 WHERE substr(created_at, 1, 10) >= ?1 AND substr(created_at, 1, 10) <= ?2
                 ORDER BY created_at, rowid",
                PAYMENT_COLUMNS
            ),
            params![from, to],
        )
    }

    fn query_payments(&self, sql: &str, args: impl rusqlite::Params) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, payment_row)?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }

    /// Cancel a payment and rebuild its invoice from the remaining active payments.
    ///
    /// A cancelled credit payment returns its amount to the owner's balance.
    /// Overpayment credited by the payment is taken back; if the owner has
    /// already spent it the cancellation is refused.
    pub fn cancel_payment(&self, payment_id: &str, reason: Option<&str>) -> DbResult<Invoice> {
        let tx = self.conn.unchecked_transaction()?;

        let payment = self
            .get_payment(payment_id)?
            .ok_or_else(|| DbError::NotFound(format!("payment {}", payment_id)))?;
        if !payment.is_active() {
            return Err(BillingError::PaymentAlreadyCancelled(payment_id.to_string()).into());
        }

        let mut invoice = self.require_invoice(&payment.invoice_id)?;
        if payment.surplus_usd > 0.0 {
            let owner = self
                .get_owner(&invoice.owner_id)?
                .ok_or_else(|| DbError::NotFound(format!("owner {}", invoice.owner_id)))?;
            if owner.credit_balance < payment.surplus_usd {
                return Err(BillingError::SurplusAlreadySpent {
                    payment_id: payment_id.to_string(),
                    surplus: payment.surplus_usd,
                    available: owner.credit_balance,
                }
                .into());
            }
            self.adjust_owner_credit(&invoice.owner_id, -payment.surplus_usd)?;
        }

        self.conn.execute(
            r#"
            UPDATE payments SET
                status = ?2,
                cancelled_at = ?3,
                cancel_reason = ?4
            WHERE id = ?1
            "#,
            params![
                payment_id,
                PaymentState::Cancelled.as_str(),
                chrono::Utc::now().to_rfc3339(),
                reason,
            ],
        )?;

        if payment.method == PaymentMethod::Credit {
            self.adjust_owner_credit(&invoice.owner_id, payment.amount_usd)?;
        }

        let payments = self.list_payments_for_invoice(&invoice.id)?;
        recompute_from_payments(&mut invoice, &payments);
        self.update_invoice_payment_state(&invoice)?;
        tx.commit()?;

        info!(
            payment_id = %payment_id,
            invoice_id = %invoice.id,
            reason = reason.unwrap_or(""),
            surplus_reversed_usd = payment.surplus_usd,
            status = invoice.payment_status.as_str(),
            "payment cancelled"
        );
        Ok(invoice)
    }

    /// Pay the full pending amount of each listed invoice, in order.
    pub fn pay_all(&self, invoice_ids: &[String], template: &BatchPayment) -> BatchOutcome {
        crate::billing::pay_all(self, invoice_ids, template)
    }

    /// Pay every open invoice of an owner, oldest first.
    pub fn pay_all_for_owner(&self, owner_id: &str, template: &BatchPayment) -> DbResult<BatchOutcome> {
        let ids: Vec<String> = self
            .list_open_invoices_for_owner(owner_id)?
            .into_iter()
            .map(|invoice| invoice.id)
            .collect();
        Ok(self.pay_all(&ids, template))
    }
}

impl PaymentRecorder for Database {
    type Error = DbError;

    fn load_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, DbError> {
        self.get_invoice(invoice_id)
    }

    fn record_payment(&self, invoice_id: &str, input: &PaymentInput) -> Result<Payment, DbError> {
        self.pay_invoice(invoice_id, input)?
            .payments
            .pop()
            .ok_or(DbError::Billing(BillingError::NothingToApply))
    }
}

fn new_payment(
    invoice_id: &str,
    amount: f64,
    currency: Currency,
    exchange_rate: f64,
    amount_usd: f64,
    method: PaymentMethod,
    reference: Option<String>,
) -> Payment {
    Payment {
        id: uuid::Uuid::new_v4().to_string(),
        invoice_id: invoice_id.to_string(),
        amount,
        currency,
        exchange_rate,
        amount_usd,
        method,
        reference,
        status: PaymentState::Active,
        created_at: chrono::Utc::now().to_rfc3339(),
        cancelled_at: None,
        cancel_reason: None,
        surplus_usd: 0.0,
    }
}

fn payment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaymentRow> {
    Ok(PaymentRow {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        exchange_rate: row.get(4)?,
        amount_usd: row.get(5)?,
        method: row.get(6)?,
        reference: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        cancelled_at: row.get(10)?,
        cancel_reason: row.get(11)?,
        surplus_usd: row.get(12)?,
    })
}

/// Intermediate row struct for database mapping.
struct PaymentRow {
    id: String,
    invoice_id: String,
    amount: f64,
    currency: String,
    exchange_rate: f64,
    amount_usd: f64,
    method: String,
    reference: Option<String>,
    status: String,
    created_at: String,
    cancelled_at: Option<String>,
    cancel_reason: Option<String>,
    surplus_usd: f64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            currency: parse_currency(&row.currency)?,
            exchange_rate: row.exchange_rate,
            amount_usd: row.amount_usd,
            method: PaymentMethod::from_string(&row.method),
            reference: row.reference,
            status: PaymentState::from_string(&row.status),
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
            cancel_reason: row.cancel_reason,
            surplus_usd: row.surplus_usd,
        })
    }
}
