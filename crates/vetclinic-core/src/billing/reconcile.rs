//! Paid/pending arithmetic for multi-currency invoices.
//!
//! All amounts are compared in USD. Bs amounts are converted with the
//! invoice's stored exchange rate, so a later rate change never alters
//! what an invoice already considers paid.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BillingError, BillingResult};
use crate::models::{Invoice, InvoiceStatus, Payment, PaymentInput};
use crate::money::{self, Currency, PAYMENT_EPSILON};

/// USD equivalent of everything paid so far.
pub fn paid_usd(invoice: &Invoice) -> f64 {
    money::to_f64(paid_usd_decimal(
        invoice.amount_paid_usd,
        invoice.amount_paid_bs,
        invoice.rate(),
    ))
}

fn paid_usd_decimal(paid_usd: f64, paid_bs: f64, rate: f64) -> Decimal {
    money::to_decimal(paid_usd) + money::to_usd_decimal(paid_bs, Currency::Bs, rate)
}

/// Amount still owed in USD, never negative.
pub fn pending_amount(invoice: &Invoice) -> f64 {
    pending_for(invoice.total_usd(), paid_usd(invoice))
}

fn pending_for(total_usd: f64, paid_usd: f64) -> f64 {
    let pending = money::to_decimal(total_usd) - money::to_decimal(paid_usd);
    money::to_f64(pending.max(Decimal::ZERO))
}

/// Status implied by the invoice's paid sums.
///
/// `Cancelado` is sticky: only explicit cancellation sets it and nothing
/// derives it away.
pub fn derive_status(invoice: &Invoice) -> InvoiceStatus {
    if invoice.is_cancelled() {
        return InvoiceStatus::Cancelado;
    }
    status_for(invoice.total_usd(), paid_usd(invoice))
}

fn status_for(total_usd: f64, paid_usd: f64) -> InvoiceStatus {
    if pending_for(total_usd, paid_usd) <= PAYMENT_EPSILON {
        InvoiceStatus::Pagado
    } else if paid_usd > PAYMENT_EPSILON {
        InvoiceStatus::Parcial
    } else {
        InvoiceStatus::Pendiente
    }
}

/// Display-ready view of an invoice's payment state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentSummary {
    pub total_usd: f64,
    pub total_bs: f64,
    pub paid_usd: f64,
    pub pending_usd: f64,
    pub pending_bs: f64,
    pub status: InvoiceStatus,
}

impl PaymentSummary {
    pub fn of(invoice: &Invoice) -> Self {
        let pending_usd = pending_amount(invoice);
        Self {
            total_usd: invoice.total_usd(),
            total_bs: invoice.total_bs(),
            paid_usd: paid_usd(invoice),
            pending_usd,
            pending_bs: money::from_usd(pending_usd, Currency::Bs, invoice.rate()),
            status: derive_status(invoice),
        }
    }
}

/// Result of applying a payment to an invoice, before it is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentApplication {
    /// Owner credit consumed, in USD
    pub credit_used_usd: f64,
    /// Portion of the entered amount that went to the invoice, in its currency
    pub applied_amount: f64,
    pub applied_currency: Currency,
    /// USD equivalent of `applied_amount`
    pub applied_usd: f64,
    /// Amount beyond what was owed, in USD; belongs to the owner
    pub surplus_usd: f64,
    /// Rate used for conversion
    pub exchange_rate: f64,
    pub amount_paid_usd: f64,
    pub amount_paid_bs: f64,
    pub amount_paid: f64,
    pub pending_usd: f64,
    pub status: InvoiceStatus,
}

impl PaymentApplication {
    /// Write the new running sums and status into `invoice`.
    pub fn apply_to(&self, invoice: &mut Invoice) {
        invoice.amount_paid_usd = self.amount_paid_usd;
        invoice.amount_paid_bs = self.amount_paid_bs;
        invoice.amount_paid = self.amount_paid;
        invoice.payment_status = self.status;
        invoice.touch();
    }
}

/// Compute the effect of `input` on `invoice`.
///
/// Credit is applied before the entered amount. Anything beyond the pending
/// amount (more than epsilon) is reported as surplus rather than counted as
/// paid, so paid never exceeds the total beyond rounding slack.
pub fn apply_payment(invoice: &Invoice, input: &PaymentInput) -> BillingResult<PaymentApplication> {
    if invoice.is_cancelled() {
        return Err(BillingError::InvoiceCancelled(invoice.id.clone()));
    }

    let pending = pending_amount(invoice);
    if pending <= PAYMENT_EPSILON {
        return Err(BillingError::InvoiceSettled(invoice.id.clone()));
    }

    let credit = input.credit_offset_usd.unwrap_or(0.0);
    if !credit.is_finite() || credit < 0.0 {
        return Err(BillingError::InvalidCredit(format!(
            "credit offset must be a non-negative number, got {}",
            credit
        )));
    }

    if input.amount == 0.0 {
        if credit == 0.0 {
            return Err(BillingError::NothingToApply);
        }
    } else {
        money::validate_amount(input.amount, "payment amount")?;
    }

    let rate = invoice.rate();
    let pending_dec = money::to_decimal(pending);

    let credit_used = money::to_decimal(credit).min(pending_dec);
    let remaining = pending_dec - credit_used;

    let entered_usd = money::to_usd_decimal(input.amount, input.currency, rate);
    let (applied_amount, applied_usd, surplus) = if entered_usd - remaining > money::to_decimal(PAYMENT_EPSILON) {
        let applied_amount = match input.currency {
            Currency::Usd => remaining,
            Currency::Bs => remaining * money::to_decimal(rate),
        };
        (applied_amount, remaining, entered_usd - remaining)
    } else {
        (money::to_decimal(input.amount), entered_usd, Decimal::ZERO)
    };

    let mut new_paid_usd = money::to_decimal(invoice.amount_paid_usd) + credit_used;
    let mut new_paid_bs = money::to_decimal(invoice.amount_paid_bs);
    match input.currency {
        Currency::Usd => new_paid_usd += applied_amount,
        Currency::Bs => new_paid_bs += applied_amount,
    }

    let amount_paid_usd = money::to_f64(new_paid_usd);
    let amount_paid_bs = money::to_f64(new_paid_bs);
    let amount_paid = money::to_f64(paid_usd_decimal(amount_paid_usd, amount_paid_bs, rate));
    let total_usd = invoice.total_usd();

    Ok(PaymentApplication {
        credit_used_usd: money::to_f64(credit_used),
        applied_amount: money::to_f64(applied_amount),
        applied_currency: input.currency,
        applied_usd: money::to_f64(applied_usd),
        surplus_usd: money::to_f64(surplus),
        exchange_rate: rate,
        amount_paid_usd,
        amount_paid_bs,
        amount_paid,
        pending_usd: pending_for(total_usd, amount_paid),
        status: status_for(total_usd, amount_paid),
    })
}

/// Rebuild the running sums from the invoice's active payments.
///
/// Used after a payment is cancelled. A cancelled invoice keeps its status.
pub fn recompute_from_payments(invoice: &mut Invoice, payments: &[Payment]) {
    let mut usd = Decimal::ZERO;
    let mut bs = Decimal::ZERO;
    for payment in payments
        .iter()
        .filter(|p| p.invoice_id == invoice.id && p.is_active())
    {
        match payment.currency {
            Currency::Usd => usd += money::to_decimal(payment.amount),
            Currency::Bs => bs += money::to_decimal(payment.amount),
        }
    }

    invoice.amount_paid_usd = money::to_f64(usd);
    invoice.amount_paid_bs = money::to_f64(bs);
    invoice.amount_paid = paid_usd(invoice);
    invoice.payment_status = derive_status(invoice);
    invoice.touch();
}
