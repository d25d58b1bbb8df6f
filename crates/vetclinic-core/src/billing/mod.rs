//! Invoice payment reconciliation and batch payments.

mod batch;
mod reconcile;

pub use batch::*;
pub use reconcile::*;

use thiserror::Error;

use crate::money::MoneyError;

/// Billing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("Invoice {0} is cancelled")]
    InvoiceCancelled(String),

    #[error("Invoice {0} is already fully paid")]
    InvoiceSettled(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("Invalid credit offset: {0}")]
    InvalidCredit(String),

    #[error("Insufficient credit: available {available:.2}, requested {requested:.2}")]
    InsufficientCredit { available: f64, requested: f64 },

    #[error("Payment has no amount and no credit to apply")]
    NothingToApply,

    #[error("Payment {0} is already cancelled")]
    PaymentAlreadyCancelled(String),

    #[error("Payment {payment_id} credited {surplus:.2} USD of overpayment but the owner only holds {available:.2}")]
    SurplusAlreadySpent {
        payment_id: String,
        surplus: f64,
        available: f64,
    },
}

pub type BillingResult<T> = Result<T, BillingError>;
