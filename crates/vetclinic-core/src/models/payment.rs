//! Payment models.

use serde::{Deserialize, Serialize};

use crate::money::Currency;

/// How a payment was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    MobilePayment,
    Card,
    /// Paid from the owner's credit balance
    Credit,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::MobilePayment => "mobile_payment",
            PaymentMethod::Card => "card",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Other => "other",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "cash" => PaymentMethod::Cash,
            "transfer" => PaymentMethod::Transfer,
            "mobile_payment" => PaymentMethod::MobilePayment,
            "card" => PaymentMethod::Card,
            "credit" => PaymentMethod::Credit,
            _ => PaymentMethod::Other,
        }
    }
}

/// Payment lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Active,
    Cancelled,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Active => "active",
            PaymentState::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "cancelled" => PaymentState::Cancelled,
            _ => PaymentState::Active,
        }
    }
}

/// A monetary transaction applied against one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// Amount in `currency`
    pub amount: f64,
    pub currency: Currency,
    /// Bs per USD used to convert this payment
    pub exchange_rate: f64,
    /// USD equivalent at `exchange_rate`
    pub amount_usd: f64,
    pub method: PaymentMethod,
    /// Bank/transfer reference
    pub reference: Option<String>,
    pub status: PaymentState,
    pub created_at: String,
    pub cancelled_at: Option<String>,
    pub cancel_reason: Option<String>,
    /// Overpayment this payment credited to the owner, in USD
    #[serde(default)]
    pub surplus_usd: f64,
}

impl Payment {
    pub fn is_active(&self) -> bool {
        self.status == PaymentState::Active
    }
}

/// A proposed payment against one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInput {
    /// Amount in `currency`; may be zero when only credit is applied
    pub amount: f64,
    pub currency: Currency,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    /// Owner credit to apply first, in USD
    pub credit_offset_usd: Option<f64>,
}

impl PaymentInput {
    pub fn new(amount: f64, currency: Currency, method: PaymentMethod) -> Self {
        Self {
            amount,
            currency,
            method,
            reference: None,
            credit_offset_usd: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_credit(mut self, credit_usd: f64) -> Self {
        self.credit_offset_usd = Some(credit_usd);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_labels() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Transfer,
            PaymentMethod::MobilePayment,
            PaymentMethod::Card,
            PaymentMethod::Credit,
            PaymentMethod::Other,
        ] {
            assert_eq!(PaymentMethod::from_string(method.as_str()), method);
        }
    }

    #[test]
    fn test_input_builder() {
        let input = PaymentInput::new(10.0, Currency::Usd, PaymentMethod::Transfer)
            .with_reference("REF-123")
            .with_credit(2.5);
        assert_eq!(input.reference.as_deref(), Some("REF-123"));
        assert_eq!(input.credit_offset_usd, Some(2.5));
    }
}
