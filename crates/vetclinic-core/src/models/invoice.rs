//! Invoice models.

use serde::{Deserialize, Serialize};

use crate::money::{self, Currency};

/// Invoice payment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    /// Nothing paid yet
    Pendiente,
    /// Partially paid
    Parcial,
    /// Fully covered
    Pagado,
    /// Explicitly cancelled; frozen
    Cancelado,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pendiente => "Pendiente",
            InvoiceStatus::Parcial => "Parcial",
            InvoiceStatus::Pagado => "Pagado",
            InvoiceStatus::Cancelado => "Cancelado",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "Parcial" => InvoiceStatus::Parcial,
            "Pagado" => InvoiceStatus::Pagado,
            "Cancelado" => InvoiceStatus::Cancelado,
            _ => InvoiceStatus::Pendiente,
        }
    }

    /// Whether the invoice can still receive payments.
    pub fn is_open(&self) -> bool {
        matches!(self, InvoiceStatus::Pendiente | InvoiceStatus::Parcial)
    }
}

/// What an invoice line bills for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Service,
    Product,
    Grooming,
    LabExam,
    Consultation,
    Other,
}

/// A single invoice line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: f64,
    /// Unit cost in the invoice currency
    pub unit_cost: f64,
    pub resource_type: ResourceType,
    /// ID of the billed record (catalog item, grooming service, ...)
    pub resource_id: Option<String>,
}

impl InvoiceItem {
    pub fn new(description: String, quantity: f64, unit_cost: f64) -> Self {
        Self {
            description,
            quantity,
            unit_cost,
            resource_type: ResourceType::Other,
            resource_id: None,
        }
    }

    /// Line subtotal (quantity × unit cost).
    pub fn subtotal(&self) -> f64 {
        money::to_f64(money::to_decimal(self.quantity) * money::to_decimal(self.unit_cost))
    }
}

/// A billing record for services/products rendered to an owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub owner_id: String,
    pub patient_id: Option<String>,
    /// Human-facing invoice number
    pub number: String,
    /// Issue date (YYYY-MM-DD)
    pub issued_at: String,
    /// Total in `currency`
    pub total: f64,
    pub currency: Currency,
    /// Bs per USD, recorded when the invoice was issued
    pub exchange_rate: f64,
    /// USD equivalent of all active payments
    pub amount_paid: f64,
    /// Sum of active USD payments
    pub amount_paid_usd: f64,
    /// Sum of active Bs payments
    pub amount_paid_bs: f64,
    pub payment_status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Invoice {
    /// Create an invoice whose total is the sum of its items.
    ///
    /// Nothing is paid yet, so a zero total starts out as `Pagado`.
    pub fn from_items(
        owner_id: String,
        number: String,
        currency: Currency,
        exchange_rate: f64,
        items: Vec<InvoiceItem>,
    ) -> Self {
        let now = chrono::Utc::now();
        let total = items
            .iter()
            .map(|item| money::to_decimal(item.subtotal()))
            .sum();
        let mut invoice = Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id,
            patient_id: None,
            number,
            issued_at: now.format("%Y-%m-%d").to_string(),
            total: money::to_f64(total),
            currency,
            exchange_rate: money::normalize_rate(Some(exchange_rate)),
            amount_paid: 0.0,
            amount_paid_usd: 0.0,
            amount_paid_bs: 0.0,
            payment_status: InvoiceStatus::Pendiente,
            items,
            notes: None,
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };
        invoice.payment_status = crate::billing::derive_status(&invoice);
        invoice
    }

    /// Exchange rate with the missing/zero guard applied.
    pub fn rate(&self) -> f64 {
        money::normalize_rate(Some(self.exchange_rate))
    }

    /// Invoice total expressed in USD.
    pub fn total_usd(&self) -> f64 {
        money::to_usd(self.total, self.currency, self.rate())
    }

    /// Invoice total expressed in Bs.
    pub fn total_bs(&self) -> f64 {
        money::from_usd(self.total_usd(), Currency::Bs, self.rate())
    }

    pub fn is_cancelled(&self) -> bool {
        self.payment_status == InvoiceStatus::Cancelado
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<InvoiceItem> {
        vec![
            InvoiceItem::new("Consulta general".into(), 1.0, 25.0),
            InvoiceItem::new("Vacuna séxtuple".into(), 2.0, 12.5),
        ]
    }

    #[test]
    fn test_from_items_sums_total() {
        let invoice = Invoice::from_items("owner-1".into(), "F-0001".into(), Currency::Usd, 40.0, items());
        assert_eq!(invoice.total, 50.0);
        assert_eq!(invoice.payment_status, InvoiceStatus::Pendiente);
        assert_eq!(invoice.amount_paid, 0.0);
    }

    #[test]
    fn test_zero_total_starts_paid() {
        let invoice = Invoice::from_items(
            "owner-1".into(),
            "F-0004".into(),
            Currency::Usd,
            40.0,
            vec![InvoiceItem::new("Control post-operatorio".into(), 1.0, 0.0)],
        );
        assert_eq!(invoice.total, 0.0);
        assert_eq!(invoice.payment_status, InvoiceStatus::Pagado);
    }

    #[test]
    fn test_bs_invoice_total_usd() {
        let invoice = Invoice::from_items("owner-1".into(), "F-0002".into(), Currency::Bs, 40.0, items());
        assert_eq!(invoice.total, 50.0);
        assert_eq!(invoice.total_usd(), 1.25);
        assert_eq!(invoice.total_bs(), 50.0);
    }

    #[test]
    fn test_zero_rate_treated_as_one() {
        let mut invoice = Invoice::from_items("owner-1".into(), "F-0003".into(), Currency::Bs, 0.0, items());
        assert_eq!(invoice.exchange_rate, 1.0);
        invoice.exchange_rate = 0.0;
        assert_eq!(invoice.rate(), 1.0);
        assert_eq!(invoice.total_usd(), 50.0);
    }

    #[test]
    fn test_status_labels_roundtrip() {
        for status in [
            InvoiceStatus::Pendiente,
            InvoiceStatus::Parcial,
            InvoiceStatus::Pagado,
            InvoiceStatus::Cancelado,
        ] {
            assert_eq!(InvoiceStatus::from_string(status.as_str()), status);
        }
        assert!(InvoiceStatus::Parcial.is_open());
        assert!(!InvoiceStatus::Cancelado.is_open());
    }

    #[test]
    fn test_item_subtotal() {
        let item = InvoiceItem::new("Shampoo".into(), 3.0, 4.1);
        assert_eq!(item.subtotal(), 12.3);
    }
}
