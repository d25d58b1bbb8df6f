//! Supplier purchase models.

use serde::{Deserialize, Serialize};

use crate::money::{self, Currency};

/// One purchased product line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseItem {
    pub product_id: String,
    pub quantity: f64,
    pub unit_cost: f64,
}

/// A purchase from a supplier. Recording one adds stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub id: String,
    pub supplier: String,
    /// Purchase date (YYYY-MM-DD)
    pub date: String,
    pub items: Vec<PurchaseItem>,
    pub total: f64,
    pub currency: Currency,
    pub exchange_rate: f64,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Purchase {
    pub fn new(
        supplier: String,
        date: String,
        currency: Currency,
        exchange_rate: f64,
        items: Vec<PurchaseItem>,
    ) -> Self {
        let total = items
            .iter()
            .map(|i| money::to_decimal(i.quantity) * money::to_decimal(i.unit_cost))
            .sum();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            supplier,
            date,
            items,
            total: money::to_f64(total),
            currency,
            exchange_rate: money::normalize_rate(Some(exchange_rate)),
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn total_usd(&self) -> f64 {
        money::to_usd(self.total, self.currency, self.exchange_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_total() {
        let purchase = Purchase::new(
            "Distribuidora Animal".into(),
            "2024-02-01".into(),
            Currency::Bs,
            36.0,
            vec![
                PurchaseItem { product_id: "p1".into(), quantity: 10.0, unit_cost: 36.0 },
                PurchaseItem { product_id: "p2".into(), quantity: 2.0, unit_cost: 18.0 },
            ],
        );
        assert_eq!(purchase.total, 396.0);
        assert_eq!(purchase.total_usd(), 11.0);
    }
}
