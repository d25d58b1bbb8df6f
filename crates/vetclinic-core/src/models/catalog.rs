//! Product and service catalog models.

use serde::{Deserialize, Serialize};

use crate::money::Currency;

/// Whether a catalog entry is a stocked product or a billable service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Product,
    Service,
}

impl CatalogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Service => "service",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "service" => CatalogKind::Service,
            _ => CatalogKind::Product,
        }
    }
}

/// A single product or service the clinic sells.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub kind: CatalogKind,
    pub name: String,
    pub description: Option<String>,
    /// Sale price in `currency`
    pub price: f64,
    pub currency: Currency,
    /// Units on hand (products only)
    pub stock: Option<f64>,
    /// Whether this item is currently offered
    pub active: bool,
}

impl CatalogItem {
    pub fn product(name: String, price: f64, currency: Currency) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: CatalogKind::Product,
            name,
            description: None,
            price,
            currency,
            stock: Some(0.0),
            active: true,
        }
    }

    pub fn service(name: String, price: f64, currency: Currency) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: CatalogKind::Service,
            name,
            description: None,
            price,
            currency,
            stock: None,
            active: true,
        }
    }

    /// Check if `quantity` units can be sold from stock.
    pub fn has_stock_for(&self, quantity: f64) -> bool {
        match self.kind {
            CatalogKind::Service => true,
            CatalogKind::Product => self.stock.unwrap_or(0.0) >= quantity,
        }
    }

    /// Turn this entry into an invoice line.
    pub fn to_invoice_item(&self, quantity: f64) -> super::InvoiceItem {
        super::InvoiceItem {
            description: self.name.clone(),
            quantity,
            unit_cost: self.price,
            resource_type: match self.kind {
                CatalogKind::Product => super::ResourceType::Product,
                CatalogKind::Service => super::ResourceType::Service,
            },
            resource_id: Some(self.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_always_in_stock() {
        let item = CatalogItem::service("Consulta".into(), 20.0, Currency::Usd);
        assert!(item.has_stock_for(100.0));
    }

    #[test]
    fn test_product_stock() {
        let mut item = CatalogItem::product("Desparasitante".into(), 8.0, Currency::Usd);
        assert!(!item.has_stock_for(1.0));
        item.stock = Some(3.0);
        assert!(item.has_stock_for(3.0));
        assert!(!item.has_stock_for(4.0));
    }

    #[test]
    fn test_to_invoice_item() {
        let item = CatalogItem::product("Collar".into(), 5.0, Currency::Usd);
        let line = item.to_invoice_item(2.0);
        assert_eq!(line.subtotal(), 10.0);
        assert_eq!(line.resource_type, crate::models::ResourceType::Product);
        assert_eq!(line.resource_id.as_deref(), Some(item.id.as_str()));
    }
}
