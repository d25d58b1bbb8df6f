//! Supplier purchase operations.

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{parse_currency, Database, DbError, DbResult};
use crate::models::{CatalogKind, Purchase};

impl Database {
    /// Record a purchase and add its quantities to product stock.
    ///
    /// Runs in one transaction: an unknown product rejects the whole purchase.
    pub fn record_purchase(&self, purchase: &Purchase) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        for item in &purchase.items {
            let product = self
                .get_catalog_item(&item.product_id)?
                .ok_or_else(|| DbError::NotFound(format!("catalog item {}", item.product_id)))?;
            if product.kind != CatalogKind::Product {
                return Err(DbError::Constraint(format!(
                    "{} is a service and cannot be purchased",
                    product.name
                )));
            }
            self.adjust_stock(&item.product_id, item.quantity)?;
        }

        let items_json = serde_json::to_string(&purchase.items)?;
        self.conn.execute(
            r#"
            INSERT INTO purchases (
                id, supplier, date, items, total, currency, exchange_rate, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                purchase.id,
                purchase.supplier,
                purchase.date,
                items_json,
                purchase.total,
                purchase.currency.as_str(),
                purchase.exchange_rate,
                purchase.notes,
                purchase.created_at,
            ],
        )?;

        tx.commit()?;
        info!(purchase_id = %purchase.id, supplier = %purchase.supplier, total = purchase.total, "purchase recorded");
        Ok(())
    }

    /// Get a purchase by ID.
    pub fn get_purchase(&self, id: &str) -> DbResult<Option<Purchase>> {
        self.conn
            .query_row(
                r#"
                SELECT id, supplier, date, items, total, currency, exchange_rate, notes, created_at
                FROM purchases WHERE id = ?
                "#,
                [id],
                purchase_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Purchases dated within `[from, to]`, oldest first.
    pub fn list_purchases_between(&self, from: &str, to: &str) -> DbResult<Vec<Purchase>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, supplier, date, items, total, currency, exchange_rate, notes, created_at
            FROM purchases
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date
            "#,
        )?;
        let rows = stmt.query_map(params![from, to], purchase_row)?;

        let mut purchases = Vec::new();
        for row in rows {
            purchases.push(row?.try_into()?);
        }
        Ok(purchases)
    }
}

fn purchase_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PurchaseRow> {
    Ok(PurchaseRow {
        id: row.get(0)?,
        supplier: row.get(1)?,
        date: row.get(2)?,
        items: row.get(3)?,
        total: row.get(4)?,
        currency: row.get(5)?,
        exchange_rate: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Intermediate row struct for database mapping.
struct PurchaseRow {
    id: String,
    supplier: String,
    date: String,
    items: String,
    total: f64,
    currency: String,
    exchange_rate: f64,
    notes: Option<String>,
    created_at: String,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DbError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Purchase {
            id: row.id,
            supplier: row.supplier,
            date: row.date,
            items: serde_json::from_str(&row.items)?,
            total: row.total,
            currency: parse_currency(&row.currency)?,
            exchange_rate: row.exchange_rate,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogItem, PurchaseItem};
    use crate::money::Currency;

    #[test]
    fn test_purchase_adds_stock() {
        let db = Database::open_in_memory().unwrap();
        let product = CatalogItem::product("Vacuna rabia".into(), 10.0, Currency::Usd);
        db.upsert_catalog_item(&product).unwrap();

        let purchase = Purchase::new(
            "Lab Biológico".into(),
            "2024-02-10".into(),
            Currency::Usd,
            36.0,
            vec![PurchaseItem { product_id: product.id.clone(), quantity: 20.0, unit_cost: 4.0 }],
        );
        db.record_purchase(&purchase).unwrap();

        let stored = db.get_catalog_item(&product.id).unwrap().unwrap();
        assert_eq!(stored.stock, Some(20.0));
        assert_eq!(db.get_purchase(&purchase.id).unwrap().unwrap(), purchase);
        assert_eq!(db.list_purchases_between("2024-02-01", "2024-02-29").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_product_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let product = CatalogItem::product("Gasas".into(), 1.0, Currency::Usd);
        db.upsert_catalog_item(&product).unwrap();

        let purchase = Purchase::new(
            "Proveedor".into(),
            "2024-02-10".into(),
            Currency::Usd,
            1.0,
            vec![
                PurchaseItem { product_id: product.id.clone(), quantity: 5.0, unit_cost: 1.0 },
                PurchaseItem { product_id: "missing".into(), quantity: 1.0, unit_cost: 1.0 },
            ],
        );
        assert!(matches!(db.record_purchase(&purchase), Err(DbError::NotFound(_))));

        let stored = db.get_catalog_item(&product.id).unwrap().unwrap();
        assert_eq!(stored.stock, Some(0.0));
        assert!(db.get_purchase(&purchase.id).unwrap().is_none());
    }
}
