//! Catalog (products and services) database operations.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{parse_currency, Database, DbError, DbResult};
use crate::models::{CatalogItem, CatalogKind};

/// Minimum Jaro-Winkler similarity for a fuzzy catalog hit.
const FUZZY_THRESHOLD: f64 = 0.8;

/// A catalog search hit with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMatch {
    pub item: CatalogItem,
    pub score: f64,
}

impl Database {
    /// Insert or update a catalog item.
    pub fn upsert_catalog_item(&self, item: &CatalogItem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO catalog_items (
                id, kind, name, description, price, currency, stock, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            ON CONFLICT(id) DO UPDATE SET
                kind = excluded.kind,
                name = excluded.name,
                description = excluded.description,
                price = excluded.price,
                currency = excluded.currency,
                stock = excluded.stock,
                active = excluded.active,
                updated_at = excluded.updated_at
            "#,
            params![
                item.id,
                item.kind.as_str(),
                item.name,
                item.description,
                item.price,
                item.currency.as_str(),
                item.stock,
                item.active,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a catalog item by ID.
    pub fn get_catalog_item(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT id, kind, name, description, price, currency, stock, active
                FROM catalog_items
                WHERE id = ?
                "#,
                [id],
                catalog_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// List catalog items, optionally only active ones and only one kind.
    pub fn list_catalog_items(
        &self,
        active_only: bool,
        kind: Option<CatalogKind>,
    ) -> DbResult<Vec<CatalogItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, name, description, price, currency, stock, active
            FROM catalog_items
            WHERE (?1 = 0 OR active = 1)
              AND (?2 IS NULL OR kind = ?2)
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map(params![active_only, kind.map(|k| k.as_str())], catalog_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }
        Ok(items)
    }

    /// Fuzzy search over active items, best match first.
    ///
    /// Substring hits always match; other names need a Jaro-Winkler
    /// similarity of at least [`FUZZY_THRESHOLD`] against the query or one
    /// of the name's words.
    pub fn search_catalog(&self, query: &str, limit: usize) -> DbResult<Vec<CatalogMatch>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<CatalogMatch> = self
            .list_catalog_items(true, None)?
            .into_iter()
            .filter_map(|item| {
                let score = similarity(&needle, &item.name.to_lowercase());
                (score >= FUZZY_THRESHOLD).then_some(CatalogMatch { item, score })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    /// Mark item as inactive (soft delete).
    pub fn deactivate_catalog_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE catalog_items SET active = 0, updated_at = ?2 WHERE id = ?1",
            params![id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a catalog item.
    pub fn delete_catalog_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM catalog_items WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Change a product's stock by `delta`. Services are rejected.
    pub fn adjust_stock(&self, product_id: &str, delta: f64) -> DbResult<f64> {
        let item = self
            .get_catalog_item(product_id)?
            .ok_or_else(|| DbError::NotFound(format!("catalog item {}", product_id)))?;
        if item.kind != CatalogKind::Product {
            return Err(DbError::Constraint(format!(
                "{} is a service and has no stock",
                item.name
            )));
        }

        let stock = crate::money::to_f64(
            crate::money::to_decimal(item.stock.unwrap_or(0.0)) + crate::money::to_decimal(delta),
        );
        self.conn.execute(
            "UPDATE catalog_items SET stock = ?2, updated_at = ?3 WHERE id = ?1",
            params![product_id, stock, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(stock)
    }
}

fn similarity(needle: &str, name: &str) -> f64 {
    if name.contains(needle) {
        return 1.0;
    }
    name.split_whitespace()
        .map(|word| strsim::jaro_winkler(needle, word))
        .fold(strsim::jaro_winkler(needle, name), f64::max)
}

fn catalog_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogItemRow> {
    Ok(CatalogItemRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        currency: row.get(5)?,
        stock: row.get(6)?,
        active: row.get(7)?,
    })
}

/// Intermediate row struct for database mapping.
struct CatalogItemRow {
    id: String,
    kind: String,
    name: String,
    description: Option<String>,
    price: f64,
    currency: String,
    stock: Option<f64>,
    active: bool,
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = DbError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: row.id,
            kind: CatalogKind::from_string(&row.kind),
            name: row.name,
            description: row.description,
            price: row.price,
            currency: parse_currency(&row.currency)?,
            stock: row.stock,
            active: row.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();

        let mut wormer = CatalogItem::product("Desparasitante Drontal".into(), 8.0, Currency::Usd);
        wormer.stock = Some(10.0);
        db.upsert_catalog_item(&wormer).unwrap();

        db.upsert_catalog_item(&CatalogItem::product("Shampoo medicado".into(), 12.0, Currency::Usd))
            .unwrap();
        db.upsert_catalog_item(&CatalogItem::service("Consulta general".into(), 20.0, Currency::Usd))
            .unwrap();
        db.upsert_catalog_item(&CatalogItem::service("Baño y corte".into(), 600.0, Currency::Bs))
            .unwrap();
        db
    }

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let mut item = CatalogItem::product("Collar".into(), 5.0, Currency::Usd);
        db.upsert_catalog_item(&item).unwrap();

        item.price = 6.0;
        db.upsert_catalog_item(&item).unwrap();

        let retrieved = db.get_catalog_item(&item.id).unwrap().unwrap();
        assert_eq!(retrieved, item);
    }

    #[test]
    fn test_list_by_kind() {
        let db = setup_db();
        assert_eq!(db.list_catalog_items(true, None).unwrap().len(), 4);
        assert_eq!(
            db.list_catalog_items(true, Some(CatalogKind::Service)).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_search_substring_and_typo() {
        let db = setup_db();

        let results = db.search_catalog("shampoo", 10).unwrap();
        assert_eq!(results[0].item.name, "Shampoo medicado");

        // Misspelled
        let results = db.search_catalog("desparasitnte", 10).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].item.name, "Desparasitante Drontal");

        assert!(db.search_catalog("", 10).unwrap().is_empty());
    }

    #[test]
    fn test_deactivated_items_not_searched() {
        let db = setup_db();
        let item = db.search_catalog("consulta", 1).unwrap().remove(0).item;
        assert!(db.deactivate_catalog_item(&item.id).unwrap());
        assert!(db.search_catalog("consulta", 10).unwrap().is_empty());
    }

    #[test]
    fn test_adjust_stock() {
        let db = setup_db();
        let wormer = db.search_catalog("drontal", 1).unwrap().remove(0).item;
        assert_eq!(db.adjust_stock(&wormer.id, 5.0).unwrap(), 15.0);
        assert_eq!(db.adjust_stock(&wormer.id, -3.0).unwrap(), 12.0);

        let service = db.search_catalog("consulta", 1).unwrap().remove(0).item;
        assert!(matches!(
            db.adjust_stock(&service.id, 1.0),
            Err(DbError::Constraint(_))
        ));
    }
}
