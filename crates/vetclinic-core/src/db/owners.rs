//! Owner database operations.

use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{Database, DbError, DbResult};
use crate::billing::BillingError;
use crate::models::Owner;
use crate::money;

const OWNER_COLUMNS: &str = "id, name, document_id, phone, email, address, credit_balance, created_at, updated_at";

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        document_id: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        credit_balance: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    /// Insert a new owner.
    pub fn insert_owner(&self, owner: &Owner) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO owners (
                id, name, document_id, phone, email, address,
                credit_balance, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                owner.id,
                owner.name,
                owner.document_id,
                owner.phone,
                owner.email,
                owner.address,
                owner.credit_balance,
                owner.created_at,
                owner.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update contact fields. The credit balance is only changed by payments.
    pub fn update_owner(&self, owner: &Owner) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE owners SET
                name = ?2,
                document_id = ?3,
                phone = ?4,
                email = ?5,
                address = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                owner.id,
                owner.name,
                owner.document_id,
                owner.phone,
                owner.email,
                owner.address,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an owner by ID.
    pub fn get_owner(&self, id: &str) -> DbResult<Option<Owner>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM owners WHERE id = ?", OWNER_COLUMNS),
                [id],
                owner_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search owners by name or document (prefix match).
    pub fn search_owners(&self, query: &str, limit: usize) -> DbResult<Vec<Owner>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM owners WHERE name LIKE ?1 OR document_id LIKE ?1 ORDER BY name LIMIT ?2",
            OWNER_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], owner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all owners.
    pub fn list_owners(&self) -> DbResult<Vec<Owner>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM owners ORDER BY name", OWNER_COLUMNS))?;
        let rows = stmt.query_map([], owner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete an owner. Fails while patients or invoices reference it.
    pub fn delete_owner(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM owners WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Add (or with a negative delta, remove) USD credit. Returns the new balance.
    ///
    /// Removing more than the owner holds fails with `InsufficientCredit`.
    pub(crate) fn adjust_owner_credit(&self, owner_id: &str, delta_usd: f64) -> DbResult<f64> {
        let owner = self
            .get_owner(owner_id)?
            .ok_or_else(|| DbError::NotFound(format!("owner {}", owner_id)))?;
        let balance = money::to_decimal(owner.credit_balance) + money::to_decimal(delta_usd);
        if balance < Decimal::ZERO {
            return Err(BillingError::InsufficientCredit {
                available: owner.credit_balance,
                requested: -delta_usd,
            }
            .into());
        }
        let balance = money::to_f64(balance);

        self.conn.execute(
            "UPDATE owners SET credit_balance = ?2, updated_at = ?3 WHERE id = ?1",
            params![owner_id, balance, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let mut owner = Owner::new("Carlos Rivas".into());
        owner.document_id = Some("V-12345678".into());
        owner.phone = Some("0414-5550000".into());
        db.insert_owner(&owner).unwrap();

        let retrieved = db.get_owner(&owner.id).unwrap().unwrap();
        assert_eq!(retrieved, owner);
    }

    #[test]
    fn test_update_owner() {
        let db = setup_db();
        let mut owner = Owner::new("Carlos Rivas".into());
        db.insert_owner(&owner).unwrap();

        owner.email = Some("carlos@example.com".into());
        assert!(db.update_owner(&owner).unwrap());

        let retrieved = db.get_owner(&owner.id).unwrap().unwrap();
        assert_eq!(retrieved.email.as_deref(), Some("carlos@example.com"));
        assert!(chrono::DateTime::parse_from_rfc3339(&retrieved.updated_at).is_ok());
    }

    #[test]
    fn test_search_owners() {
        let db = setup_db();
        db.insert_owner(&Owner::new("María González".into())).unwrap();
        db.insert_owner(&Owner::new("Mario Bello".into())).unwrap();
        db.insert_owner(&Owner::new("Luis Mata".into())).unwrap();

        let results = db.search_owners("Mar", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(db.list_owners().unwrap().len(), 3);
    }

    #[test]
    fn test_adjust_credit_never_negative() {
        let db = setup_db();
        let owner = Owner::new("Ana".into());
        db.insert_owner(&owner).unwrap();

        assert_eq!(db.adjust_owner_credit(&owner.id, 12.5).unwrap(), 12.5);
        assert_eq!(db.adjust_owner_credit(&owner.id, -2.5).unwrap(), 10.0);
        assert!(matches!(
            db.adjust_owner_credit(&owner.id, -10.0005),
            Err(DbError::Billing(BillingError::InsufficientCredit { .. }))
        ));
        assert_eq!(db.get_owner(&owner.id).unwrap().unwrap().credit_balance, 10.0);
        assert_eq!(db.adjust_owner_credit(&owner.id, -10.0).unwrap(), 0.0);
        assert!(matches!(
            db.adjust_owner_credit("missing", 1.0),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_owner() {
        let db = setup_db();
        let owner = Owner::new("Ana".into());
        db.insert_owner(&owner).unwrap();
        assert!(db.delete_owner(&owner.id).unwrap());
        assert!(db.get_owner(&owner.id).unwrap().is_none());
    }
}
