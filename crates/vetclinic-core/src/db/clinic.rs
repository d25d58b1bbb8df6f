//! Clinic settings operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::ClinicSettings;

impl Database {
    /// Load the clinic settings row.
    pub fn get_clinic_settings(&self) -> DbResult<ClinicSettings> {
        self.conn
            .query_row(
                r#"
                SELECT name, tax_id, address, phone, email, exchange_rate, invoice_footer, updated_at
                FROM clinic_settings WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(ClinicSettings {
                        name: row.get(0)?,
                        tax_id: row.get(1)?,
                        address: row.get(2)?,
                        phone: row.get(3)?,
                        email: row.get(4)?,
                        exchange_rate: row.get(5)?,
                        invoice_footer: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Save clinic settings. The exchange rate must be positive.
    pub fn update_clinic_settings(&self, settings: &ClinicSettings) -> DbResult<()> {
        if !settings.exchange_rate.is_finite() || settings.exchange_rate <= 0.0 {
            return Err(DbError::Constraint(format!(
                "exchange rate must be positive, got {}",
                settings.exchange_rate
            )));
        }
        self.conn.execute(
            r#"
            UPDATE clinic_settings SET
                name = ?1,
                tax_id = ?2,
                address = ?3,
                phone = ?4,
                email = ?5,
                exchange_rate = ?6,
                invoice_footer = ?7,
                updated_at = ?8
            WHERE id = 1
            "#,
            params![
                settings.name,
                settings.tax_id,
                settings.address,
                settings.phone,
                settings.email,
                settings.exchange_rate,
                settings.invoice_footer,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Current Bs-per-USD rate from settings.
    pub fn current_exchange_rate(&self) -> DbResult<f64> {
        Ok(self.get_clinic_settings()?.exchange_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_row() {
        let db = Database::open_in_memory().unwrap();
        let settings = db.get_clinic_settings().unwrap();
        assert_eq!(settings.exchange_rate, 1.0);
        assert!(chrono::DateTime::parse_from_rfc3339(&settings.updated_at).is_ok());
    }

    #[test]
    fn test_update_settings() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.get_clinic_settings().unwrap();
        settings.name = "Veterinaria San Roque".into();
        settings.exchange_rate = 36.42;
        db.update_clinic_settings(&settings).unwrap();

        let stored = db.get_clinic_settings().unwrap();
        assert_eq!(stored.name, "Veterinaria San Roque");
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.updated_at).is_ok());
        assert_eq!(db.current_exchange_rate().unwrap(), 36.42);
    }

    #[test]
    fn test_rejects_bad_rate() {
        let db = Database::open_in_memory().unwrap();
        let mut settings = db.get_clinic_settings().unwrap();
        settings.exchange_rate = 0.0;
        assert!(matches!(
            db.update_clinic_settings(&settings),
            Err(DbError::Constraint(_))
        ));
    }
}
