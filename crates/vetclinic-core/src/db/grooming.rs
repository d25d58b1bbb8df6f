//! Grooming service operations.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{parse_currency, Database, DbError, DbResult};
use crate::models::{GroomingService, GroomingStatus};
use crate::money::Currency;

/// A grooming service joined with its patient and owner, for reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroomingReportRow {
    pub date: String,
    pub patient_name: String,
    pub owner_name: String,
    pub service_type: String,
    pub price: f64,
    pub currency: Currency,
    pub status: GroomingStatus,
}

impl Database {
    /// Record a grooming service.
    pub fn insert_grooming(&self, g: &GroomingService) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO grooming_services (
                id, patient_id, date, service_type, price, currency,
                groomer, notes, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                g.id,
                g.patient_id,
                g.date,
                g.service_type,
                g.price,
                g.currency.as_str(),
                g.groomer,
                g.notes,
                g.status.as_str(),
                g.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a grooming service by ID.
    pub fn get_grooming(&self, id: &str) -> DbResult<Option<GroomingService>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, date, service_type, price, currency,
                       groomer, notes, status, created_at
                FROM grooming_services
                WHERE id = ?
                "#,
                [id],
                grooming_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Change the status of a grooming service.
    pub fn set_grooming_status(&self, id: &str, status: GroomingStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE grooming_services SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Grooming services for a patient, most recent first.
    pub fn list_grooming_for_patient(&self, patient_id: &str) -> DbResult<Vec<GroomingService>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, service_type, price, currency,
                   groomer, notes, status, created_at
            FROM grooming_services
            WHERE patient_id = ?
            ORDER BY date DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], grooming_row)?;

        let mut services = Vec::new();
        for row in rows {
            services.push(row?.try_into()?);
        }
        Ok(services)
    }

    /// Report rows for services dated within `[from, to]` (YYYY-MM-DD, inclusive).
    pub fn grooming_report(&self, from: &str, to: &str) -> DbResult<Vec<GroomingReportRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT g.date, p.name, o.name, g.service_type, g.price, g.currency, g.status
            FROM grooming_services g
            JOIN patients p ON p.id = g.patient_id
            JOIN owners o ON o.id = p.owner_id
            WHERE g.date >= ?1 AND g.date <= ?2
            ORDER BY g.date, p.name
            "#,
        )?;
        let rows = stmt.query_map(params![from, to], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut report = Vec::new();
        for row in rows {
            let (date, patient_name, owner_name, service_type, price, currency, status) = row?;
            report.push(GroomingReportRow {
                date,
                patient_name,
                owner_name,
                service_type,
                price,
                currency: parse_currency(&currency)?,
                status: GroomingStatus::from_string(&status),
            });
        }
        Ok(report)
    }
}

fn grooming_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroomingRow> {
    Ok(GroomingRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        service_type: row.get(3)?,
        price: row.get(4)?,
        currency: row.get(5)?,
        groomer: row.get(6)?,
        notes: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Intermediate row struct for database mapping.
struct GroomingRow {
    id: String,
    patient_id: String,
    date: String,
    service_type: String,
    price: f64,
    currency: String,
    groomer: Option<String>,
    notes: Option<String>,
    status: String,
    created_at: String,
}

impl TryFrom<GroomingRow> for GroomingService {
    type Error = DbError;

    fn try_from(row: GroomingRow) -> Result<Self, Self::Error> {
        Ok(GroomingService {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            service_type: row.service_type,
            price: row.price,
            currency: parse_currency(&row.currency)?,
            groomer: row.groomer,
            notes: row.notes,
            status: GroomingStatus::from_string(&row.status),
            created_at: row.created_at,
        })
    }
}
