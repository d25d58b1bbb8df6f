//! Consultation, vaccination and deworming operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::{Consultation, Deworming, Vaccination};

impl Database {
    /// Record a consultation.
    pub fn insert_consultation(&self, c: &Consultation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                id, patient_id, date, reason, diagnosis, treatment,
                weight_kg, temperature_c, veterinarian, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                c.id,
                c.patient_id,
                c.date,
                c.reason,
                c.diagnosis,
                c.treatment,
                c.weight_kg,
                c.temperature_c,
                c.veterinarian,
                c.created_at,
            ],
        )?;
        Ok(())
    }

    /// Consultations for a patient, most recent first.
    pub fn list_consultations_for_patient(&self, patient_id: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, reason, diagnosis, treatment,
                   weight_kg, temperature_c, veterinarian, created_at
            FROM consultations
            WHERE patient_id = ?
            ORDER BY date DESC, created_at DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(Consultation {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                date: row.get(2)?,
                reason: row.get(3)?,
                diagnosis: row.get(4)?,
                treatment: row.get(5)?,
                weight_kg: row.get(6)?,
                temperature_c: row.get(7)?,
                veterinarian: row.get(8)?,
                created_at: row.get(9)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record a vaccination.
    pub fn insert_vaccination(&self, v: &Vaccination) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vaccinations (id, patient_id, date, vaccine, batch_number, next_due, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![v.id, v.patient_id, v.date, v.vaccine, v.batch_number, v.next_due, v.created_at],
        )?;
        Ok(())
    }

    /// Vaccinations for a patient, most recent first.
    pub fn list_vaccinations_for_patient(&self, patient_id: &str) -> DbResult<Vec<Vaccination>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, vaccine, batch_number, next_due, created_at
            FROM vaccinations
            WHERE patient_id = ?
            ORDER BY date DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], vaccination_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Vaccinations whose next dose is due on or before `date` (YYYY-MM-DD).
    pub fn list_vaccinations_due(&self, date: &str) -> DbResult<Vec<Vaccination>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, vaccine, batch_number, next_due, created_at
            FROM vaccinations
            WHERE next_due IS NOT NULL AND next_due <= ?
            ORDER BY next_due
            "#,
        )?;
        let rows = stmt.query_map([date], vaccination_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record a deworming.
    pub fn insert_deworming(&self, d: &Deworming) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO dewormings (id, patient_id, date, product, dose, next_due, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![d.id, d.patient_id, d.date, d.product, d.dose, d.next_due, d.created_at],
        )?;
        Ok(())
    }

    /// Dewormings for a patient, most recent first.
    pub fn list_dewormings_for_patient(&self, patient_id: &str) -> DbResult<Vec<Deworming>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, product, dose, next_due, created_at
            FROM dewormings
            WHERE patient_id = ?
            ORDER BY date DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], |row| {
            Ok(Deworming {
                id: row.get(0)?,
                patient_id: row.get(1)?,
                date: row.get(2)?,
                product: row.get(3)?,
                dose: row.get(4)?,
                next_due: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn vaccination_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vaccination> {
    Ok(Vaccination {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        vaccine: row.get(3)?,
        batch_number: row.get(4)?,
        next_due: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, Patient};

    fn setup_db() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let owner = Owner::new("Ana".into());
        db.insert_owner(&owner).unwrap();
        let patient = Patient::new(owner.id, "Max".into(), "canine".into());
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    #[test]
    fn test_consultation_history_order() {
        let (db, patient) = setup_db();
        let mut first = Consultation::new(patient.id.clone(), "2024-01-10".into(), "Vómitos".into());
        first.diagnosis = Some("Gastritis".into());
        let second = Consultation::new(patient.id.clone(), "2024-03-02".into(), "Control".into());
        db.insert_consultation(&first).unwrap();
        db.insert_consultation(&second).unwrap();

        let history = db.list_consultations_for_patient(&patient.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-03-02");
        assert_eq!(history[1].diagnosis.as_deref(), Some("Gastritis"));
    }

    #[test]
    fn test_vaccinations_due() {
        let (db, patient) = setup_db();
        let mut rabies = Vaccination::new(patient.id.clone(), "2023-05-01".into(), "Rabia".into());
        rabies.next_due = Some("2024-05-01".into());
        let mut dhpp = Vaccination::new(patient.id.clone(), "2024-01-01".into(), "Séxtuple".into());
        dhpp.next_due = Some("2025-01-01".into());
        db.insert_vaccination(&rabies).unwrap();
        db.insert_vaccination(&dhpp).unwrap();

        let due = db.list_vaccinations_due("2024-06-01").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].vaccine, "Rabia");
        assert_eq!(db.list_vaccinations_for_patient(&patient.id).unwrap().len(), 2);
    }

    #[test]
    fn test_dewormings_deleted_with_patient() {
        let (db, patient) = setup_db();
        db.insert_deworming(&Deworming::new(patient.id.clone(), "2024-02-01".into(), "Drontal".into()))
            .unwrap();
        assert_eq!(db.list_dewormings_for_patient(&patient.id).unwrap().len(), 1);

        db.delete_patient(&patient.id).unwrap();
        assert!(db.list_dewormings_for_patient(&patient.id).unwrap().is_empty());
    }
}
