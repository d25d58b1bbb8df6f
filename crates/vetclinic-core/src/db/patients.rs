//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Patient, Sex};

const PATIENT_COLUMNS: &str = "id, owner_id, name, species, breed, sex, weight_kg, date_of_birth, notes, created_at, updated_at";

fn patient_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    let sex: String = row.get(5)?;
    Ok(Patient {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        sex: Sex::from_string(&sex),
        weight_kg: row.get(6)?,
        date_of_birth: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, owner_id, name, species, breed, sex, weight_kg,
                date_of_birth, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient.id,
                patient.owner_id,
                patient.name,
                patient.species,
                patient.breed,
                patient.sex.as_str(),
                patient.weight_kg,
                patient.date_of_birth,
                patient.notes,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                owner_id = ?2,
                name = ?3,
                species = ?4,
                breed = ?5,
                sex = ?6,
                weight_kg = ?7,
                date_of_birth = ?8,
                notes = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                patient.id,
                patient.owner_id,
                patient.name,
                patient.species,
                patient.breed,
                patient.sex.as_str(),
                patient.weight_kg,
                patient.date_of_birth,
                patient.notes,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the patients of one owner.
    pub fn list_patients_for_owner(&self, owner_id: &str) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE owner_id = ? ORDER BY name",
            PATIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([owner_id], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search patients by name (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients WHERE name LIKE ? ORDER BY name LIMIT ?",
            PATIENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM patients ORDER BY name", PATIENT_COLUMNS))?;
        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient together with its clinical records.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Owner;

    fn setup_db() -> (Database, Owner) {
        let db = Database::open_in_memory().unwrap();
        let owner = Owner::new("Ana".into());
        db.insert_owner(&owner).unwrap();
        (db, owner)
    }

    #[test]
    fn test_insert_and_get() {
        let (db, owner) = setup_db();

        let mut patient = Patient::new(owner.id.clone(), "Max".into(), "canine".into());
        patient.breed = Some("Golden Retriever".into());
        patient.sex = Sex::Male;
        patient.weight_kg = Some(30.0);

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Max");
        assert_eq!(retrieved.sex, Sex::Male);
        assert_eq!(retrieved.breed, Some("Golden Retriever".into()));
        assert_eq!(retrieved.weight_kg, Some(30.0));
    }

    #[test]
    fn test_update_patient() {
        let (db, owner) = setup_db();

        let mut patient = Patient::new(owner.id.clone(), "Max".into(), "canine".into());
        db.insert_patient(&patient).unwrap();

        patient.weight_kg = Some(32.0);
        patient.notes = Some("Good boy".into());
        db.update_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(retrieved.weight_kg, Some(32.0));
        assert_eq!(retrieved.notes, Some("Good boy".into()));
    }

    #[test]
    fn test_search_and_list_for_owner() {
        let (db, owner) = setup_db();
        let other = Owner::new("Luis".into());
        db.insert_owner(&other).unwrap();

        db.insert_patient(&Patient::new(owner.id.clone(), "Max".into(), "canine".into()))
            .unwrap();
        db.insert_patient(&Patient::new(owner.id.clone(), "Maxine".into(), "feline".into()))
            .unwrap();
        db.insert_patient(&Patient::new(other.id.clone(), "Luna".into(), "canine".into()))
            .unwrap();

        let results = db.search_patients("Max", 10).unwrap();
        assert_eq!(results.len(), 2);

        let mine = db.list_patients_for_owner(&owner.id).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.owner_id == owner.id));
    }

    #[test]
    fn test_patient_requires_owner() {
        let (db, _) = setup_db();
        let patient = Patient::new("missing".into(), "Max".into(), "canine".into());
        assert!(db.insert_patient(&patient).is_err());
    }
}
