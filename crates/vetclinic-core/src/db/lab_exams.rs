//! Lab exam operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::lab::DifferentialCount;
use crate::models::LabExam;

impl Database {
    /// Record a lab exam.
    pub fn insert_lab_exam(&self, exam: &LabExam) -> DbResult<()> {
        let differential_json = serde_json::to_string(&exam.differential)?;
        self.conn.execute(
            r#"
            INSERT INTO lab_exams (
                id, patient_id, date, exam_type, hematocrit, hemoglobin,
                wbc, platelets, differential, observations, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                exam.id,
                exam.patient_id,
                exam.date,
                exam.exam_type,
                exam.hematocrit,
                exam.hemoglobin,
                exam.wbc,
                exam.platelets,
                differential_json,
                exam.observations,
                exam.created_at,
            ],
        )?;
        Ok(())
    }

    /// Save a differential count for an existing exam.
    pub fn update_differential(&self, exam_id: &str, counts: &DifferentialCount) -> DbResult<bool> {
        let json = serde_json::to_string(counts)?;
        let rows_affected = self.conn.execute(
            "UPDATE lab_exams SET differential = ?2 WHERE id = ?1",
            params![exam_id, json],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a lab exam by ID.
    pub fn get_lab_exam(&self, id: &str) -> DbResult<Option<LabExam>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, date, exam_type, hematocrit, hemoglobin,
                       wbc, platelets, differential, observations, created_at
                FROM lab_exams
                WHERE id = ?
                "#,
                [id],
                lab_exam_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Lab exams for a patient, most recent first.
    pub fn list_lab_exams_for_patient(&self, patient_id: &str) -> DbResult<Vec<LabExam>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, date, exam_type, hematocrit, hemoglobin,
                   wbc, platelets, differential, observations, created_at
            FROM lab_exams
            WHERE patient_id = ?
            ORDER BY date DESC
            "#,
        )?;
        let rows = stmt.query_map([patient_id], lab_exam_row)?;

        let mut exams = Vec::new();
        for row in rows {
            exams.push(row?.try_into()?);
        }
        Ok(exams)
    }
}

fn lab_exam_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LabExamRow> {
    Ok(LabExamRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        exam_type: row.get(3)?,
        hematocrit: row.get(4)?,
        hemoglobin: row.get(5)?,
        wbc: row.get(6)?,
        platelets: row.get(7)?,
        differential: row.get(8)?,
        observations: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Intermediate row struct for database mapping.
struct LabExamRow {
    id: String,
    patient_id: String,
    date: String,
    exam_type: String,
    hematocrit: Option<f64>,
    hemoglobin: Option<f64>,
    wbc: Option<f64>,
    platelets: Option<f64>,
    differential: String,
    observations: Option<String>,
    created_at: String,
}

impl TryFrom<LabExamRow> for LabExam {
    type Error = DbError;

    fn try_from(row: LabExamRow) -> Result<Self, Self::Error> {
        Ok(LabExam {
            id: row.id,
            patient_id: row.patient_id,
            date: row.date,
            exam_type: row.exam_type,
            hematocrit: row.hematocrit,
            hemoglobin: row.hemoglobin,
            wbc: row.wbc,
            platelets: row.platelets,
            differential: serde_json::from_str(&row.differential)?,
            observations: row.observations,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::{CellType, DifferentialCounter};
    use crate::models::{Owner, Patient};

    #[test]
    fn test_exam_with_differential() {
        let db = Database::open_in_memory().unwrap();
        let owner = Owner::new("Ana".into());
        db.insert_owner(&owner).unwrap();
        let patient = Patient::new(owner.id, "Michi".into(), "feline".into());
        db.insert_patient(&patient).unwrap();

        let mut exam = LabExam::new(patient.id.clone(), "2024-05-05".into(), "hematology".into());
        exam.wbc = Some(9.5);
        db.insert_lab_exam(&exam).unwrap();

        let mut counter = DifferentialCounter::new();
        for _ in 0..60 {
            counter.increment(CellType::Neutrophils).unwrap();
        }
        for _ in 0..40 {
            counter.increment(CellType::Lymphocytes).unwrap();
        }
        assert!(db.update_differential(&exam.id, counter.counts()).unwrap());

        let stored = db.get_lab_exam(&exam.id).unwrap().unwrap();
        assert_eq!(stored.differential.neutrophils, 60);
        assert_eq!(stored.differential.total(), 100);
        assert_eq!(stored.wbc, Some(9.5));
        assert_eq!(db.list_lab_exams_for_patient(&patient.id).unwrap().len(), 1);
    }
}
