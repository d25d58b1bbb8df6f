//! Lab exam models.

use serde::{Deserialize, Serialize};

use crate::lab::DifferentialCount;

/// A hematology lab exam with a manual differential count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabExam {
    pub id: String,
    pub patient_id: String,
    /// Exam date (YYYY-MM-DD)
    pub date: String,
    /// e.g. "hematology", "blood chemistry"
    pub exam_type: String,
    /// Hematocrit (%)
    pub hematocrit: Option<f64>,
    /// Hemoglobin (g/dL)
    pub hemoglobin: Option<f64>,
    /// White blood cells (×10³/µL)
    pub wbc: Option<f64>,
    /// Platelets (×10³/µL)
    pub platelets: Option<f64>,
    pub differential: DifferentialCount,
    pub observations: Option<String>,
    pub created_at: String,
}

impl LabExam {
    pub fn new(patient_id: String, date: String, exam_type: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            exam_type,
            hematocrit: None,
            hemoglobin: None,
            wbc: None,
            platelets: None,
            differential: DifferentialCount::default(),
            observations: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
