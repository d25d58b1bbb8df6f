//! Per-patient clinical entries: consultations, vaccinations, dewormings.

use serde::{Deserialize, Serialize};

/// A consultation visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub id: String,
    pub patient_id: String,
    /// Visit date (YYYY-MM-DD)
    pub date: String,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    /// Weight recorded at the visit
    pub weight_kg: Option<f64>,
    pub temperature_c: Option<f64>,
    pub veterinarian: Option<String>,
    pub created_at: String,
}

impl Consultation {
    pub fn new(patient_id: String, date: String, reason: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            reason,
            diagnosis: None,
            treatment: None,
            weight_kg: None,
            temperature_c: None,
            veterinarian: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A vaccine application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vaccination {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub vaccine: String,
    pub batch_number: Option<String>,
    /// Next dose due (YYYY-MM-DD)
    pub next_due: Option<String>,
    pub created_at: String,
}

impl Vaccination {
    pub fn new(patient_id: String, date: String, vaccine: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            vaccine,
            batch_number: None,
            next_due: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A deworming treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deworming {
    pub id: String,
    pub patient_id: String,
    pub date: String,
    pub product: String,
    pub dose: Option<String>,
    pub next_due: Option<String>,
    pub created_at: String,
}

impl Deworming {
    pub fn new(patient_id: String, date: String, product: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            product,
            dose: None,
            next_due: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// True when `next_due` is set and falls on or before `today`.
pub fn is_due(next_due: Option<&str>, today: chrono::NaiveDate) -> bool {
    next_due
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|due| due <= today)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_is_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert!(is_due(Some("2024-03-10"), today));
        assert!(is_due(Some("2024-01-01"), today));
        assert!(!is_due(Some("2024-04-01"), today));
        assert!(!is_due(None, today));
        assert!(!is_due(Some("garbage"), today));
    }
}
