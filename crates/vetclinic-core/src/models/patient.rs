//! Patient models.

use serde::{Deserialize, Serialize};

/// Patient sex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "male" | "macho" | "m" => Sex::Male,
            "female" | "hembra" | "f" => Sex::Female,
            _ => Sex::Unknown,
        }
    }
}

/// A patient (animal) belonging to one owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID
    pub id: String,
    /// Owning client
    pub owner_id: String,
    /// Patient name
    pub name: String,
    /// Species (e.g., "canine", "feline")
    pub species: String,
    /// Breed
    pub breed: Option<String>,
    pub sex: Sex,
    /// Weight in kg
    pub weight_kg: Option<f64>,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    /// Additional notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(owner_id: String, name: String, species: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id,
            name,
            species,
            breed: None,
            sex: Sex::Unknown,
            weight_kg: None,
            date_of_birth: None,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Get the canonical species name (lowercase).
    pub fn canonical_species(&self) -> String {
        self.species.to_lowercase()
    }

    /// Age in whole years on `today`, if the date of birth is known and valid.
    pub fn age_years(&self, today: chrono::NaiveDate) -> Option<u32> {
        let dob = chrono::NaiveDate::parse_from_str(self.date_of_birth.as_deref()?, "%Y-%m-%d").ok()?;
        today.years_since(dob)
    }
}
