//! Grooming service models.

use serde::{Deserialize, Serialize};

use crate::money::Currency;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroomingStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl GroomingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroomingStatus::Scheduled => "scheduled",
            GroomingStatus::Completed => "completed",
            GroomingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "completed" => GroomingStatus::Completed,
            "cancelled" => GroomingStatus::Cancelled,
            _ => GroomingStatus::Scheduled,
        }
    }
}

/// A grooming appointment for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroomingService {
    pub id: String,
    pub patient_id: String,
    /// Service date (YYYY-MM-DD)
    pub date: String,
    /// e.g. "bath", "haircut", "nail trim"
    pub service_type: String,
    pub price: f64,
    pub currency: Currency,
    pub groomer: Option<String>,
    pub notes: Option<String>,
    pub status: GroomingStatus,
    pub created_at: String,
}

impl GroomingService {
    pub fn new(
        patient_id: String,
        date: String,
        service_type: String,
        price: f64,
        currency: Currency,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            service_type,
            price,
            currency,
            groomer: None,
            notes: None,
            status: GroomingStatus::Scheduled,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Turn a completed service into an invoice line.
    pub fn to_invoice_item(&self) -> super::InvoiceItem {
        super::InvoiceItem {
            description: format!("Grooming: {}", self.service_type),
            quantity: 1.0,
            unit_cost: self.price,
            resource_type: super::ResourceType::Grooming,
            resource_id: Some(self.id.clone()),
        }
    }
}
