//! Clinic settings.

use serde::{Deserialize, Serialize};

/// Clinic-wide settings, stored as a single row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicSettings {
    pub name: String,
    /// Tax identifier printed on invoices
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Current Bs per USD rate, used for new invoices
    pub exchange_rate: f64,
    /// Footer text on printed invoices
    pub invoice_footer: Option<String>,
    pub updated_at: String,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self {
            name: "Clínica Veterinaria".to_string(),
            tax_id: None,
            address: None,
            phone: None,
            email: None,
            exchange_rate: 1.0,
            invoice_footer: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
