//! Owner (client) models.

use serde::{Deserialize, Serialize};

/// A pet owner. Owners hold invoices and an optional USD credit balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    /// Local UUID
    pub id: String,
    /// Full name
    pub name: String,
    /// National ID / tax document
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Surplus from past payments, in USD
    pub credit_balance: f64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Owner {
    /// Create a new owner with required fields.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            document_id: None,
            phone: None,
            email: None,
            address: None,
            credit_balance: 0.0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether the owner has credit available for offsets.
    pub fn has_credit(&self) -> bool {
        self.credit_balance > crate::money::PAYMENT_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_owner() {
        let owner = Owner::new("Ana Pérez".into());
        assert_eq!(owner.name, "Ana Pérez");
        assert_eq!(owner.credit_balance, 0.0);
        assert!(!owner.has_credit());
        assert_eq!(owner.id.len(), 36);
    }
}
