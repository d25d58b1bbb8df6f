//! SQLite schema definition.

/// Complete database schema for the clinic.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- Timestamps are RFC 3339 text, the same shape chrono writes.

-- ============================================================================
-- Owners & Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS owners (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    document_id TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    credit_balance REAL NOT NULL DEFAULT 0 CHECK (credit_balance >= 0),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_owners_name ON owners(name);
CREATE UNIQUE INDEX IF NOT EXISTS idx_owners_document ON owners(document_id)
    WHERE document_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES owners(id),
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT,
    sex TEXT NOT NULL DEFAULT 'unknown',
    weight_kg REAL,
    date_of_birth TEXT,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_owner ON patients(owner_id);
CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Clinical records
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    reason TEXT NOT NULL,
    diagnosis TEXT,
    treatment TEXT,
    weight_kg REAL,
    temperature_c REAL,
    veterinarian TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id, date);

CREATE TABLE IF NOT EXISTS vaccinations (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    vaccine TEXT NOT NULL,
    batch_number TEXT,
    next_due TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_vaccinations_patient ON vaccinations(patient_id, date);
CREATE INDEX IF NOT EXISTS idx_vaccinations_due ON vaccinations(next_due);

CREATE TABLE IF NOT EXISTS dewormings (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    product TEXT NOT NULL,
    dose TEXT,
    next_due TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_dewormings_patient ON dewormings(patient_id, date);

CREATE TABLE IF NOT EXISTS grooming_services (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    service_type TEXT NOT NULL,
    price REAL NOT NULL CHECK (price >= 0),
    currency TEXT NOT NULL CHECK (currency IN ('USD', 'Bs')),
    groomer TEXT,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'scheduled',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_grooming_date ON grooming_services(date);

CREATE TABLE IF NOT EXISTS lab_exams (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    exam_type TEXT NOT NULL,
    hematocrit REAL,
    hemoglobin REAL,
    wbc REAL,
    platelets REAL,
    differential TEXT NOT NULL DEFAULT '{}',     -- JSON DifferentialCount
    observations TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_exams_patient ON lab_exams(patient_id, date);

-- ============================================================================
-- Catalog & Purchases
-- ============================================================================

CREATE TABLE IF NOT EXISTS catalog_items (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN ('product', 'service')),
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL CHECK (price >= 0),
    currency TEXT NOT NULL CHECK (currency IN ('USD', 'Bs')),
    stock REAL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_catalog_name ON catalog_items(name);

CREATE TABLE IF NOT EXISTS purchases (
    id TEXT PRIMARY KEY,
    supplier TEXT NOT NULL,
    date TEXT NOT NULL,
    items TEXT NOT NULL DEFAULT '[]',            -- JSON array of PurchaseItem
    total REAL NOT NULL,
    currency TEXT NOT NULL CHECK (currency IN ('USD', 'Bs')),
    exchange_rate REAL NOT NULL DEFAULT 1,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_purchases_date ON purchases(date);

-- ============================================================================
-- Invoices & Payments
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES owners(id),
    patient_id TEXT REFERENCES patients(id) ON DELETE SET NULL,
    number TEXT NOT NULL UNIQUE,
    issued_at TEXT NOT NULL,
    total REAL NOT NULL CHECK (total >= 0),
    currency TEXT NOT NULL CHECK (currency IN ('USD', 'Bs')),
    exchange_rate REAL NOT NULL DEFAULT 1,
    amount_paid REAL NOT NULL DEFAULT 0,         -- USD equivalent
    amount_paid_usd REAL NOT NULL DEFAULT 0,
    amount_paid_bs REAL NOT NULL DEFAULT 0,
    payment_status TEXT NOT NULL DEFAULT 'Pendiente'
        CHECK (payment_status IN ('Pendiente', 'Parcial', 'Pagado', 'Cancelado')),
    items TEXT NOT NULL DEFAULT '[]',            -- JSON array of InvoiceItem
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_invoices_owner ON invoices(owner_id, issued_at);
CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(payment_status);
CREATE INDEX IF NOT EXISTS idx_invoices_issued ON invoices(issued_at);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    invoice_id TEXT NOT NULL REFERENCES invoices(id),
    amount REAL NOT NULL CHECK (amount >= 0),
    currency TEXT NOT NULL CHECK (currency IN ('USD', 'Bs')),
    exchange_rate REAL NOT NULL DEFAULT 1,
    amount_usd REAL NOT NULL,
    method TEXT NOT NULL,
    reference TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'cancelled')),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    cancelled_at TEXT,
    cancel_reason TEXT,
    surplus_usd REAL NOT NULL DEFAULT 0 CHECK (surplus_usd >= 0)
);

CREATE INDEX IF NOT EXISTS idx_payments_invoice ON payments(invoice_id);
CREATE INDEX IF NOT EXISTS idx_payments_created ON payments(created_at);

-- ============================================================================
-- Clinic settings (single row)
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinic_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    name TEXT NOT NULL,
    tax_id TEXT,
    address TEXT,
    phone TEXT,
    email TEXT,
    exchange_rate REAL NOT NULL DEFAULT 1 CHECK (exchange_rate > 0),
    invoice_footer TEXT,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

INSERT OR IGNORE INTO clinic_settings (id, name, exchange_rate)
VALUES (1, 'Clínica Veterinaria', 1);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM clinic_settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invoice_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute("INSERT INTO owners (id, name) VALUES ('o1', 'Ana')", [])
            .unwrap();

        let result = conn.execute(
            "INSERT INTO invoices (id, owner_id, number, issued_at, total, currency, payment_status)
             VALUES ('i1', 'o1', 'F-1', '2024-01-01', 10, 'USD', 'Paid')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO invoices (id, owner_id, number, issued_at, total, currency, payment_status)
             VALUES ('i1', 'o1', 'F-1', '2024-01-01', 10, 'USD', 'Pendiente')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_owner_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (id, owner_id, name, species) VALUES ('p1', 'missing', 'Max', 'canine')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_credit_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        let result = conn.execute(
            "INSERT INTO owners (id, name, credit_balance) VALUES ('o1', 'Ana', -1)",
            [],
        );
        assert!(result.is_err());
    }
}
