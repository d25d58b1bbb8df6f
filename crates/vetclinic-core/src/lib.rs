//! VetClinic Core Library
//!
//! Local-first veterinary practice records with multi-currency billing.
//!
//! # Architecture
//!
//! ```text
//! Owners ──► Patients ──► Consultations / Vaccinations / Dewormings
//!   │             │
//!   │             ├──► Grooming services ──┐
//!   │             └──► Lab exams           │
//!   │                  (differential)      ▼
//!   └──────────────────────────────────► Invoices (USD or Bs, rate snapshot)
//!                                           │
//!                         Payments (USD / Bs, credit offset, cancellation)
//!                                           │
//!                       ┌───────────────────┼───────────────────┐
//!                       ▼                   ▼                   ▼
//!                  CSV reports        Printable HTML      Income summaries
//! ```
//!
//! # Core Principle
//!
//! **Paid and pending are always compared in USD.** Bs amounts are converted
//! with the rate recorded on the invoice, never with today's rate.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Owner, Patient, Invoice, Payment, etc.)
//! - [`billing`]: Payment reconciliation and batch payments
//! - [`lab`]: Differential cell counter
//! - [`export`]: CSV reports and invoice printing
//! - [`reports`]: Income and balance summaries

pub mod billing;
pub mod config;
pub mod db;
pub mod export;
pub mod lab;
pub mod logging;
pub mod models;
pub mod money;
pub mod reports;

// Re-export commonly used types
pub use billing::{BatchOutcome, BatchPayment, BillingError, PaymentSummary};
pub use config::{ClinicConfig, ConfigError};
pub use db::{Database, DbError, PaymentReceipt};
pub use lab::{CellType, CounterError, DifferentialCount, DifferentialCounter};
pub use models::{
    CatalogItem, ClinicSettings, Invoice, InvoiceItem, InvoiceStatus, Owner, Patient, Payment,
    PaymentInput, PaymentMethod,
};
pub use money::Currency;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing::info;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<DbError> for VetClinicError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => VetClinicError::NotFound(what),
            DbError::Constraint(msg) => VetClinicError::InvalidInput(msg),
            DbError::Billing(err) => VetClinicError::PaymentRejected(err.to_string()),
            DbError::Json(err) => VetClinicError::SerializationError(err.to_string()),
            DbError::Sqlite(err) => VetClinicError::DatabaseError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for VetClinicError {
    fn from(e: serde_json::Error) -> Self {
        VetClinicError::SerializationError(e.to_string())
    }
}

impl From<CounterError> for VetClinicError {
    fn from(e: CounterError) -> Self {
        VetClinicError::InvalidInput(e.to_string())
    }
}

impl From<money::UnknownCurrency> for VetClinicError {
    fn from(e: money::UnknownCurrency) -> Self {
        VetClinicError::InvalidInput(e.to_string())
    }
}

impl From<ConfigError> for VetClinicError {
    fn from(e: ConfigError) -> Self {
        VetClinicError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<VetClinicCore>, VetClinicError> {
    let db = Database::open(&path)?;
    Ok(VetClinicCore::wrap(db))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VetClinicCore>, VetClinicError> {
    let db = Database::open_in_memory()?;
    Ok(VetClinicCore::wrap(db))
}

/// Initialize logging and open the database described by the environment.
///
/// A configured default rate seeds the clinic settings while they still hold
/// the initial rate of 1.
#[uniffi::export]
pub fn open_from_config() -> Result<Arc<VetClinicCore>, VetClinicError> {
    let config = ClinicConfig::from_env();
    config.validate()?;
    logging::init_logger(&config.log_level, config.log_dir.as_deref());

    let db = Database::open(&config.db_path)?;
    let mut settings = db.get_clinic_settings()?;
    if settings.exchange_rate == 1.0 && config.default_exchange_rate != 1.0 {
        settings.exchange_rate = config.default_exchange_rate;
        db.update_clinic_settings(&settings)?;
    }
    info!(db_path = %config.db_path, rate = settings.exchange_rate, "clinic database ready");
    Ok(VetClinicCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct VetClinicCore {
    db: Arc<Mutex<Database>>,
}

impl VetClinicCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl VetClinicCore {
    // =========================================================================
    // Owner & Patient Operations
    // =========================================================================

    /// Create a new owner.
    pub fn create_owner(
        &self,
        name: String,
        document_id: Option<String>,
        phone: Option<String>,
    ) -> Result<FfiOwner, VetClinicError> {
        let db = self.db.lock()?;
        let mut owner = Owner::new(name);
        owner.document_id = document_id;
        owner.phone = phone;
        db.insert_owner(&owner)?;
        Ok(owner.into())
    }

    /// Get an owner by ID.
    pub fn get_owner(&self, owner_id: String) -> Result<Option<FfiOwner>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_owner(&owner_id)?.map(|o| o.into()))
    }

    /// Search owners by name or document.
    pub fn search_owners(&self, query: String, limit: u32) -> Result<Vec<FfiOwner>, VetClinicError> {
        let db = self.db.lock()?;
        let owners = db.search_owners(&query, limit as usize)?;
        Ok(owners.into_iter().map(|o| o.into()).collect())
    }

    /// Create a new patient for an owner.
    pub fn create_patient(
        &self,
        owner_id: String,
        name: String,
        species: String,
    ) -> Result<FfiPatient, VetClinicError> {
        let db = self.db.lock()?;
        let patient = Patient::new(owner_id, name, species);
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&patient_id)?.map(|p| p.into()))
    }

    /// Patients belonging to an owner.
    pub fn list_patients_for_owner(&self, owner_id: String) -> Result<Vec<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        let patients = db.list_patients_for_owner(&owner_id)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name.
    pub fn search_patients(&self, query: String, limit: u32) -> Result<Vec<FfiPatient>, VetClinicError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Catalog & Settings
    // =========================================================================

    /// Add or update a catalog item.
    pub fn upsert_catalog_item(&self, item: FfiCatalogItem) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        let catalog_item = CatalogItem::try_from(item)?;
        db.upsert_catalog_item(&catalog_item)?;
        Ok(())
    }

    /// Search the catalog, best matches first.
    pub fn search_catalog(&self, query: String, limit: u32) -> Result<Vec<FfiCatalogItem>, VetClinicError> {
        let db = self.db.lock()?;
        let matches = db.search_catalog(&query, limit as usize)?;
        Ok(matches.into_iter().map(|m| m.item.into()).collect())
    }

    /// Current Bs per USD rate.
    pub fn get_exchange_rate(&self) -> Result<f64, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.current_exchange_rate()?)
    }

    /// Set the Bs per USD rate used for new invoices.
    pub fn set_exchange_rate(&self, rate: f64) -> Result<(), VetClinicError> {
        let db = self.db.lock()?;
        let mut settings = db.get_clinic_settings()?;
        settings.exchange_rate = rate;
        db.update_clinic_settings(&settings)?;
        Ok(())
    }

    // =========================================================================
    // Invoice Operations
    // =========================================================================

    /// Create an invoice at the current exchange rate.
    pub fn create_invoice(
        &self,
        owner_id: String,
        patient_id: Option<String>,
        currency: String,
        lines: Vec<FfiInvoiceLine>,
    ) -> Result<FfiInvoice, VetClinicError> {
        let currency: Currency = currency.parse()?;
        let db = self.db.lock()?;
        let rate = db.current_exchange_rate()?;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(invoice_line(&db, line)?);
        }
        let mut invoice = Invoice::from_items(owner_id, db.next_invoice_number()?, currency, rate, items);
        invoice.patient_id = patient_id;
        db.insert_invoice(&invoice)?;
        Ok(invoice.into())
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, invoice_id: String) -> Result<Option<FfiInvoice>, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_invoice(&invoice_id)?.map(|i| i.into()))
    }

    /// Invoices for an owner, most recent first.
    pub fn list_invoices_for_owner(&self, owner_id: String) -> Result<Vec<FfiInvoice>, VetClinicError> {
        let db = self.db.lock()?;
        let invoices = db.list_invoices_for_owner(&owner_id)?;
        Ok(invoices.into_iter().map(|i| i.into()).collect())
    }

    /// Totals, paid and pending for one invoice.
    pub fn invoice_summary(&self, invoice_id: String) -> Result<FfiPaymentSummary, VetClinicError> {
        let db = self.db.lock()?;
        let invoice = db
            .get_invoice(&invoice_id)?
            .ok_or(VetClinicError::NotFound(invoice_id))?;
        Ok(PaymentSummary::of(&invoice).into())
    }

    /// Total pending across an owner's invoices, in USD.
    pub fn owner_balance(&self, owner_id: String) -> Result<f64, VetClinicError> {
        let db = self.db.lock()?;
        let invoices = db.list_invoices_for_owner(&owner_id)?;
        Ok(reports::owner_balance(&invoices))
    }

    /// Cancel an invoice. Returns false if it was already cancelled.
    pub fn cancel_invoice(&self, invoice_id: String) -> Result<bool, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.cancel_invoice(&invoice_id)?)
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    /// Record a payment against an invoice.
    pub fn pay_invoice(
        &self,
        invoice_id: String,
        payment: FfiPaymentInput,
    ) -> Result<FfiPaymentReceipt, VetClinicError> {
        let input = PaymentInput::try_from(payment)?;
        let db = self.db.lock()?;
        let receipt = db.pay_invoice(&invoice_id, &input)?;
        Ok(receipt.into())
    }

    /// Pay the full pending amount of each listed invoice.
    pub fn pay_all(
        &self,
        invoice_ids: Vec<String>,
        currency: String,
        method: String,
        reference: Option<String>,
    ) -> Result<FfiBatchOutcome, VetClinicError> {
        let template = batch_template(&currency, &method, reference)?;
        let db = self.db.lock()?;
        Ok(db.pay_all(&invoice_ids, &template).into())
    }

    /// Pay every open invoice of an owner, oldest first.
    pub fn pay_all_for_owner(
        &self,
        owner_id: String,
        currency: String,
        method: String,
        reference: Option<String>,
    ) -> Result<FfiBatchOutcome, VetClinicError> {
        let template = batch_template(&currency, &method, reference)?;
        let db = self.db.lock()?;
        Ok(db.pay_all_for_owner(&owner_id, &template)?.into())
    }

    /// Cancel a payment and return the recomputed invoice.
    pub fn cancel_payment(
        &self,
        payment_id: String,
        reason: Option<String>,
    ) -> Result<FfiInvoice, VetClinicError> {
        let db = self.db.lock()?;
        let invoice = db.cancel_payment(&payment_id, reason.as_deref())?;
        Ok(invoice.into())
    }

    /// All payments of an invoice, cancelled ones included.
    pub fn list_payments_for_invoice(&self, invoice_id: String) -> Result<Vec<FfiPayment>, VetClinicError> {
        let db = self.db.lock()?;
        let payments = db.list_payments_for_invoice(&invoice_id)?;
        Ok(payments.into_iter().map(|p| p.into()).collect())
    }

    /// Daily income in USD between two dates (YYYY-MM-DD, inclusive).
    pub fn daily_income(&self, from: String, to: String) -> Result<Vec<FfiDailyIncome>, VetClinicError> {
        let (from_date, to_date) = (parse_date(&from)?, parse_date(&to)?);
        let db = self.db.lock()?;
        let payments = db.list_payments_between(&from, &to)?;
        Ok(reports::bucket_by_day(&payments, from_date, to_date)
            .into_iter()
            .map(|d| d.into())
            .collect())
    }

    // =========================================================================
    // Lab Operations
    // =========================================================================

    /// Save a finished differential count on a lab exam.
    pub fn save_differential(
        &self,
        exam_id: String,
        counts: FfiDifferentialCount,
    ) -> Result<bool, VetClinicError> {
        let db = self.db.lock()?;
        Ok(db.update_differential(&exam_id, &counts.into())?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Invoice report as CSV for a date range.
    pub fn export_invoice_report_csv(&self, from: String, to: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let rows = db.invoice_report(&from, &to)?;
        Ok(export::invoice_report_csv(&rows))
    }

    /// Grooming report as CSV for a date range.
    pub fn export_grooming_report_csv(&self, from: String, to: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let rows = db.grooming_report(&from, &to)?;
        Ok(export::grooming_report_csv(&rows))
    }

    /// Both reports as JSON for a date range.
    pub fn export_reports_json(&self, from: String, to: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let report = export::ReportExport::new(
            from.as_str(),
            to.as_str(),
            db.invoice_report(&from, &to)?,
            db.grooming_report(&from, &to)?,
        );
        Ok(report.to_json()?)
    }

    /// Printable HTML for an invoice.
    pub fn render_invoice_html(&self, invoice_id: String) -> Result<String, VetClinicError> {
        let db = self.db.lock()?;
        let invoice = db
            .get_invoice(&invoice_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("invoice {}", invoice_id)))?;
        let owner = db
            .get_owner(&invoice.owner_id)?
            .ok_or_else(|| VetClinicError::NotFound(format!("owner {}", invoice.owner_id)))?;
        let settings = db.get_clinic_settings()?;
        let payments = db.list_payments_for_invoice(&invoice.id)?;
        Ok(export::render_invoice_html(&invoice, &owner, &settings, &payments))
    }
}

/// Build an invoice line, linking it to its catalog entry when one is named.
fn invoice_line(db: &Database, line: FfiInvoiceLine) -> Result<InvoiceItem, VetClinicError> {
    let Some(catalog_id) = line.catalog_item_id else {
        return Ok(InvoiceItem::new(line.description, line.quantity, line.unit_cost));
    };
    let catalog_item = db
        .get_catalog_item(&catalog_id)?
        .ok_or_else(|| VetClinicError::NotFound(format!("catalog item {}", catalog_id)))?;
    let mut item = catalog_item.to_invoice_item(line.quantity);
    item.description = line.description;
    item.unit_cost = line.unit_cost;
    Ok(item)
}

fn batch_template(
    currency: &str,
    method: &str,
    reference: Option<String>,
) -> Result<BatchPayment, VetClinicError> {
    let mut template = BatchPayment::new(currency.parse()?, PaymentMethod::from_string(method));
    template.reference = reference;
    Ok(template)
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate, VetClinicError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| VetClinicError::InvalidInput(format!("invalid date '{}': {}", s, e)))
}

// =========================================================================
// Differential Counter (exported to FFI)
// =========================================================================

/// Interactive differential counter for the lab screen.
#[derive(uniffi::Object)]
pub struct DifferentialSession {
    counter: Mutex<DifferentialCounter>,
}

#[uniffi::export]
impl DifferentialSession {
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            counter: Mutex::new(DifferentialCounter::new()),
        })
    }

    /// Count one cell. Returns the new count for that cell type.
    pub fn increment(&self, cell: String) -> Result<u32, VetClinicError> {
        let cell: CellType = cell.parse()?;
        Ok(self.counter.lock()?.increment(cell)?)
    }

    /// Undo the last increment. Returns whether anything was undone.
    pub fn undo(&self) -> Result<bool, VetClinicError> {
        Ok(self.counter.lock()?.undo())
    }

    pub fn reset(&self) -> Result<(), VetClinicError> {
        self.counter.lock()?.reset();
        Ok(())
    }

    pub fn counts(&self) -> Result<FfiDifferentialCount, VetClinicError> {
        Ok((*self.counter.lock()?.counts()).into())
    }

    /// Percent and absolute value per cell type; absolute needs a WBC value.
    pub fn cell_values(&self, wbc: Option<f64>) -> Result<Vec<FfiCellValue>, VetClinicError> {
        let counts = *self.counter.lock()?.counts();
        Ok(cell_values(&counts, wbc))
    }
}

fn cell_values(counts: &DifferentialCount, wbc: Option<f64>) -> Vec<FfiCellValue> {
    let absolute = wbc.map(|wbc| counts.absolute_values(wbc));
    counts
        .percentages()
        .into_iter()
        .enumerate()
        .map(|(i, (cell, percent))| FfiCellValue {
            cell: cell.as_str().to_string(),
            count: counts.get(cell),
            percent,
            absolute: absolute.as_ref().map(|values| values[i].1),
        })
        .collect()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe owner.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwner {
    pub id: String,
    pub name: String,
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub credit_balance: f64,
}

impl From<Owner> for FfiOwner {
    fn from(owner: Owner) -> Self {
        Self {
            id: owner.id,
            name: owner.name,
            document_id: owner.document_id,
            phone: owner.phone,
            email: owner.email,
            credit_balance: owner.credit_balance,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: String,
    pub weight_kg: Option<f64>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            owner_id: patient.owner_id,
            name: patient.name,
            species: patient.species,
            breed: patient.breed,
            sex: patient.sex.as_str().to_string(),
            weight_kg: patient.weight_kg,
        }
    }
}

/// FFI-safe catalog item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCatalogItem {
    pub id: String,
    /// "product" or "service"
    pub kind: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub stock: Option<f64>,
    pub active: bool,
}

impl From<CatalogItem> for FfiCatalogItem {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind.as_str().to_string(),
            name: item.name,
            price: item.price,
            currency: item.currency.as_str().to_string(),
            stock: item.stock,
            active: item.active,
        }
    }
}

impl TryFrom<FfiCatalogItem> for CatalogItem {
    type Error = VetClinicError;

    fn try_from(item: FfiCatalogItem) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: item.id,
            kind: models::CatalogKind::from_string(&item.kind),
            name: item.name,
            description: None,
            price: item.price,
            currency: item.currency.parse()?,
            stock: item.stock,
            active: item.active,
        })
    }
}

/// FFI-safe invoice line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoiceLine {
    pub description: String,
    pub quantity: f64,
    pub unit_cost: f64,
    /// Catalog item billed by this line, if any
    pub catalog_item_id: Option<String>,
}

impl From<InvoiceItem> for FfiInvoiceLine {
    fn from(item: InvoiceItem) -> Self {
        Self {
            description: item.description,
            quantity: item.quantity,
            unit_cost: item.unit_cost,
            catalog_item_id: item.resource_id,
        }
    }
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub owner_id: String,
    pub patient_id: Option<String>,
    pub number: String,
    pub issued_at: String,
    pub total: f64,
    pub currency: String,
    pub exchange_rate: f64,
    pub amount_paid: f64,
    pub amount_paid_usd: f64,
    pub amount_paid_bs: f64,
    pub payment_status: String,
    pub lines: Vec<FfiInvoiceLine>,
}

impl From<Invoice> for FfiInvoice {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            owner_id: invoice.owner_id,
            patient_id: invoice.patient_id,
            number: invoice.number,
            issued_at: invoice.issued_at,
            total: invoice.total,
            currency: invoice.currency.as_str().to_string(),
            exchange_rate: invoice.exchange_rate,
            amount_paid: invoice.amount_paid,
            amount_paid_usd: invoice.amount_paid_usd,
            amount_paid_bs: invoice.amount_paid_bs,
            payment_status: invoice.payment_status.as_str().to_string(),
            lines: invoice.items.into_iter().map(|i| i.into()).collect(),
        }
    }
}

/// FFI-safe payment summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentSummary {
    pub total_usd: f64,
    pub total_bs: f64,
    pub paid_usd: f64,
    pub pending_usd: f64,
    pub pending_bs: f64,
    pub status: String,
}

impl From<PaymentSummary> for FfiPaymentSummary {
    fn from(summary: PaymentSummary) -> Self {
        Self {
            total_usd: summary.total_usd,
            total_bs: summary.total_bs,
            paid_usd: summary.paid_usd,
            pending_usd: summary.pending_usd,
            pending_bs: summary.pending_bs,
            status: summary.status.as_str().to_string(),
        }
    }
}

/// FFI-safe payment request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentInput {
    pub amount: f64,
    /// "USD" or "Bs"
    pub currency: String,
    pub method: String,
    pub reference: Option<String>,
    pub credit_offset_usd: Option<f64>,
}

impl TryFrom<FfiPaymentInput> for PaymentInput {
    type Error = VetClinicError;

    fn try_from(input: FfiPaymentInput) -> Result<Self, Self::Error> {
        Ok(PaymentInput {
            amount: input.amount,
            currency: input.currency.parse()?,
            method: PaymentMethod::from_string(&input.method),
            reference: input.reference,
            credit_offset_usd: input.credit_offset_usd,
        })
    }
}

/// FFI-safe payment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPayment {
    pub id: String,
    pub invoice_id: String,
    pub amount: f64,
    pub currency: String,
    pub exchange_rate: f64,
    pub amount_usd: f64,
    pub method: String,
    pub reference: Option<String>,
    pub status: String,
    pub created_at: String,
    pub cancel_reason: Option<String>,
    pub surplus_usd: f64,
}

impl From<Payment> for FfiPayment {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount: payment.amount,
            currency: payment.currency.as_str().to_string(),
            exchange_rate: payment.exchange_rate,
            amount_usd: payment.amount_usd,
            method: payment.method.as_str().to_string(),
            reference: payment.reference,
            status: payment.status.as_str().to_string(),
            created_at: payment.created_at,
            cancel_reason: payment.cancel_reason,
            surplus_usd: payment.surplus_usd,
        }
    }
}

/// FFI-safe payment receipt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentReceipt {
    pub payments: Vec<FfiPayment>,
    pub credit_used_usd: f64,
    pub surplus_usd: f64,
    pub invoice: FfiInvoice,
}

impl From<PaymentReceipt> for FfiPaymentReceipt {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            payments: receipt.payments.into_iter().map(|p| p.into()).collect(),
            credit_used_usd: receipt.credit_used_usd,
            surplus_usd: receipt.surplus_usd,
            invoice: receipt.invoice.into(),
        }
    }
}

/// FFI-safe batch failure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatchFailure {
    pub invoice_id: String,
    pub message: String,
}

/// FFI-safe batch outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBatchOutcome {
    pub attempted: u32,
    pub success_count: u32,
    pub skipped: Vec<String>,
    pub failures: Vec<FfiBatchFailure>,
    pub total_paid_usd: f64,
    pub is_partial: bool,
}

impl From<BatchOutcome> for FfiBatchOutcome {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            attempted: outcome.attempted as u32,
            success_count: outcome.success_count as u32,
            is_partial: outcome.is_partial(),
            total_paid_usd: outcome.total_paid_usd,
            skipped: outcome.skipped,
            failures: outcome
                .failures
                .into_iter()
                .map(|f| FfiBatchFailure {
                    invoice_id: f.invoice_id,
                    message: f.message,
                })
                .collect(),
        }
    }
}

/// FFI-safe daily income.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyIncome {
    pub date: String,
    pub usd: f64,
    pub payment_count: u32,
}

impl From<reports::DailyIncome> for FfiDailyIncome {
    fn from(day: reports::DailyIncome) -> Self {
        Self {
            date: day.date,
            usd: day.usd,
            payment_count: day.payment_count as u32,
        }
    }
}

/// FFI-safe differential count.
#[derive(Debug, Clone, Copy, uniffi::Record)]
pub struct FfiDifferentialCount {
    pub neutrophils: u32,
    pub bands: u32,
    pub lymphocytes: u32,
    pub monocytes: u32,
    pub eosinophils: u32,
    pub basophils: u32,
}

impl From<DifferentialCount> for FfiDifferentialCount {
    fn from(c: DifferentialCount) -> Self {
        Self {
            neutrophils: c.neutrophils,
            bands: c.bands,
            lymphocytes: c.lymphocytes,
            monocytes: c.monocytes,
            eosinophils: c.eosinophils,
            basophils: c.basophils,
        }
    }
}

impl From<FfiDifferentialCount> for DifferentialCount {
    fn from(c: FfiDifferentialCount) -> Self {
        Self {
            neutrophils: c.neutrophils,
            bands: c.bands,
            lymphocytes: c.lymphocytes,
            monocytes: c.monocytes,
            eosinophils: c.eosinophils,
            basophils: c.basophils,
        }
    }
}

/// FFI-safe value for one cell type.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCellValue {
    pub cell: String,
    pub count: u32,
    pub percent: f64,
    pub absolute: Option<f64>,
}
