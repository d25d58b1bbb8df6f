//! Paying several invoices at once.
//!
//! Invoices are paid one by one in list order. There is no transaction
//! across the batch: a failure leaves earlier payments in place and is
//! reported in the outcome.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::reconcile::pending_amount;
use crate::models::{Invoice, Payment, PaymentInput, PaymentMethod};
use crate::money::{self, Currency, PAYMENT_EPSILON};

/// Storage that can load invoices and record payments against them.
pub trait PaymentRecorder {
    type Error: std::fmt::Display;

    fn load_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, Self::Error>;

    fn record_payment(&self, invoice_id: &str, input: &PaymentInput) -> Result<Payment, Self::Error>;
}

/// Currency and method shared by every payment in a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchPayment {
    pub currency: Currency,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

impl BatchPayment {
    pub fn new(currency: Currency, method: PaymentMethod) -> Self {
        Self {
            currency,
            method,
            reference: None,
        }
    }
}

/// A batch item that could not be paid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchFailure {
    pub invoice_id: String,
    pub message: String,
}

/// What happened to a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchOutcome {
    /// Invoices that had something pending and were attempted
    pub attempted: usize,
    pub success_count: usize,
    /// Invoices skipped because nothing was pending (or they were cancelled)
    pub skipped: Vec<String>,
    pub failures: Vec<BatchFailure>,
    /// USD equivalent of all successful payments
    pub total_paid_usd: f64,
}

impl BatchOutcome {
    /// Some invoices were paid and some were not.
    pub fn is_partial(&self) -> bool {
        self.success_count > 0 && !self.failures.is_empty()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pay the full pending amount of each listed invoice.
pub fn pay_all<R: PaymentRecorder>(
    recorder: &R,
    invoice_ids: &[String],
    template: &BatchPayment,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut total = money::to_decimal(0.0);

    for invoice_id in invoice_ids {
        let invoice = match recorder.load_invoice(invoice_id) {
            Ok(Some(invoice)) => invoice,
            Ok(None) => {
                warn!(invoice_id = %invoice_id, "batch payment: invoice not found");
                outcome.attempted += 1;
                outcome.failures.push(BatchFailure {
                    invoice_id: invoice_id.clone(),
                    message: format!("Invoice not found: {}", invoice_id),
                });
                continue;
            }
            Err(e) => {
                warn!(invoice_id = %invoice_id, error = %e, "batch payment: failed to load invoice");
                outcome.attempted += 1;
                outcome.failures.push(BatchFailure {
                    invoice_id: invoice_id.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let pending = pending_amount(&invoice);
        if invoice.is_cancelled() || pending <= PAYMENT_EPSILON {
            debug!(invoice_id = %invoice_id, pending, "batch payment: nothing pending, skipping");
            outcome.skipped.push(invoice_id.clone());
            continue;
        }

        let amount = money::from_usd(pending, template.currency, invoice.rate());
        let input = PaymentInput {
            amount,
            currency: template.currency,
            method: template.method,
            reference: template.reference.clone(),
            credit_offset_usd: None,
        };

        outcome.attempted += 1;
        match recorder.record_payment(invoice_id, &input) {
            Ok(payment) => {
                outcome.success_count += 1;
                total += money::to_decimal(payment.amount_usd);
            }
            Err(e) => {
                warn!(invoice_id = %invoice_id, error = %e, "batch payment: payment failed");
                outcome.failures.push(BatchFailure {
                    invoice_id: invoice_id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    outcome.total_paid_usd = money::to_f64(total);
    info!(
        attempted = outcome.attempted,
        succeeded = outcome.success_count,
        skipped = outcome.skipped.len(),
        failed = outcome.failures.len(),
        "batch payment finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::apply_payment;
    use crate::models::{InvoiceItem, InvoiceStatus, PaymentState};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory recorder that fails for chosen invoice IDs.
    struct FakeRecorder {
        invoices: RefCell<HashMap<String, Invoice>>,
        fail_for: Vec<String>,
        recorded: RefCell<Vec<String>>,
    }

    impl FakeRecorder {
        fn new(invoices: Vec<Invoice>, fail_for: Vec<String>) -> Self {
            Self {
                invoices: RefCell::new(invoices.into_iter().map(|i| (i.id.clone(), i)).collect()),
                fail_for,
                recorded: RefCell::new(Vec::new()),
            }
        }
    }

    impl PaymentRecorder for FakeRecorder {
        type Error = String;

        fn load_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>, String> {
            Ok(self.invoices.borrow().get(invoice_id).cloned())
        }

        fn record_payment(&self, invoice_id: &str, input: &PaymentInput) -> Result<Payment, String> {
            if self.fail_for.iter().any(|id| id == invoice_id) {
                return Err("network error".to_string());
            }
            let mut invoices = self.invoices.borrow_mut();
            let invoice = invoices.get_mut(invoice_id).ok_or("missing")?;
            let app = apply_payment(invoice, input).map_err(|e| e.to_string())?;
            app.apply_to(invoice);
            self.recorded.borrow_mut().push(invoice_id.to_string());
            Ok(Payment {
                id: uuid::Uuid::new_v4().to_string(),
                invoice_id: invoice_id.to_string(),
                amount: app.applied_amount,
                currency: input.currency,
                exchange_rate: app.exchange_rate,
                amount_usd: app.applied_usd,
                method: input.method,
                reference: input.reference.clone(),
                status: PaymentState::Active,
                created_at: String::new(),
                cancelled_at: None,
                cancel_reason: None,
                surplus_usd: app.surplus_usd,
            })
        }
    }

    fn invoice(total: f64) -> Invoice {
        Invoice::from_items(
            "owner-1".into(),
            "F-1".into(),
            Currency::Usd,
            40.0,
            vec![InvoiceItem::new("Servicio".into(), 1.0, total)],
        )
    }

    #[test]
    fn test_pays_every_pending_invoice() {
        let invoices = vec![invoice(10.0), invoice(20.0), invoice(30.0)];
        let ids: Vec<String> = invoices.iter().map(|i| i.id.clone()).collect();
        let recorder = FakeRecorder::new(invoices, vec![]);

        let outcome = pay_all(&recorder, &ids, &BatchPayment::new(Currency::Usd, PaymentMethod::Cash));

        assert_eq!(outcome.success_count, 3);
        assert!(outcome.is_complete_success());
        assert_eq!(outcome.total_paid_usd, 60.0);
        for id in &ids {
            let inv = recorder.load_invoice(id).unwrap().unwrap();
            assert_eq!(inv.payment_status, InvoiceStatus::Pagado);
        }
    }

    #[test]
    fn test_failure_does_not_roll_back_others() {
        let invoices = vec![invoice(10.0), invoice(20.0), invoice(30.0), invoice(40.0)];
        let ids: Vec<String> = invoices.iter().map(|i| i.id.clone()).collect();
        let recorder = FakeRecorder::new(invoices, vec![ids[1].clone()]);

        let outcome = pay_all(&recorder, &ids, &BatchPayment::new(Currency::Bs, PaymentMethod::Transfer));

        assert_eq!(outcome.attempted, 4);
        assert_eq!(outcome.success_count, 3);
        assert!(outcome.is_partial());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].invoice_id, ids[1]);

        let failed = recorder.load_invoice(&ids[1]).unwrap().unwrap();
        assert_eq!(failed.payment_status, InvoiceStatus::Pendiente);
        let paid = recorder.load_invoice(&ids[3]).unwrap().unwrap();
        assert_eq!(paid.payment_status, InvoiceStatus::Pagado);
        assert_eq!(paid.amount_paid_bs, 1600.0);
    }

    #[test]
    fn test_skips_settled_and_cancelled() {
        let mut settled = invoice(10.0);
        settled.amount_paid_usd = 10.0;
        settled.payment_status = InvoiceStatus::Pagado;
        let mut cancelled = invoice(10.0);
        cancelled.payment_status = InvoiceStatus::Cancelado;
        let open = invoice(5.0);

        let ids = vec![settled.id.clone(), cancelled.id.clone(), open.id.clone()];
        let recorder = FakeRecorder::new(vec![settled, cancelled, open], vec![]);

        let outcome = pay_all(&recorder, &ids, &BatchPayment::new(Currency::Usd, PaymentMethod::Cash));
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(*recorder.recorded.borrow(), vec![ids[2].clone()]);
    }

    #[test]
    fn test_unknown_invoice_is_a_failure() {
        let recorder = FakeRecorder::new(vec![invoice(5.0)], vec![]);
        let ids = vec!["nope".to_string()];
        let outcome = pay_all(&recorder, &ids, &BatchPayment::new(Currency::Usd, PaymentMethod::Cash));
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.is_partial());
    }
}
