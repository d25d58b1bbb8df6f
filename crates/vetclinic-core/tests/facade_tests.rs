//! Tests for the FFI-facing API.

use vetclinic_core::{open_database_in_memory, DifferentialSession, FfiInvoiceLine, FfiPaymentInput, VetClinicError};

fn line(description: &str, unit_cost: f64) -> FfiInvoiceLine {
    FfiInvoiceLine {
        description: description.to_string(),
        quantity: 1.0,
        unit_cost,
        catalog_item_id: None,
    }
}

#[test]
fn test_invoice_lifecycle() {
    let core = open_database_in_memory().unwrap();
    core.set_exchange_rate(40.0).unwrap();

    let owner = core
        .create_owner("Elena Torres".to_string(), Some("V-8765432".to_string()), None)
        .unwrap();
    let patient = core
        .create_patient(owner.id.clone(), "Luna".to_string(), "feline".to_string())
        .unwrap();

    let invoice = core
        .create_invoice(
            owner.id.clone(),
            Some(patient.id.clone()),
            "USD".to_string(),
            vec![line("Consulta", 60.0), line("Vacuna triple felina", 40.0)],
        )
        .unwrap();
    assert_eq!(invoice.number, "F-000001");
    assert_eq!(invoice.total, 100.0);
    assert_eq!(invoice.exchange_rate, 40.0);

    let receipt = core
        .pay_invoice(
            invoice.id.clone(),
            FfiPaymentInput {
                amount: 60.0,
                currency: "Bs".to_string(),
                method: "mobile_payment".to_string(),
                reference: None,
                credit_offset_usd: None,
            },
        )
        .unwrap();
    assert_eq!(receipt.invoice.payment_status, "Parcial");

    let summary = core.invoice_summary(invoice.id.clone()).unwrap();
    assert_eq!(summary.pending_usd, 98.5);
    assert_eq!(core.owner_balance(owner.id.clone()).unwrap(), 98.5);

    let invoice = core
        .cancel_payment(receipt.payments[0].id.clone(), Some("error de caja".to_string()))
        .unwrap();
    assert_eq!(invoice.payment_status, "Pendiente");

    let html = core.render_invoice_html(invoice.id.clone()).unwrap();
    assert!(html.contains("Elena Torres"));
    assert!(html.contains("F-000001"));
}

#[test]
fn test_pay_all_for_owner() {
    let core = open_database_in_memory().unwrap();
    let owner = core.create_owner("Ana".to_string(), None, None).unwrap();
    for cost in [10.0, 20.0, 30.0] {
        core.create_invoice(owner.id.clone(), None, "USD".to_string(), vec![line("Baño", cost)])
            .unwrap();
    }

    let outcome = core
        .pay_all_for_owner(owner.id.clone(), "USD".to_string(), "cash".to_string(), None)
        .unwrap();
    assert_eq!(outcome.success_count, 3);
    assert!(!outcome.is_partial);
    assert_eq!(outcome.total_paid_usd, 60.0);
    assert_eq!(core.owner_balance(owner.id).unwrap(), 0.0);
}

#[test]
fn test_cancelled_invoice_rejects_payment() {
    let core = open_database_in_memory().unwrap();
    let owner = core.create_owner("Ana".to_string(), None, None).unwrap();
    let invoice = core
        .create_invoice(owner.id, None, "USD".to_string(), vec![line("Consulta", 25.0)])
        .unwrap();
    assert!(core.cancel_invoice(invoice.id.clone()).unwrap());

    let result = core.pay_invoice(
        invoice.id,
        FfiPaymentInput {
            amount: 25.0,
            currency: "USD".to_string(),
            method: "cash".to_string(),
            reference: None,
            credit_offset_usd: None,
        },
    );
    assert!(matches!(result, Err(VetClinicError::PaymentRejected(_))));
}

#[test]
fn test_invalid_currency_rejected() {
    let core = open_database_in_memory().unwrap();
    let owner = core.create_owner("Ana".to_string(), None, None).unwrap();
    let result = core.create_invoice(owner.id, None, "EUR".to_string(), vec![line("Consulta", 25.0)]);
    assert!(matches!(result, Err(VetClinicError::InvalidInput(_))));
}

#[test]
fn test_csv_export_has_bom() {
    let core = open_database_in_memory().unwrap();
    let owner = core.create_owner("Ana".to_string(), None, None).unwrap();
    let invoice = core
        .create_invoice(owner.id, None, "USD".to_string(), vec![line("Consulta", 25.0)])
        .unwrap();

    let csv = core
        .export_invoice_report_csv(invoice.issued_at.clone(), invoice.issued_at.clone())
        .unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains("\"Pendiente\""));
}

#[test]
fn test_differential_session() {
    let session = DifferentialSession::new();
    for _ in 0..70 {
        session.increment("neutrophils".to_string()).unwrap();
    }
    for _ in 0..30 {
        session.increment("lymphocytes".to_string()).unwrap();
    }

    assert!(matches!(
        session.increment("monocytes".to_string()),
        Err(VetClinicError::InvalidInput(_))
    ));
    assert!(matches!(
        session.increment("platelets".to_string()),
        Err(VetClinicError::InvalidInput(_))
    ));

    let values = session.cell_values(Some(10.0)).unwrap();
    let neutrophils = values.iter().find(|v| v.cell == "neutrophils").unwrap();
    assert_eq!(neutrophils.percent, 70.0);
    assert_eq!(neutrophils.absolute, Some(7.0));

    assert!(session.undo().unwrap());
    assert!(!session.undo().unwrap());
    assert_eq!(session.counts().unwrap().lymphocytes, 29);

    session.reset().unwrap();
    assert_eq!(session.counts().unwrap().neutrophils, 0);
}
