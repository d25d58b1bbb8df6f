//! Income and balance summaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::billing::pending_amount;
use crate::models::{Invoice, InvoiceStatus, Payment};
use crate::money;

/// Income received on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyIncome {
    /// YYYY-MM-DD
    pub date: String,
    pub usd: f64,
    pub payment_count: usize,
}

/// Daily income in USD equivalent for every day of `[from, to]`.
///
/// Days without payments are included with zero. Cancelled payments and
/// payments with an unparseable date are ignored. An inverted range is empty.
pub fn bucket_by_day(payments: &[Payment], from: NaiveDate, to: NaiveDate) -> Vec<DailyIncome> {
    let mut buckets: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for day in from.iter_days().take_while(|d| *d <= to) {
        buckets.insert(day, (Decimal::ZERO, 0));
    }

    for payment in payments.iter().filter(|p| p.is_active()) {
        let Some(day) = payment_day(&payment.created_at) else {
            continue;
        };
        if let Some((sum, count)) = buckets.get_mut(&day) {
            *sum += money::to_decimal(payment.amount_usd);
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(day, (sum, count))| DailyIncome {
            date: day.format("%Y-%m-%d").to_string(),
            usd: money::to_f64(sum),
            payment_count: count,
        })
        .collect()
}

fn payment_day(created_at: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(created_at.get(..10)?, "%Y-%m-%d").ok()
}

/// Invoice count and pending amount for one status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusBreakdown {
    pub status: InvoiceStatus,
    pub count: usize,
    pub pending_usd: f64,
}

/// Count and pending USD per status, in status order. Cancelled invoices owe nothing.
pub fn status_breakdown(invoices: &[Invoice]) -> Vec<StatusBreakdown> {
    [
        InvoiceStatus::Pendiente,
        InvoiceStatus::Parcial,
        InvoiceStatus::Pagado,
        InvoiceStatus::Cancelado,
    ]
    .into_iter()
    .map(|status| {
        let matching = invoices.iter().filter(|i| i.payment_status == status);
        let (count, pending) = matching.fold((0, Decimal::ZERO), |(count, sum), invoice| {
            (count + 1, sum + money::to_decimal(open_pending(invoice)))
        });
        StatusBreakdown {
            status,
            count,
            pending_usd: money::to_f64(pending),
        }
    })
    .collect()
}

/// Total still owed across `invoices`, in USD.
pub fn owner_balance(invoices: &[Invoice]) -> f64 {
    let total = invoices
        .iter()
        .map(|invoice| money::to_decimal(open_pending(invoice)))
        .sum();
    money::to_f64(total)
}

fn open_pending(invoice: &Invoice) -> f64 {
    if invoice.is_cancelled() {
        0.0
    } else {
        pending_amount(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceItem, PaymentMethod, PaymentState};
    use crate::money::Currency;

    fn payment(created_at: &str, amount_usd: f64, status: PaymentState) -> Payment {
        Payment {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_id: "inv".into(),
            amount: amount_usd,
            currency: Currency::Usd,
            exchange_rate: 1.0,
            amount_usd,
            method: PaymentMethod::Cash,
            reference: None,
            status,
            created_at: created_at.into(),
            cancelled_at: None,
            cancel_reason: None,
            surplus_usd: 0.0,
        }
    }

    fn invoice(total: f64, paid: f64, status: InvoiceStatus) -> Invoice {
        let mut invoice = Invoice::from_items(
            "owner".into(),
            "F-1".into(),
            Currency::Usd,
            1.0,
            vec![InvoiceItem::new("Consulta".into(), 1.0, total)],
        );
        invoice.amount_paid_usd = paid;
        invoice.payment_status = status;
        invoice
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_bucket_by_day() {
        let payments = vec![
            payment("2024-06-01T09:00:00+00:00", 10.0, PaymentState::Active),
            payment("2024-06-01T15:30:00+00:00", 2.5, PaymentState::Active),
            payment("2024-06-03T10:00:00+00:00", 7.0, PaymentState::Active),
            payment("2024-06-03T11:00:00+00:00", 99.0, PaymentState::Cancelled),
            payment("2024-06-09T10:00:00+00:00", 50.0, PaymentState::Active),
            payment("garbage", 1.0, PaymentState::Active),
        ];

        let days = bucket_by_day(&payments, date("2024-06-01"), date("2024-06-03"));
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].usd, 12.5);
        assert_eq!(days[0].payment_count, 2);
        assert_eq!(days[1].usd, 0.0);
        assert_eq!(days[2].date, "2024-06-03");
        assert_eq!(days[2].usd, 7.0);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(bucket_by_day(&[], date("2024-06-05"), date("2024-06-01")).is_empty());
    }

    #[test]
    fn test_status_breakdown() {
        let invoices = vec![
            invoice(10.0, 0.0, InvoiceStatus::Pendiente),
            invoice(20.0, 5.0, InvoiceStatus::Parcial),
            invoice(30.0, 10.0, InvoiceStatus::Parcial),
            invoice(40.0, 40.0, InvoiceStatus::Pagado),
            invoice(50.0, 0.0, InvoiceStatus::Cancelado),
        ];

        let breakdown = status_breakdown(&invoices);
        assert_eq!(breakdown.len(), 4);
        assert_eq!(breakdown[0].count, 1);
        assert_eq!(breakdown[0].pending_usd, 10.0);
        assert_eq!(breakdown[1].count, 2);
        assert_eq!(breakdown[1].pending_usd, 35.0);
        assert_eq!(breakdown[2].pending_usd, 0.0);
        assert_eq!(breakdown[3].count, 1);
        assert_eq!(breakdown[3].pending_usd, 0.0);

        assert_eq!(owner_balance(&invoices), 45.0);
    }
}
