//! Currency handling and precise money arithmetic.
//!
//! Amounts are stored as `f64` but every calculation goes through
//! `rust_decimal::Decimal` and is rounded back on the way out.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Tolerance for "fully paid" comparisons, in USD.
pub const PAYMENT_EPSILON: f64 = 0.001;

/// Decimal places kept for stored running sums.
const STORED_PLACES: u32 = 4;

/// Decimal places used for display.
const DISPLAY_PLACES: u32 = 2;

/// Maximum amount accepted for a single payment or line, in its own currency.
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Invoice/payment currency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    /// Local currency (bolívares)
    #[serde(rename = "Bs")]
    Bs,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Bs => "Bs",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a currency label is not recognised.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown currency: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" | "$" => Ok(Currency::Usd),
            "BS" | "VES" | "BS." => Ok(Currency::Bs),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// Money validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoneyError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: String, value: f64 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: String, value: f64 },

    #[error("{field} exceeds maximum allowed ({max}), got {value}")]
    TooLarge { field: String, value: f64, max: f64 },
}

/// Treat a missing, zero, negative or non-finite exchange rate as 1.
pub fn normalize_rate(rate: Option<f64>) -> f64 {
    match rate {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => 1.0,
    }
}

/// Convert f64 to Decimal for calculation.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage (4 decimal places).
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(STORED_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round for display (2 decimal places, half away from zero).
pub fn round_display(value: f64) -> f64 {
    to_decimal(value)
        .round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Format an amount with two decimals and the currency label.
pub fn format_amount(value: f64, currency: Currency) -> String {
    match currency {
        Currency::Usd => format!("${:.2}", round_display(value)),
        Currency::Bs => format!("Bs {:.2}", round_display(value)),
    }
}

/// Convert an amount in `currency` to USD using a Bs-per-USD rate.
pub fn to_usd(amount: f64, currency: Currency, rate: f64) -> f64 {
    to_f64(to_usd_decimal(amount, currency, rate))
}

pub(crate) fn to_usd_decimal(amount: f64, currency: Currency, rate: f64) -> Decimal {
    match currency {
        Currency::Usd => to_decimal(amount),
        Currency::Bs => to_decimal(amount) / to_decimal(normalize_rate(Some(rate))),
    }
}

/// Convert a USD amount into `currency` using a Bs-per-USD rate.
pub fn from_usd(usd: f64, currency: Currency, rate: f64) -> f64 {
    match currency {
        Currency::Usd => to_f64(to_decimal(usd)),
        Currency::Bs => to_f64(to_decimal(usd) * to_decimal(normalize_rate(Some(rate)))),
    }
}

/// Validate a user-entered amount (finite, positive, bounded).
pub fn validate_amount(value: f64, field: &str) -> Result<(), MoneyError> {
    if !value.is_finite() {
        return Err(MoneyError::NotFinite {
            field: field.to_string(),
            value,
        });
    }
    if value <= 0.0 {
        return Err(MoneyError::NotPositive {
            field: field.to_string(),
            value,
        });
    }
    if value > MAX_AMOUNT {
        return Err(MoneyError::TooLarge {
            field: field.to_string(),
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}
