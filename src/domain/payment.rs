use super::transaction::{PaymentStatus, ReferenceId};
use crate::error::{ParkingError, Result};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::sync::LazyLock;

pub const DEFAULT_PAYMENT_METHOD: &str = "CARD";
/// Amounts strictly above this are declined by the simulated gateway.
pub const AMOUNT_LIMIT: Decimal = dec!(10000.00);
pub const DECLINED_CVV: &str = "000";
pub const DECLINE_MESSAGE: &str = "Payment simulation failed: Invalid CVV or Amount exceeds limit.";

const CARD_MASK: &str = "XXXX-XXXX-XXXX-";

static SIMULATION_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{16}$").expect("valid card pattern"));
static BRAND_CARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:4\d{12}(?:\d{3})?|5[1-5]\d{14}|3[47]\d{13}|6(?:011|5\d{2})\d{12})$")
        .expect("valid brand pattern")
});
static EXPIRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/(\d{2})$").expect("valid expiry pattern"));
static CVV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid cvv pattern"));

/// A request to pay for a booking. Never persisted as such.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "reference")]
    pub reference_id: ReferenceId,
    #[serde(deserialize_with = "exact_decimal")]
    pub amount: Decimal,
    #[serde(rename = "holder")]
    pub card_holder_name: String,
    #[serde(rename = "card")]
    pub card_number: String,
    #[serde(rename = "expiry")]
    pub expiry_date: String,
    pub cvv: String,
    #[serde(rename = "method", default, deserialize_with = "empty_as_none")]
    pub payment_method: Option<String>,
}

/// Parses the amount from its text, keeping the written scale.
fn exact_decimal<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Decimal::from_str_exact(text.trim()).map_err(serde::de::Error::custom)
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Gateway decision for a request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: PaymentStatus,
    pub error_message: Option<String>,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            status: PaymentStatus::Success,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Failed,
            error_message: Some(message.into()),
        }
    }
}

fn invalid(reason: &str) -> ParkingError {
    ParkingError::InvalidRequest(reason.to_string())
}

/// Boundary checks on the shape of a request.
///
/// Accepts any supported card brand, so a 15 digit American Express number
/// passes here and is then rejected by [`validate`], which only simulates
/// 16 digit cards.
pub fn check_intake(request: &PaymentRequest) -> Result<()> {
    if request.amount < Decimal::ZERO {
        return Err(invalid("Amount must be positive"));
    }
    if request.card_holder_name.trim().is_empty() {
        return Err(invalid("Card holder name is required"));
    }
    if !BRAND_CARD.is_match(&request.card_number) {
        return Err(invalid("Invalid card number format"));
    }
    if !EXPIRY.is_match(&request.expiry_date) {
        return Err(invalid("Invalid expiry date format. Use MM/YY"));
    }
    if !CVV.is_match(&request.cvv) {
        return Err(invalid("Invalid CVV format"));
    }
    Ok(())
}

/// Simulated card validation, evaluated in order against `now`.
pub fn validate(request: &PaymentRequest, now: DateTime<Utc>) -> Result<()> {
    if !SIMULATION_CARD.is_match(&request.card_number) {
        return Err(invalid("Invalid card number format"));
    }

    let (month, year) = parse_expiry(&request.expiry_date)
        .ok_or_else(|| invalid("Invalid expiry date format. Use MM/YY"))?;
    if (year, month) < (now.year(), now.month()) {
        return Err(invalid("Card expired"));
    }

    if !CVV.is_match(&request.cvv) {
        return Err(invalid("Invalid CVV format"));
    }
    Ok(())
}

/// Returns `(month, 2000 + yy)`.
fn parse_expiry(expiry: &str) -> Option<(u32, i32)> {
    let (month, year) = expiry.split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, 2000 + year))
}

pub fn decide(request: &PaymentRequest) -> Outcome {
    if request.cvv == DECLINED_CVV || request.amount > AMOUNT_LIMIT {
        Outcome::failed(DECLINE_MESSAGE)
    } else {
        Outcome::success()
    }
}

/// Keeps the last four characters behind a fixed mask. Inputs of four
/// characters or fewer are returned unchanged.
pub fn mask_card_number(card_number: &str) -> String {
    let len = card_number.chars().count();
    if len <= 4 {
        return card_number.to_string();
    }
    let last_four: String = card_number.chars().skip(len - 4).collect();
    format!("{CARD_MASK}{last_four}")
}
