use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the booking a payment settles.
pub type ReferenceId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Success => f.write_str("SUCCESS"),
            PaymentStatus::Failed => f.write_str("FAILED"),
        }
    }
}

/// Customer-facing fields stored on a successful transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDetails {
    pub receipt_id: String,
    pub paid_for: String,
    pub customer_name: String,
    pub merchant_info: String,
    pub remarks: String,
}

/// Terminal result of a payment attempt. Receipt fields exist only on
/// success and an error message only on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOutcome {
    Success(ReceiptDetails),
    Failed { error_message: String },
}

/// One recorded payment attempt. Written once by the ledger and never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub reference_id: ReferenceId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub payment_method: String,
    pub masked_card_number: String,
    pub outcome: TransactionOutcome,
}

impl Transaction {
    pub fn status(&self) -> PaymentStatus {
        match self.outcome {
            TransactionOutcome::Success(_) => PaymentStatus::Success,
            TransactionOutcome::Failed { .. } => PaymentStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == PaymentStatus::Success
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            TransactionOutcome::Failed { error_message } => Some(error_message),
            TransactionOutcome::Success(_) => None,
        }
    }

    pub fn receipt_details(&self) -> Option<&ReceiptDetails> {
        match &self.outcome {
            TransactionOutcome::Success(details) => Some(details),
            TransactionOutcome::Failed { .. } => None,
        }
    }
}
