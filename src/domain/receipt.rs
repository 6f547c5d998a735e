use super::payment::PaymentRequest;
use super::transaction::{ReceiptDetails, Transaction, TransactionOutcome};
use crate::config::PaymentConfig;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub const RECEIPT_PREFIX: &str = "RECEIPT-";
const TOKEN_LEN: usize = 12;

/// Source of the random part of a receipt id.
pub trait ReceiptIdSource: Send + Sync {
    fn next_token(&self) -> String;
}

/// Takes the first hex digits of a fresh v4 UUID, uppercased.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidReceiptIds;

impl ReceiptIdSource for UuidReceiptIds {
    fn next_token(&self) -> String {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(TOKEN_LEN);
        token.to_ascii_uppercase()
    }
}

/// Read-only view of a successful payment, rebuilt from its transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub receipt_id: String,
    pub transaction_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub amount: Decimal,
    pub paid_for: String,
    pub customer_name: String,
    pub payment_method: String,
    pub merchant_info: String,
    pub remarks: String,
}

impl Receipt {
    /// Returns `None` for failed transactions.
    pub fn from_transaction(tx: &Transaction) -> Option<Self> {
        let TransactionOutcome::Success(details) = &tx.outcome else {
            return None;
        };
        Some(Self {
            receipt_id: details.receipt_id.clone(),
            transaction_id: tx.transaction_id,
            issued_at: tx.timestamp,
            amount: tx.amount,
            paid_for: details.paid_for.clone(),
            customer_name: details.customer_name.clone(),
            payment_method: tx.payment_method.clone(),
            merchant_info: details.merchant_info.clone(),
            remarks: details.remarks.clone(),
        })
    }

    pub fn details(&self) -> ReceiptDetails {
        ReceiptDetails {
            receipt_id: self.receipt_id.clone(),
            paid_for: self.paid_for.clone(),
            customer_name: self.customer_name.clone(),
            merchant_info: self.merchant_info.clone(),
            remarks: self.remarks.clone(),
        }
    }
}

pub fn paid_for(request: &PaymentRequest) -> String {
    format!("Parking Fee for Booking #{}", request.reference_id)
}

/// Builds the receipt for a successful payment. The receipt id is the only
/// input not determined by the arguments.
pub fn derive_receipt(
    request: &PaymentRequest,
    transaction_id: Uuid,
    timestamp: DateTime<Utc>,
    ids: &dyn ReceiptIdSource,
    config: &PaymentConfig,
) -> Receipt {
    Receipt {
        receipt_id: format!("{RECEIPT_PREFIX}{}", ids.next_token()),
        transaction_id,
        issued_at: timestamp,
        amount: request.amount,
        paid_for: paid_for(request),
        customer_name: request.card_holder_name.clone(),
        payment_method: config.payment_method_for(request),
        merchant_info: config.merchant_info.clone(),
        remarks: config.remarks.clone(),
    }
}
