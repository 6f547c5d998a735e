use crate::config::PaymentConfig;
use crate::domain::payment::{Outcome, PaymentRequest, mask_card_number};
use crate::domain::ports::{Clock, SystemClock, TransactionStoreBox};
use crate::domain::receipt::{Receipt, ReceiptIdSource, UuidReceiptIds, derive_receipt};
use crate::domain::transaction::{
    PaymentStatus, ReferenceId, Transaction, TransactionOutcome,
};
use crate::error::{ParkingError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

const FALLBACK_FAILURE: &str = "Payment failed";

/// The write-once log of payment attempts.
///
/// [`record`](Self::record) is the only write path. Receipts are never stored
/// on their own; they are rebuilt from the transaction row on every read.
pub struct TransactionLedger {
    store: TransactionStoreBox,
    config: PaymentConfig,
    clock: Arc<dyn Clock>,
    receipt_ids: Arc<dyn ReceiptIdSource>,
}

impl TransactionLedger {
    pub fn new(store: TransactionStoreBox, config: PaymentConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            receipt_ids: Arc::new(UuidReceiptIds),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_receipt_ids(mut self, receipt_ids: Arc<dyn ReceiptIdSource>) -> Self {
        self.receipt_ids = receipt_ids;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn record(&self, request: &PaymentRequest, outcome: Outcome) -> Result<Transaction> {
        let transaction_id = Uuid::new_v4();
        let timestamp = self.clock.now();

        let outcome = match outcome.status {
            PaymentStatus::Success => {
                let receipt = derive_receipt(
                    request,
                    transaction_id,
                    timestamp,
                    self.receipt_ids.as_ref(),
                    &self.config,
                );
                TransactionOutcome::Success(receipt.details())
            }
            PaymentStatus::Failed => TransactionOutcome::Failed {
                error_message: outcome
                    .error_message
                    .unwrap_or_else(|| FALLBACK_FAILURE.to_string()),
            },
        };

        let tx = Transaction {
            transaction_id,
            reference_id: request.reference_id,
            amount: request.amount,
            timestamp,
            payment_method: self.config.payment_method_for(request),
            masked_card_number: mask_card_number(&request.card_number),
            outcome,
        };
        self.store.insert(tx.clone()).await?;

        tracing::info!(
            transaction_id = %tx.transaction_id,
            reference_id = tx.reference_id,
            status = %tx.status(),
            "recorded transaction"
        );
        Ok(tx)
    }

    pub async fn get(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.store
            .get(transaction_id)
            .await?
            .ok_or(ParkingError::TransactionNotFound(transaction_id))
    }

    pub async fn list_all(&self) -> Result<Vec<Transaction>> {
        self.store.get_all().await
    }

    pub async fn list_by_reference(&self, reference_id: ReferenceId) -> Result<Vec<Transaction>> {
        self.store.get_by_reference(reference_id).await
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Transaction>> {
        let mut transactions = self.store.get_all().await?;
        transactions.retain(|tx| tx.status() == status);
        Ok(transactions)
    }

    pub async fn find_by_receipt(&self, receipt_id: &str) -> Result<Option<Transaction>> {
        let transactions = self.store.get_all().await?;
        Ok(transactions.into_iter().find(|tx| {
            tx.receipt_details()
                .is_some_and(|details| details.receipt_id == receipt_id)
        }))
    }

    pub async fn receipt(&self, transaction_id: Uuid) -> Result<Receipt> {
        let tx = self.get(transaction_id).await?;
        Receipt::from_transaction(&tx).ok_or(ParkingError::ReceiptUnavailable {
            transaction_id,
            status: tx.status(),
        })
    }
}
