use super::ledger::TransactionLedger;
use crate::domain::payment::{PaymentRequest, check_intake, decide, validate};
use crate::domain::receipt::Receipt;
use crate::domain::transaction::{PaymentStatus, ReferenceId, Transaction};
use crate::error::Result;
use uuid::Uuid;

/// Entry point for payments.
///
/// `process_payment` runs intake checks, the simulated card validation and
/// the outcome decision, then records the attempt. A declined payment is
/// returned as a `FAILED` transaction, not as an error; only malformed
/// requests and storage problems surface as `Err`.
pub struct PaymentService {
    ledger: TransactionLedger,
}

impl PaymentService {
    pub fn new(ledger: TransactionLedger) -> Self {
        Self { ledger }
    }

    pub async fn process_payment(&self, request: PaymentRequest) -> Result<Transaction> {
        if let Err(err) = check_intake(&request).and_then(|()| validate(&request, self.ledger.now()))
        {
            tracing::warn!(reference_id = request.reference_id, error = %err, "payment request rejected");
            return Err(err);
        }

        let outcome = decide(&request);
        self.ledger.record(&request, outcome).await
    }

    pub async fn transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.ledger.get(transaction_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Transaction>> {
        self.ledger.list_all().await
    }

    pub async fn list_by_reference(&self, reference_id: ReferenceId) -> Result<Vec<Transaction>> {
        self.ledger.list_by_reference(reference_id).await
    }

    pub async fn list_by_status(&self, status: PaymentStatus) -> Result<Vec<Transaction>> {
        self.ledger.list_by_status(status).await
    }

    pub async fn find_by_receipt(&self, receipt_id: &str) -> Result<Option<Transaction>> {
        self.ledger.find_by_receipt(receipt_id).await
    }

    pub async fn receipt(&self, transaction_id: Uuid) -> Result<Receipt> {
        self.ledger.receipt(transaction_id).await
    }
}
