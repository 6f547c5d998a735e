use crate::domain::transaction::{PaymentStatus, ReferenceId, Transaction};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TransactionRow<'a> {
    transaction_id: String,
    reference: ReferenceId,
    amount: Decimal,
    status: PaymentStatus,
    timestamp: String,
    method: &'a str,
    masked_card: &'a str,
    receipt_id: Option<&'a str>,
    error: Option<&'a str>,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id.to_string(),
            reference: tx.reference_id,
            amount: tx.amount,
            status: tx.status(),
            timestamp: tx.timestamp.to_rfc3339(),
            method: &tx.payment_method,
            masked_card: &tx.masked_card_number,
            receipt_id: tx.receipt_details().map(|d| d.receipt_id.as_str()),
            error: tx.error_message(),
        }
    }
}

/// Writes recorded transactions as flat CSV rows.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transaction(&mut self, tx: &Transaction) -> Result<()> {
        self.writer.serialize(TransactionRow::from(tx))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
