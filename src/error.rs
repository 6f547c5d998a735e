use crate::domain::space::SpaceId;
use crate::domain::transaction::PaymentStatus;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ParkingError>;

#[derive(Error, Debug)]
pub enum ParkingError {
    #[error("Parking space {0} not found")]
    SpaceNotFound(SpaceId),
    #[error("Transaction {0} not found")]
    TransactionNotFound(Uuid),
    #[error("Parking space {0} is already occupied")]
    AlreadyOccupied(SpaceId),
    #[error("Parking space {0} is already available")]
    AlreadyAvailable(SpaceId),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Receipt not available for transaction {transaction_id} (status: {status})")]
    ReceiptUnavailable {
        transaction_id: Uuid,
        status: PaymentStatus,
    },
    #[error("Invalid status value: {0:?}")]
    InvalidStatusValue(String),
    #[error("Transaction {0} already recorded")]
    DuplicateTransaction(Uuid),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ParkingError {
    fn from(err: rocksdb::Error) -> Self {
        ParkingError::Storage(err.into_string())
    }
}
