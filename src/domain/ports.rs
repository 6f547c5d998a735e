use super::space::{NewSpace, ParkingSpace, SpaceId, SpacePatch, SpaceStatus};
use super::transaction::{ReferenceId, Transaction};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSwap {
    /// The expected status held and the new one was written.
    Applied(ParkingSpace),
    /// The space was in another status; nothing was written.
    Rejected(ParkingSpace),
}

#[async_trait]
pub trait SpaceStore: Send + Sync {
    async fn insert(&self, space: NewSpace) -> Result<ParkingSpace>;
    async fn get(&self, id: SpaceId) -> Result<Option<ParkingSpace>>;
    async fn get_all(&self) -> Result<Vec<ParkingSpace>>;
    /// Applies the patch under the space's lock. `None` if the id is unknown.
    async fn patch(&self, id: SpaceId, patch: &SpacePatch) -> Result<Option<ParkingSpace>>;
    /// Atomically writes `next` if the current status equals `expected`
    /// (or unconditionally when `expected` is `None`).
    async fn swap_status(
        &self,
        id: SpaceId,
        expected: Option<SpaceStatus>,
        next: SpaceStatus,
    ) -> Result<Option<StatusSwap>>;
    async fn remove(&self, id: SpaceId) -> Result<bool>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Fails with `DuplicateTransaction` if the id was already written.
    async fn insert(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, tx_id: Uuid) -> Result<Option<Transaction>>;
    async fn get_all(&self) -> Result<Vec<Transaction>>;
    async fn get_by_reference(&self, reference_id: ReferenceId) -> Result<Vec<Transaction>>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type SpaceStoreBox = Box<dyn SpaceStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
