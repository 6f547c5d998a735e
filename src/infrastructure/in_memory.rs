use crate::domain::ports::{SpaceStore, StatusSwap, TransactionStore};
use crate::domain::space::{NewSpace, ParkingSpace, SpaceId, SpacePatch, SpaceStatus};
use crate::domain::transaction::{ReferenceId, Transaction};
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

type SpaceCell = Arc<Mutex<ParkingSpace>>;

/// A thread-safe in-memory store for parking spaces.
///
/// Each space sits behind its own `Mutex`, so status changes on one id never
/// wait on another. The outer `RwLock` is taken for writing only to add or
/// remove spaces.
#[derive(Default, Clone)]
pub struct InMemorySpaceStore {
    spaces: Arc<RwLock<HashMap<SpaceId, SpaceCell>>>,
    last_id: Arc<AtomicU64>,
}

impl InMemorySpaceStore {
    /// Creates a new, empty in-memory space store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpaceStore for InMemorySpaceStore {
    async fn insert(&self, space: NewSpace) -> Result<ParkingSpace> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let space = space.into_space(id);
        let mut spaces = self.spaces.write().await;
        spaces.insert(id, Arc::new(Mutex::new(space.clone())));
        Ok(space)
    }

    async fn get(&self, id: SpaceId) -> Result<Option<ParkingSpace>> {
        let spaces = self.spaces.read().await;
        match spaces.get(&id) {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<ParkingSpace>> {
        let spaces = self.spaces.read().await;
        let mut all = Vec::with_capacity(spaces.len());
        for cell in spaces.values() {
            all.push(cell.lock().await.clone());
        }
        all.sort_by_key(|space| space.id);
        Ok(all)
    }

    async fn patch(&self, id: SpaceId, patch: &SpacePatch) -> Result<Option<ParkingSpace>> {
        let spaces = self.spaces.read().await;
        let Some(cell) = spaces.get(&id) else {
            return Ok(None);
        };
        let mut space = cell.lock().await;
        patch.apply_to(&mut space);
        Ok(Some(space.clone()))
    }

    async fn swap_status(
        &self,
        id: SpaceId,
        expected: Option<SpaceStatus>,
        next: SpaceStatus,
    ) -> Result<Option<StatusSwap>> {
        // Holding the read guard keeps `remove` out until the swap is done.
        let spaces = self.spaces.read().await;
        let Some(cell) = spaces.get(&id) else {
            return Ok(None);
        };
        let mut space = cell.lock().await;
        if expected.is_some_and(|expected| space.status != expected) {
            return Ok(Some(StatusSwap::Rejected(space.clone())));
        }
        space.status = next;
        Ok(Some(StatusSwap::Applied(space.clone())))
    }

    async fn remove(&self, id: SpaceId) -> Result<bool> {
        let mut spaces = self.spaces.write().await;
        Ok(spaces.remove(&id).is_some())
    }
}

#[derive(Default)]
struct LedgerTables {
    transactions: HashMap<Uuid, Transaction>,
    by_reference: HashMap<ReferenceId, Vec<Uuid>>,
}

/// A thread-safe in-memory transaction ledger with a reference index.
///
/// Rows and index entries are updated under one write lock, so readers never
/// see a transaction without its index entry.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    tables: Arc<RwLock<LedgerTables>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.transactions.contains_key(&tx.transaction_id) {
            return Err(ParkingError::DuplicateTransaction(tx.transaction_id));
        }
        tables
            .by_reference
            .entry(tx.reference_id)
            .or_default()
            .push(tx.transaction_id);
        tables.transactions.insert(tx.transaction_id, tx);
        Ok(())
    }

    async fn get(&self, tx_id: Uuid) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables.transactions.get(&tx_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut all: Vec<Transaction> = tables.transactions.values().cloned().collect();
        all.sort_by_key(|tx| tx.timestamp);
        Ok(all)
    }

    async fn get_by_reference(&self, reference_id: ReferenceId) -> Result<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let Some(ids) = tables.by_reference.get(&reference_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| tables.transactions.get(id).cloned())
            .collect())
    }
}
