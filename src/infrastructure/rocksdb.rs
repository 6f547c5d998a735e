use crate::domain::ports::{SpaceStore, StatusSwap, TransactionStore};
use crate::domain::space::{NewSpace, ParkingSpace, SpaceId, SpacePatch, SpaceStatus};
use crate::domain::transaction::{ReferenceId, Transaction};
use crate::error::{ParkingError, Result};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as KeyLock;
use uuid::Uuid;

/// Column Family for storing parking spaces, keyed by big-endian id.
pub const CF_SPACES: &str = "spaces";
/// Column Family for storing transactions, keyed by UUID bytes.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Secondary index: `reference_id (BE) ++ transaction_id` with empty values.
pub const CF_TRANSACTIONS_BY_REFERENCE: &str = "transactions_by_reference";
/// Store bookkeeping, currently the highest space id ever allocated.
pub const CF_META: &str = "meta";

const LAST_SPACE_ID_KEY: &[u8] = b"last_space_id";

/// A persistent store implementation using RocksDB.
///
/// Holds spaces and transactions in separate Column Families. Status
/// changes on a space are read-check-write sequences guarded by a lock per
/// space id, and a lock leaves the table once nobody holds it. A space row and
/// the id high-water mark, like a transaction row and its index entry, go in
/// one `WriteBatch`, so deleted ids are never handed out again.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    space_locks: Arc<Mutex<HashMap<SpaceId, Arc<KeyLock<()>>>>>,
    last_space_id: Arc<KeyLock<SpaceId>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist and resumes space id
    /// allocation after the persisted high-water mark.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_SPACES, CF_TRANSACTIONS, CF_TRANSACTIONS_BY_REFERENCE, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        let last_space_id = last_space_id(&db)?;
        tracing::debug!(last_space_id, "opened rocksdb store");

        Ok(Self {
            db: Arc::new(db),
            space_locks: Arc::new(Mutex::new(HashMap::new())),
            last_space_id: Arc::new(KeyLock::new(last_space_id)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| ParkingError::Storage(format!("{name} column family not found")))
    }

    fn space_lock(&self, id: SpaceId) -> Result<Arc<KeyLock<()>>> {
        let mut locks = self
            .space_locks
            .lock()
            .map_err(|_| ParkingError::Storage("space lock table poisoned".to_string()))?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Drops `lock` from the table when the table and the caller are its
    /// only holders.
    fn evict_idle_lock(&self, id: SpaceId, lock: Arc<KeyLock<()>>) -> Result<()> {
        let mut locks = self
            .space_locks
            .lock()
            .map_err(|_| ParkingError::Storage("space lock table poisoned".to_string()))?;
        let idle = locks
            .get(&id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(&id);
        }
        Ok(())
    }

    async fn with_space_lock<T, F>(&self, id: SpaceId, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send,
        T: Send,
    {
        let lock = self.space_lock(id)?;
        let result = {
            let _guard = lock.lock().await;
            op()
        };
        self.evict_idle_lock(id, lock)?;
        result
    }

    fn read_space(&self, id: SpaceId) -> Result<Option<ParkingSpace>> {
        let cf = self.cf(CF_SPACES)?;
        match self.db.get_cf(&cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_space(&self, space: &ParkingSpace) -> Result<()> {
        let cf = self.cf(CF_SPACES)?;
        let value = serde_json::to_vec(space)?;
        self.db.put_cf(&cf, space.id.to_be_bytes(), value)?;
        Ok(())
    }

    fn read_transaction(&self, tx_id: Uuid) -> Result<Option<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        match self.db.get_cf(&cf, tx_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn last_space_id(db: &DB) -> Result<SpaceId> {
    let meta = db
        .cf_handle(CF_META)
        .ok_or_else(|| ParkingError::Storage("meta column family not found".to_string()))?;
    let high_water = match db.get_cf(&meta, LAST_SPACE_ID_KEY)? {
        Some(bytes) => decode_space_id(&bytes)?,
        None => 0,
    };

    // Stores written before the high-water mark existed only have their keys.
    let spaces = db
        .cf_handle(CF_SPACES)
        .ok_or_else(|| ParkingError::Storage("spaces column family not found".to_string()))?;
    let highest_key = match db.iterator_cf(&spaces, IteratorMode::End).next() {
        Some(item) => {
            let (key, _) = item?;
            decode_space_id(&key)?
        }
        None => 0,
    };
    Ok(high_water.max(highest_key))
}

fn decode_space_id(bytes: &[u8]) -> Result<SpaceId> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ParkingError::Storage("malformed space id".to_string()))?;
    Ok(SpaceId::from_be_bytes(bytes))
}

fn reference_key(reference_id: ReferenceId, tx_id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&reference_id.to_be_bytes());
    key.extend_from_slice(tx_id.as_bytes());
    key
}

#[async_trait]
impl SpaceStore for RocksDBStore {
    async fn insert(&self, space: NewSpace) -> Result<ParkingSpace> {
        let mut last_id = self.last_space_id.lock().await;
        let space = space.into_space(*last_id + 1);

        let cf = self.cf(CF_SPACES)?;
        let meta = self.cf(CF_META)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf, space.id.to_be_bytes(), serde_json::to_vec(&space)?);
        batch.put_cf(&meta, LAST_SPACE_ID_KEY, space.id.to_be_bytes());
        self.db.write(batch)?;

        *last_id = space.id;
        Ok(space)
    }

    async fn get(&self, id: SpaceId) -> Result<Option<ParkingSpace>> {
        self.read_space(id)
    }

    async fn get_all(&self) -> Result<Vec<ParkingSpace>> {
        let cf = self.cf(CF_SPACES)?;
        let mut spaces = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            spaces.push(serde_json::from_slice(&value)?);
        }
        Ok(spaces)
    }

    async fn patch(&self, id: SpaceId, patch: &SpacePatch) -> Result<Option<ParkingSpace>> {
        self.with_space_lock(id, || {
            let Some(mut space) = self.read_space(id)? else {
                return Ok(None);
            };
            patch.apply_to(&mut space);
            self.write_space(&space)?;
            Ok(Some(space))
        })
        .await
    }

    async fn swap_status(
        &self,
        id: SpaceId,
        expected: Option<SpaceStatus>,
        next: SpaceStatus,
    ) -> Result<Option<StatusSwap>> {
        self.with_space_lock(id, || {
            let Some(mut space) = self.read_space(id)? else {
                return Ok(None);
            };
            if expected.is_some_and(|expected| space.status != expected) {
                return Ok(Some(StatusSwap::Rejected(space)));
            }
            space.status = next;
            self.write_space(&space)?;
            Ok(Some(StatusSwap::Applied(space)))
        })
        .await
    }

    async fn remove(&self, id: SpaceId) -> Result<bool> {
        self.with_space_lock(id, || {
            if self.read_space(id)?.is_none() {
                return Ok(false);
            }
            let cf = self.cf(CF_SPACES)?;
            self.db.delete_cf(&cf, id.to_be_bytes())?;
            Ok(true)
        })
        .await
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let index = self.cf(CF_TRANSACTIONS_BY_REFERENCE)?;

        // Ids are fresh v4 UUIDs; this only trips on a caller replaying a row.
        if self.db.get_pinned_cf(&cf, tx.transaction_id.as_bytes())?.is_some() {
            return Err(ParkingError::DuplicateTransaction(tx.transaction_id));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf, tx.transaction_id.as_bytes(), serde_json::to_vec(&tx)?);
        batch.put_cf(&index, reference_key(tx.reference_id, tx.transaction_id), b"");
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, tx_id: Uuid) -> Result<Option<Transaction>> {
        self.read_transaction(tx_id)
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut transactions: Vec<Transaction> = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            transactions.push(serde_json::from_slice(&value)?);
        }
        transactions.sort_by_key(|tx| tx.timestamp);
        Ok(transactions)
    }

    async fn get_by_reference(&self, reference_id: ReferenceId) -> Result<Vec<Transaction>> {
        let index = self.cf(CF_TRANSACTIONS_BY_REFERENCE)?;
        let prefix = reference_id.to_be_bytes();

        let mut transactions = Vec::new();
        let iter = self
            .db
            .iterator_cf(&index, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let tx_id = Uuid::from_slice(&key[prefix.len()..])
                .map_err(|e| ParkingError::Storage(format!("malformed index key: {e}")))?;
            if let Some(tx) = self.read_transaction(tx_id)? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{ReceiptDetails, TransactionOutcome};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn transaction(reference_id: ReferenceId) -> Transaction {
        Transaction {
            transaction_id: Uuid::new_v4(),
            reference_id,
            amount: dec!(80.00),
            timestamp: Utc::now(),
            payment_method: "CARD".to_string(),
            masked_card_number: "XXXX-XXXX-XXXX-1111".to_string(),
            outcome: TransactionOutcome::Success(ReceiptDetails {
                receipt_id: "RECEIPT-0123456789AB".to_string(),
                paid_for: format!("Parking Fee for Booking #{reference_id}"),
                customer_name: "Kamal Silva".to_string(),
                merchant_info: "Smart Parking Management System".to_string(),
                remarks: "Thank you for your payment!".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_SPACES).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS_BY_REFERENCE).is_some());
        assert!(store.db.cf_handle(CF_META).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_space_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let space = SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
            .await
            .unwrap();
        assert_eq!(space.id, 1);

        let swap = store
            .swap_status(space.id, Some(SpaceStatus::Available), SpaceStatus::Occupied)
            .await
            .unwrap();
        assert!(matches!(swap, Some(StatusSwap::Applied(_))));

        let stored = SpaceStore::get(&store, space.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SpaceStatus::Occupied);
        assert_eq!(SpaceStore::get_all(&store).await.unwrap().len(), 1);

        assert!(store.remove(space.id).await.unwrap());
        assert!(SpaceStore::get(&store, space.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_space_ids_resume_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
                .await
                .unwrap();
            SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
                .await
                .unwrap();
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        let space = SpaceStore::insert(&store, NewSpace::new("Main St", "B", "EV"))
            .await
            .unwrap();
        assert_eq!(space.id, 3);
    }

    #[tokio::test]
    async fn test_rocksdb_deleted_id_is_not_reused_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
                .await
                .unwrap();
            let highest = SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
                .await
                .unwrap();
            assert!(store.remove(highest.id).await.unwrap());
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        let space = SpaceStore::insert(&store, NewSpace::new("Main St", "B", "EV"))
            .await
            .unwrap();
        assert_eq!(space.id, 3);
    }

    #[tokio::test]
    async fn test_rocksdb_space_locks_are_released() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let space = SpaceStore::insert(&store, NewSpace::new("Main St", "A", "Compact"))
            .await
            .unwrap();

        store
            .swap_status(space.id, Some(SpaceStatus::Available), SpaceStatus::Occupied)
            .await
            .unwrap();
        store.patch(space.id, &SpacePatch::default()).await.unwrap();
        assert!(store.space_locks.lock().unwrap().is_empty());

        assert!(store.remove(space.id).await.unwrap());
        assert!(!store.remove(space.id).await.unwrap());
        assert!(store.space_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rocksdb_transaction_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let a = transaction(1);
        let b = transaction(2);
        TransactionStore::insert(&store, a.clone()).await.unwrap();
        TransactionStore::insert(&store, b.clone()).await.unwrap();

        let retrieved = TransactionStore::get(&store, a.transaction_id).await.unwrap();
        assert_eq!(retrieved, Some(a.clone()));
        assert_eq!(store.get_by_reference(1).await.unwrap(), vec![a.clone()]);
        assert_eq!(TransactionStore::get_all(&store).await.unwrap().len(), 2);

        let duplicate = TransactionStore::insert(&store, a).await;
        assert!(matches!(duplicate, Err(ParkingError::DuplicateTransaction(_))));
    }
}
