use crate::domain::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for bookkeeping such as the id sequence.
pub const CF_META: &str = "meta";

const LAST_ID_KEY: &[u8] = b"last_payment_id";

/// A persistent store implementation using RocksDB.
///
/// Records are kept as JSON under their big-endian id in the `payments`
/// column family. RocksDB has no conditional put, so every read-check-write
/// (id allocation and status compare-and-swap) runs under one async mutex.
///
/// `Clone` shares the underlying `Arc<DB>` and the write lock.
#[derive(Clone)]
pub struct RocksDbPaymentStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn missing_cf(name: &str) -> PaymentError {
    PaymentError::Internal(Box::new(std::io::Error::other(format!(
        "{} column family not found",
        name
    ))))
}

impl RocksDbPaymentStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("payments" and "meta") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let cf = self
            .db
            .cf_handle(CF_PAYMENTS)
            .ok_or_else(|| missing_cf(CF_PAYMENTS))?;

        match self.db.get_cf(&cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, record: &PaymentRecord) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_PAYMENTS)
            .ok_or_else(|| missing_cf(CF_PAYMENTS))?;

        let value = serde_json::to_vec(record)?;
        self.db.put_cf(&cf, record.id.0.to_be_bytes(), value)?;
        Ok(())
    }

    /// Reads the id the next created record gets. Callers hold the write lock.
    fn next_id(&self) -> Result<PaymentId> {
        let cf = self.db.cf_handle(CF_META).ok_or_else(|| missing_cf(CF_META))?;

        let last = match self.db.get_cf(&cf, LAST_ID_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PaymentError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt payment id sequence",
                    )))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        Ok(PaymentId(last + 1))
    }
}

#[async_trait]
impl PaymentStore for RocksDbPaymentStore {
    async fn create(&self, mut record: PaymentRecord) -> Result<PaymentRecord> {
        let _guard = self.write_lock.lock().await;
        record.id = self.next_id()?;

        let payments = self
            .db
            .cf_handle(CF_PAYMENTS)
            .ok_or_else(|| missing_cf(CF_PAYMENTS))?;
        let meta = self.db.cf_handle(CF_META).ok_or_else(|| missing_cf(CF_META))?;
        // Sequence bump and record land atomically.
        let mut batch = WriteBatch::default();
        batch.put_cf(&meta, LAST_ID_KEY, record.id.0.to_be_bytes());
        batch.put_cf(&payments, record.id.0.to_be_bytes(), serde_json::to_vec(&record)?);
        self.db.write(batch)?;
        Ok(record)
    }

    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        self.read(id)
    }

    async fn save(&self, record: &PaymentRecord, expected: PaymentStatus) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let stored = self
            .read(record.id)?
            .ok_or_else(|| PaymentError::PaymentNotFound(record.id.to_string()))?;

        if stored.status() != expected {
            return Err(PaymentError::ConcurrentUpdateConflict {
                id: record.id,
                expected,
                found: stored.status(),
            });
        }
        self.write(record)
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        let handle = self
            .db
            .cf_handle(CF_PAYMENTS)
            .ok_or_else(|| missing_cf(CF_PAYMENTS))?;

        let mut records = Vec::new();
        let iter = self.db.iterator_cf(&handle, rocksdb::IteratorMode::Start);

        for item in iter {
            let (_key, value) = item?;
            let record: PaymentRecord = serde_json::from_slice(&value)?;
            records.push(record);
        }

        Ok(records)
    }
}
