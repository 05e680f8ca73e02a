use crate::domain::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::ports::PaymentStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Payments {
    last_id: u64,
    records: BTreeMap<PaymentId, PaymentRecord>,
}

/// A thread-safe in-memory store for payment records.
///
/// Ids are handed out sequentially starting at 1. The status check of `save`
/// and the write happen under the same write lock.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<Payments>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, mut record: PaymentRecord) -> Result<PaymentRecord> {
        let mut payments = self.payments.write().await;
        payments.last_id += 1;
        record.id = PaymentId(payments.last_id);
        payments.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.records.get(&id).cloned())
    }

    async fn save(&self, record: &PaymentRecord, expected: PaymentStatus) -> Result<()> {
        let mut payments = self.payments.write().await;
        let stored = payments
            .records
            .get_mut(&record.id)
            .ok_or_else(|| PaymentError::PaymentNotFound(record.id.to_string()))?;

        if stored.status() != expected {
            return Err(PaymentError::ConcurrentUpdateConflict {
                id: record.id,
                expected,
                found: stored.status(),
            });
        }
        *stored = record.clone();
        Ok(())
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryPaymentStore::new();
        let first = store.create(PaymentRecord::new("dps")).await.unwrap();
        let second = store.create(PaymentRecord::new("dps")).await.unwrap();

        assert_eq!(first.id, PaymentId(1));
        assert_eq!(second.id, PaymentId(2));
        assert_eq!(store.load(PaymentId(1)).await.unwrap().unwrap(), first);
        assert!(store.load(PaymentId(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_checks_expected_status() {
        let store = InMemoryPaymentStore::new();
        let mut record = store.create(PaymentRecord::new("dps")).await.unwrap();

        record.transition(PaymentStatus::Pending).unwrap();
        store.save(&record, PaymentStatus::Incomplete).await.unwrap();

        // A second writer that still believes the record is Incomplete loses.
        let result = store.save(&record, PaymentStatus::Incomplete).await;
        assert!(matches!(
            result,
            Err(PaymentError::ConcurrentUpdateConflict {
                expected: PaymentStatus::Incomplete,
                found: PaymentStatus::Pending,
                ..
            })
        ));
        let stored = store.load(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_save_unknown_record() {
        let store = InMemoryPaymentStore::new();
        let mut record = PaymentRecord::new("dps");
        record.id = PaymentId(99);

        let result = store.save(&record, PaymentStatus::Incomplete).await;
        assert!(matches!(result, Err(PaymentError::PaymentNotFound(_))));
    }

    #[tokio::test]
    async fn test_all_returns_records_in_id_order() {
        let store = InMemoryPaymentStore::new();
        for _ in 0..3 {
            store.create(PaymentRecord::new("paypal")).await.unwrap();
        }
        let ids: Vec<_> = store.all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![PaymentId(1), PaymentId(2), PaymentId(3)]);
    }
}
