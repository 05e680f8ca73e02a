use super::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistence port for payment records.
///
/// `save` is a compare-and-swap on the status: it only writes when the stored
/// record still has `expected` status, and fails with
/// `PaymentError::ConcurrentUpdateConflict` otherwise.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new record and returns it with its assigned id.
    async fn create(&self, record: PaymentRecord) -> Result<PaymentRecord>;
    async fn load(&self, id: PaymentId) -> Result<Option<PaymentRecord>>;
    async fn save(&self, record: &PaymentRecord, expected: PaymentStatus) -> Result<()>;
    async fn all(&self) -> Result<Vec<PaymentRecord>>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
