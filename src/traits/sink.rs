use async_trait::async_trait;

use crate::errors::SinkError;
use crate::seed::{Id, Record};

/// The external store that seeding nodes write to.
///
/// Implementations decide what "kind" maps to (a table, a collection, a
/// file). A batch is accepted or rejected as a whole.
#[async_trait]
pub trait DataSink: Send + Sync {
    /// Insert every record of one kind in a single transaction.
    async fn insert_batch(&self, kind: &str, records: Vec<Record>) -> Result<(), SinkError>;

    /// Ids of every stored record of `kind`, in insertion order.
    async fn select_ids(&self, kind: &str) -> Result<Vec<Id>, SinkError>;

    fn name(&self) -> &'static str;
}
