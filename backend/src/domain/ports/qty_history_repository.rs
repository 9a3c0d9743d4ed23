//! Port for reading the quantity-change audit trail.
//!
//! History rows are written exclusively by the item repository, inside the
//! same transaction as the quantity change they record; this port only
//! reads them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::access::ListScope;
use crate::domain::history::{ChangeType, QtyHistoryEntry};
use crate::domain::item::ItemId;

/// Errors raised by history repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QtyHistoryRepositoryError {
    /// Repository connection could not be established.
    #[error("history repository connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution.
    #[error("history repository query failed: {message}")]
    Query { message: String },
}

impl QtyHistoryRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Filters for history listings; entries come back newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub change_type: Option<ChangeType>,
    /// Row cap; adapters apply their own default when absent.
    pub limit: Option<i64>,
}

/// Port for audit-trail reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QtyHistoryRepository: Send + Sync {
    /// History entries for one item, newest first.
    async fn list_for_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError>;

    /// History entries across all items visible under the scope, newest
    /// first.
    async fn list_all(
        &self,
        scope: &ListScope,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError>;
}

/// Fixture implementation for tests that do not exercise history reads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQtyHistoryRepository;

#[async_trait]
impl QtyHistoryRepository for FixtureQtyHistoryRepository {
    async fn list_for_item(
        &self,
        _item_id: ItemId,
        _filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_all(
        &self,
        _scope: &ListScope,
        _filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        Ok(Vec::new())
    }
}
