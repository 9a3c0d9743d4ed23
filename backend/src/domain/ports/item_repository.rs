//! Port for item persistence, listing, and atomic quantity mutation.

use async_trait::async_trait;

use crate::domain::access::ListScope;
use crate::domain::history::QtyHistoryEntry;
use crate::domain::item::{Item, ItemDraft, ItemFieldUpdate, ItemId};
use crate::domain::ledger::{LedgerViolation, QtyChangeSpec};

/// Errors raised by item repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemRepositoryError {
    /// Repository connection could not be established.
    #[error("item repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("item repository query failed: {message}")]
    Query { message: String },
}

impl ItemRepositoryError {
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

/// Outcome of a mutation that may touch the quantity ledger.
///
/// Ledger rule violations are data, not adapter errors: the transaction
/// rolls back and the violation is reported for the service to translate.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemMutationOutcome {
    /// The mutation committed; `history` is present when a quantity change
    /// was recorded.
    Updated {
        item: Item,
        history: Option<QtyHistoryEntry>,
    },
    /// No item with the given id exists.
    NotFound,
    /// The requested quantity change violated a ledger rule; nothing was
    /// written.
    Rejected(LedgerViolation),
}

/// Sortable columns for item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSortField {
    Article,
    Komponen,
    LocationCode,
    Qty,
    MinStock,
    UpdatedAt,
}

/// Sort direction for item listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Explicit sort request; listings default to location then article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSort {
    pub field: ItemSortField,
    pub direction: SortDirection,
}

/// Filters for item listings. The category scope is applied separately and
/// always first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring match over article, komponen, purchase
    /// order reference, and location code.
    pub search: Option<String>,
    pub location_code: Option<String>,
    pub komponen: Option<String>,
    /// Only items at or below their reorder threshold.
    pub low_stock: bool,
    pub sort: Option<ItemSort>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of items plus the unpaginated total for envelopes.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: i64,
}

/// Per-location aggregation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationStats {
    pub location_code: String,
    pub item_count: i64,
    pub total_qty: i64,
}

/// Stock-level aggregation over the visible items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSummary {
    pub total_items: i64,
    pub total_qty: i64,
    pub total_ordered_qty: i64,
    pub low_stock_items: i64,
    pub by_location: Vec<LocationStats>,
}

/// Distinct field values backing filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctFilterValues {
    pub komponen: Vec<String>,
    pub location_codes: Vec<String>,
}

/// Port for item rows and their paired audit history writes.
///
/// Implementations own the transactional discipline: every quantity
/// mutation commits the item row update and the history insert together or
/// not at all, with the item row locked so concurrent changes to the same
/// item serialise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Persist a new item. When the draft carries opening stock, the
    /// adapter writes the initial-stock history entry in the same
    /// transaction, attributed to `created_by`.
    async fn insert(
        &self,
        draft: &ItemDraft,
        created_by: &str,
    ) -> Result<Item, ItemRepositoryError>;

    /// Find an item by id.
    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, ItemRepositoryError>;

    /// Apply field changes and, when present, a quantity change in one
    /// transaction. The quantity change is skipped (no history written)
    /// when the locked quantity already equals an absolute-set target.
    async fn update(
        &self,
        item_id: ItemId,
        fields: ItemFieldUpdate,
        qty_change: Option<QtyChangeSpec>,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError>;

    /// Apply a quantity change, always recording a history entry on
    /// success (including a zero-delta absolute set).
    async fn apply_qty_change(
        &self,
        item_id: ItemId,
        spec: QtyChangeSpec,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError>;

    /// Append the final zeroing-out history entry, then remove the item and
    /// cascade its history and scan rows, all in one transaction. Returns
    /// the deleted item, or `None` when it did not exist.
    async fn delete(
        &self,
        item_id: ItemId,
        deleted_by: &str,
    ) -> Result<Option<Item>, ItemRepositoryError>;

    /// List items under the given scope and filters.
    async fn list(
        &self,
        scope: &ListScope,
        filter: &ItemFilter,
    ) -> Result<ItemPage, ItemRepositoryError>;

    /// Aggregate stock levels under the given scope.
    async fn stats(&self, scope: &ListScope) -> Result<StockSummary, ItemRepositoryError>;

    /// Distinct komponen and location codes under the given scope.
    async fn distinct_values(
        &self,
        scope: &ListScope,
    ) -> Result<DistinctFilterValues, ItemRepositoryError>;
}
