//! Quantity ledger services: the named entry points for stock changes and
//! the audit-trail read surface.
//!
//! All entry points share [`crate::domain::ledger::plan_change`] through the
//! item repository; they differ only in the change origin they stamp, which
//! selects the default classification and audit note.

use std::sync::Arc;

use tracing::debug;

use crate::domain::access;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::history::{ChangeType, QtyHistoryEntry};
use crate::domain::identity::IdentityContext;
use crate::domain::item::{Item, ItemId};
use crate::domain::ledger::{ChangeOrigin, QtyChange, QtyChangeSpec};
use crate::domain::ports::{
    HistoryFilter, ItemMutationOutcome, ItemRepository, ItemRepositoryError,
    QtyHistoryRepository, QtyHistoryRepositoryError,
};

fn map_item_error(error: ItemRepositoryError) -> DomainError {
    match error {
        ItemRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            DomainError::internal(format!("item repository error: {message}"))
        }
    }
}

fn map_history_error(error: QtyHistoryRepositoryError) -> DomainError {
    match error {
        QtyHistoryRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("history repository unavailable: {message}"))
        }
        QtyHistoryRepositoryError::Query { message } => {
            DomainError::internal(format!("history repository error: {message}"))
        }
    }
}

fn item_not_found(item_id: ItemId) -> DomainError {
    DomainError::not_found(format!("item {item_id} not found"))
}

/// One requested quantity change, independent of entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtyUpdateRequest {
    pub change: QtyChange,
    /// Optional classification override.
    pub change_type: Option<ChangeType>,
    /// Optional audit note override.
    pub notes: Option<String>,
}

/// A committed quantity change and its audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QtyChangeApplied {
    pub item: Item,
    pub history: QtyHistoryEntry,
}

/// One entry in a bulk quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateEntry {
    pub item_id: ItemId,
    pub change: QtyChange,
}

/// Before/after record for one successfully updated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub item_id: ItemId,
    pub article: String,
    pub old_qty: i32,
    pub new_qty: i32,
}

/// Result of a bulk update. `attempted` versus `results.len()` tells the
/// caller whether some entries were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkUpdateOutcome {
    pub attempted: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkUpdateOutcome {
    /// Number of entries that committed.
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }
}

/// Service owning the quantity-change entry points and history reads.
#[derive(Clone)]
pub struct LedgerService<I, H> {
    items: Arc<I>,
    history: Arc<H>,
}

impl<I, H> LedgerService<I, H> {
    /// Create a new service over the item and history repositories.
    pub fn new(items: Arc<I>, history: Arc<H>) -> Self {
        Self { items, history }
    }
}

impl<I, H> LedgerService<I, H>
where
    I: ItemRepository,
    H: QtyHistoryRepository,
{
    /// Quantity change from the item detail view: adjustments default to
    /// `adjustment`, absolute sets to `manual`.
    pub async fn apply_detail_update(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
        request: QtyUpdateRequest,
    ) -> DomainResult<QtyChangeApplied> {
        self.apply(identity, item_id, request, ChangeOrigin::Detail)
            .await
    }

    /// Quantity change driven by a scanned code: classification follows
    /// the sign of the change, with `qr_scan` for a zero-delta set.
    pub async fn apply_qr_update(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
        request: QtyUpdateRequest,
    ) -> DomainResult<QtyChangeApplied> {
        self.apply(identity, item_id, request, ChangeOrigin::QrScan)
            .await
    }

    async fn apply(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
        request: QtyUpdateRequest,
        origin: ChangeOrigin,
    ) -> DomainResult<QtyChangeApplied> {
        self.authorize_change(identity, item_id).await?;

        let spec = QtyChangeSpec {
            change: request.change,
            change_type: request.change_type,
            origin,
            notes: request.notes,
            updated_by: identity.username.clone(),
        };
        spec.validate()
            .map_err(|violation| DomainError::validation(violation.to_string()))?;

        match self
            .items
            .apply_qty_change(item_id, spec)
            .await
            .map_err(map_item_error)?
        {
            ItemMutationOutcome::Updated {
                item,
                history: Some(history),
            } => {
                debug!(
                    item_id = %item.id(),
                    old_qty = history.old_qty(),
                    new_qty = history.new_qty(),
                    change_type = %history.change_type(),
                    "quantity change applied"
                );
                Ok(QtyChangeApplied { item, history })
            }
            ItemMutationOutcome::Updated { item, history: None } => Err(DomainError::internal(
                format!("quantity change for item {} committed without a history entry", item.id()),
            )),
            ItemMutationOutcome::NotFound => Err(item_not_found(item_id)),
            ItemMutationOutcome::Rejected(violation) => {
                Err(DomainError::validation(violation.to_string()))
            }
        }
    }

    /// Apply independent quantity changes to a batch of items.
    ///
    /// Entries that fail (missing item, access denied, or a change that
    /// would go negative) are skipped and excluded from the results; each
    /// successful entry commits its own item+history transaction. Storage
    /// faults still abort the batch.
    pub async fn bulk_apply(
        &self,
        identity: &IdentityContext,
        entries: Vec<BulkUpdateEntry>,
        change_type: Option<ChangeType>,
        notes: Option<String>,
    ) -> DomainResult<BulkUpdateOutcome> {
        let attempted = entries.len();
        let mut results = Vec::new();
        for entry in entries {
            let spec = QtyChangeSpec {
                change: entry.change,
                change_type,
                origin: ChangeOrigin::Bulk,
                notes: notes.clone(),
                updated_by: identity.username.clone(),
            };
            if let Err(violation) = spec.validate() {
                debug!(item_id = %entry.item_id, %violation, "skipping bulk entry");
                continue;
            }
            if self.authorize_change(identity, entry.item_id).await.is_err() {
                debug!(item_id = %entry.item_id, "skipping unauthorised bulk entry");
                continue;
            }
            match self
                .items
                .apply_qty_change(entry.item_id, spec)
                .await
                .map_err(map_item_error)?
            {
                ItemMutationOutcome::Updated {
                    item,
                    history: Some(history),
                } => results.push(BulkItemResult {
                    item_id: item.id(),
                    article: item.article().to_owned(),
                    old_qty: history.old_qty(),
                    new_qty: history.new_qty(),
                }),
                ItemMutationOutcome::Updated { history: None, .. } => {
                    debug!(item_id = %entry.item_id, "bulk entry committed without history");
                }
                ItemMutationOutcome::NotFound => {
                    debug!(item_id = %entry.item_id, "skipping missing bulk entry");
                }
                ItemMutationOutcome::Rejected(violation) => {
                    debug!(item_id = %entry.item_id, %violation, "skipping rejected bulk entry");
                }
            }
        }
        Ok(BulkUpdateOutcome { attempted, results })
    }

    /// Audit entries for one item, newest first.
    pub async fn list_history(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> DomainResult<Vec<QtyHistoryEntry>> {
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        if !access::can_read(identity, item.category_id()) {
            return Err(item_not_found(item_id));
        }
        self.history
            .list_for_item(item_id, filter)
            .await
            .map_err(map_history_error)
    }

    /// Audit entries across the identity's visible items, newest first.
    pub async fn list_all_history(
        &self,
        identity: &IdentityContext,
        filter: &HistoryFilter,
    ) -> DomainResult<Vec<QtyHistoryEntry>> {
        let scope = access::list_scope(identity);
        self.history
            .list_all(&scope, filter)
            .await
            .map_err(map_history_error)
    }

    /// Shared authorisation for quantity changes: an item the identity may
    /// not see reads as absent; a visible item outside their write scope is
    /// denied.
    async fn authorize_change(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
    ) -> DomainResult<Item> {
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        if !access::can_read(identity, item.category_id()) {
            return Err(item_not_found(item_id));
        }
        if !access::can_change_qty(identity, item.category_id()) {
            return Err(DomainError::permission_denied(
                "not permitted to change quantities in this category",
            ));
        }
        Ok(item)
    }
}

#[cfg(test)]
#[path = "ledger_service_tests.rs"]
mod tests;
