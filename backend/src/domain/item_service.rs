//! Item lifecycle service: create, update, delete, lookups, and label data.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use scan_codes::label::{self, LabelPayload};

use crate::domain::access;
use crate::domain::category::CategoryId;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::identity::{IdentityContext, Role};
use crate::domain::item::{Item, ItemDraft, ItemId, ItemPatch};
use crate::domain::ledger::{ChangeOrigin, QtyChange, QtyChangeSpec};
use crate::domain::ports::{
    CategoryRepository, CategoryRepositoryError, ItemFilter, ItemMutationOutcome, ItemPage,
    ItemRepository, ItemRepositoryError,
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

fn map_category_error(error: CategoryRepositoryError) -> DomainError {
    match error {
        CategoryRepositoryError::Connection { message } => {
            DomainError::unavailable(format!("category repository unavailable: {message}"))
        }
        CategoryRepositoryError::Query { message } => {
            DomainError::internal(format!("category repository error: {message}"))
        }
        CategoryRepositoryError::DuplicateName { name } => {
            DomainError::conflict(format!("category name already exists: {name}"))
        }
    }
}

fn item_not_found(item_id: ItemId) -> DomainError {
    DomainError::not_found(format!("item {item_id} not found"))
}

/// Label payload bundle for one item, ready for the rendering collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLabel {
    pub item: Item,
    pub category_name: Option<String>,
    /// JSON string to encode into the QR image.
    pub qr_data: String,
    pub item_code: String,
    pub warehouse_code: String,
}

/// Service owning the item lifecycle.
#[derive(Clone)]
pub struct ItemService<I, C> {
    items: Arc<I>,
    categories: Arc<C>,
}

impl<I, C> ItemService<I, C> {
    /// Create a new service over the item and category repositories.
    pub fn new(items: Arc<I>, categories: Arc<C>) -> Self {
        Self { items, categories }
    }
}

impl<I, C> ItemService<I, C>
where
    I: ItemRepository,
    C: CategoryRepository,
{
    async fn ensure_category_exists(&self, category_id: CategoryId) -> DomainResult<()> {
        let found = self
            .categories
            .find_by_id(category_id)
            .await
            .map_err(map_category_error)?;
        if found.is_none() {
            return Err(DomainError::validation(format!(
                "category {category_id} does not exist"
            )));
        }
        Ok(())
    }

    /// Create an item.
    ///
    /// Staff-created items always land in the caller's own category, even
    /// when the draft names another one; this matches the long-standing
    /// API behaviour that existing import tooling relies on. A draft with
    /// opening stock gets its initial-stock history entry in the same
    /// transaction as the insert.
    pub async fn create(
        &self,
        identity: &IdentityContext,
        draft: ItemDraft,
    ) -> DomainResult<Item> {
        if !access::can_create_items(identity) {
            return Err(DomainError::permission_denied(
                "only admin or staff may create items",
            ));
        }
        let mut draft = draft
            .validated()
            .map_err(|err| DomainError::validation(err.to_string()))?;
        if identity.role == Role::Staff {
            draft.category_id = identity.category_id;
        }
        if let Some(category_id) = draft.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        let item = self
            .items
            .insert(&draft, &identity.username)
            .await
            .map_err(map_item_error)?;
        debug!(item_id = %item.id(), article = item.article(), "item created");
        Ok(item)
    }

    /// Update item fields, routing any quantity change through the ledger
    /// within the same transaction as the field update.
    pub async fn update(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
        patch: ItemPatch,
    ) -> DomainResult<Item> {
        let patch = patch
            .validated()
            .map_err(|err| DomainError::validation(err.to_string()))?;
        let current = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        if !access::can_write(identity, current.category_id()) {
            return Err(DomainError::permission_denied(
                "not permitted to modify items in this category",
            ));
        }
        if let Some(new_category) = patch.category_id {
            if new_category != current.category_id() && !identity.is_admin() {
                return Err(DomainError::permission_denied(
                    "only admin may move items between categories",
                ));
            }
            if let Some(category_id) = new_category {
                self.ensure_category_exists(category_id).await?;
            }
        }

        let qty_change = patch.qty.map(|target| QtyChangeSpec {
            change: QtyChange::SetTo(target),
            change_type: patch.change_type,
            origin: ChangeOrigin::Detail,
            notes: patch.change_notes.clone(),
            updated_by: identity.username.clone(),
        });
        let outcome = self
            .items
            .update(item_id, patch.field_update(), qty_change)
            .await
            .map_err(map_item_error)?;
        match outcome {
            ItemMutationOutcome::Updated { item, history } => {
                if let Some(entry) = &history {
                    debug!(
                        item_id = %item.id(),
                        old_qty = entry.old_qty(),
                        new_qty = entry.new_qty(),
                        "quantity updated"
                    );
                }
                Ok(item)
            }
            ItemMutationOutcome::NotFound => Err(item_not_found(item_id)),
            ItemMutationOutcome::Rejected(violation) => {
                Err(DomainError::validation(violation.to_string()))
            }
        }
    }

    /// Delete an item. Reserved to admins globally; the repository appends
    /// the final zeroing-out history entry before removing the row.
    pub async fn delete(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
    ) -> DomainResult<Item> {
        if !identity.is_admin() {
            return Err(DomainError::permission_denied("only admin may delete items"));
        }
        let deleted = self
            .items
            .delete(item_id, &identity.username)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        warn!(item_id = %deleted.id(), article = deleted.article(), "item deleted");
        Ok(deleted)
    }

    /// Fetch one item. An item the identity may not see is reported as
    /// absent so existence never leaks across category boundaries.
    pub async fn get(&self, identity: &IdentityContext, item_id: ItemId) -> DomainResult<Item> {
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        if !access::can_read(identity, item.category_id()) {
            return Err(item_not_found(item_id));
        }
        Ok(item)
    }

    /// List items; the identity's category scope is applied before any
    /// caller filters.
    pub async fn list(
        &self,
        identity: &IdentityContext,
        filter: &ItemFilter,
    ) -> DomainResult<ItemPage> {
        let scope = access::list_scope(identity);
        self.items
            .list(&scope, filter)
            .await
            .map_err(map_item_error)
    }

    /// Label payload for one item.
    pub async fn label_data(
        &self,
        identity: &IdentityContext,
        item_id: ItemId,
    ) -> DomainResult<ItemLabel> {
        let item = self.get(identity, item_id).await?;
        self.build_label(item).await
    }

    /// Label payloads for a batch of items; ids the identity cannot see
    /// are skipped, matching single-label visibility.
    pub async fn bulk_labels(
        &self,
        identity: &IdentityContext,
        item_ids: &[ItemId],
    ) -> DomainResult<Vec<ItemLabel>> {
        let mut labels = Vec::with_capacity(item_ids.len());
        for &item_id in item_ids {
            match self.label_data(identity, item_id).await {
                Ok(item_label) => labels.push(item_label),
                Err(DomainError::NotFound { .. }) => {
                    debug!(%item_id, "skipping unavailable item in bulk label run");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(labels)
    }

    async fn build_label(&self, item: Item) -> DomainResult<ItemLabel> {
        let category_name = match item.category_id() {
            Some(category_id) => self
                .categories
                .find_by_id(category_id)
                .await
                .map_err(map_category_error)?
                .map(|category| category.name().to_owned()),
            None => None,
        };
        let payload = LabelPayload::new(
            item.id().as_i64(),
            item.article(),
            item.komponen(),
            item.location_code().map(ToOwned::to_owned),
            item.qty(),
            item.min_stock(),
            Utc::now().to_rfc3339(),
        );
        let qr_data = payload
            .to_qr_data()
            .map_err(|err| DomainError::internal(format!("failed to render label payload: {err}")))?;
        Ok(ItemLabel {
            category_name,
            qr_data,
            item_code: label::item_code(item.id().as_i64()),
            warehouse_code: label::warehouse_code(item.id().as_i64()),
            item,
        })
    }
}

#[cfg(test)]
#[path = "item_service_tests.rs"]
mod tests;
