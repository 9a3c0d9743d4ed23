//! Inventory item entity and mutation payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::category::CategoryId;
use crate::domain::history::ChangeType;

/// Stable item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Wrap a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for item input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemValidationError {
    /// A required text field is empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    /// A quantity-like field is negative.
    #[error("{field} must not be negative")]
    NegativeValue { field: &'static str, value: i32 },
}

fn non_empty_trimmed(
    value: String,
    field: &'static str,
) -> Result<String, ItemValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ItemValidationError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

fn ensure_non_negative(value: i32, field: &'static str) -> Result<(), ItemValidationError> {
    if value < 0 {
        return Err(ItemValidationError::NegativeValue { field, value });
    }
    Ok(())
}

/// Input payload for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub article: String,
    pub komponen: String,
    pub purchase_order_ref: Option<String>,
    pub ordered_qty: i32,
    pub qty: i32,
    pub location_code: Option<String>,
    pub min_stock: i32,
    pub category_id: Option<CategoryId>,
}

impl Default for ItemDraft {
    fn default() -> Self {
        Self {
            article: String::new(),
            komponen: String::new(),
            purchase_order_ref: None,
            ordered_qty: 0,
            qty: 0,
            location_code: None,
            min_stock: 10,
            category_id: None,
        }
    }
}

impl ItemDraft {
    /// Trim text fields and validate required and non-negative constraints.
    pub fn validated(mut self) -> Result<Self, ItemValidationError> {
        self.article = non_empty_trimmed(self.article, "article")?;
        self.komponen = non_empty_trimmed(self.komponen, "komponen")?;
        ensure_non_negative(self.ordered_qty, "ordered_qty")?;
        ensure_non_negative(self.qty, "qty")?;
        ensure_non_negative(self.min_stock, "min_stock")?;
        Ok(self)
    }
}

/// A persisted inventory item.
///
/// The stock quantity only changes through the quantity ledger, which pairs
/// every change with an audit history entry in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: ItemId,
    article: String,
    komponen: String,
    purchase_order_ref: Option<String>,
    ordered_qty: i32,
    qty: i32,
    location_code: Option<String>,
    min_stock: i32,
    category_id: Option<CategoryId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Item {
    /// Validate and construct an item from stored parts.
    pub fn new(
        id: ItemId,
        draft: ItemDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ItemValidationError> {
        let draft = draft.validated()?;
        Ok(Self {
            id,
            article: draft.article,
            komponen: draft.komponen,
            purchase_order_ref: draft.purchase_order_ref,
            ordered_qty: draft.ordered_qty,
            qty: draft.qty,
            location_code: draft.location_code,
            min_stock: draft.min_stock,
            category_id: draft.category_id,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn article(&self) -> &str {
        self.article.as_str()
    }

    pub fn komponen(&self) -> &str {
        self.komponen.as_str()
    }

    pub fn purchase_order_ref(&self) -> Option<&str> {
        self.purchase_order_ref.as_deref()
    }

    pub fn ordered_qty(&self) -> i32 {
        self.ordered_qty
    }

    /// Current stock on hand.
    pub fn qty(&self) -> i32 {
        self.qty
    }

    pub fn location_code(&self) -> Option<&str> {
        self.location_code.as_deref()
    }

    pub fn min_stock(&self) -> i32 {
        self.min_stock
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether stock has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.qty <= self.min_stock
    }
}

/// Caller-facing update payload.
///
/// `None` leaves a field untouched. Nullable fields use a nested option:
/// `Some(None)` clears the stored value. A `qty` value routes through the
/// quantity ledger; `change_type` and `change_notes` annotate the resulting
/// history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub article: Option<String>,
    pub komponen: Option<String>,
    pub purchase_order_ref: Option<Option<String>>,
    pub ordered_qty: Option<i32>,
    pub qty: Option<i32>,
    pub location_code: Option<Option<String>>,
    pub min_stock: Option<i32>,
    pub category_id: Option<Option<CategoryId>>,
    pub change_type: Option<ChangeType>,
    pub change_notes: Option<String>,
}

impl ItemPatch {
    /// Validate the fields that are present, trimming text values.
    pub fn validated(mut self) -> Result<Self, ItemValidationError> {
        if let Some(article) = self.article.take() {
            self.article = Some(non_empty_trimmed(article, "article")?);
        }
        if let Some(komponen) = self.komponen.take() {
            self.komponen = Some(non_empty_trimmed(komponen, "komponen")?);
        }
        if let Some(ordered_qty) = self.ordered_qty {
            ensure_non_negative(ordered_qty, "ordered_qty")?;
        }
        if let Some(qty) = self.qty {
            ensure_non_negative(qty, "qty")?;
        }
        if let Some(min_stock) = self.min_stock {
            ensure_non_negative(min_stock, "min_stock")?;
        }
        Ok(self)
    }

    /// The non-quantity portion of the patch, as applied by the repository.
    pub fn field_update(&self) -> ItemFieldUpdate {
        ItemFieldUpdate {
            article: self.article.clone(),
            komponen: self.komponen.clone(),
            purchase_order_ref: self.purchase_order_ref.clone(),
            ordered_qty: self.ordered_qty,
            location_code: self.location_code.clone(),
            min_stock: self.min_stock,
            category_id: self.category_id,
        }
    }
}

/// Non-quantity field changes handed to the item repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFieldUpdate {
    pub article: Option<String>,
    pub komponen: Option<String>,
    pub purchase_order_ref: Option<Option<String>>,
    pub ordered_qty: Option<i32>,
    pub location_code: Option<Option<String>>,
    pub min_stock: Option<i32>,
    pub category_id: Option<Option<CategoryId>>,
}

impl ItemFieldUpdate {
    /// Whether the update carries no field changes at all.
    pub fn is_empty(&self) -> bool {
        self.article.is_none()
            && self.komponen.is_none()
            && self.purchase_order_ref.is_none()
            && self.ordered_qty.is_none()
            && self.location_code.is_none()
            && self.min_stock.is_none()
            && self.category_id.is_none()
    }
}
