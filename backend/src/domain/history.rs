//! Immutable quantity-change audit records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::item::ItemId;

/// Classification of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Manual,
    Adjustment,
    Inbound,
    Outbound,
    Correction,
    QrScan,
}

impl ChangeType {
    /// Stable string form stored in the database.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Adjustment => "adjustment",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Correction => "correction",
            Self::QrScan => "qr_scan",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unrecognised change type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown change type: {value}")]
pub struct UnknownChangeType {
    /// The rejected input.
    pub value: String,
}

impl FromStr for ChangeType {
    type Err = UnknownChangeType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manual" => Ok(Self::Manual),
            "adjustment" => Ok(Self::Adjustment),
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            "correction" => Ok(Self::Correction),
            "qr_scan" => Ok(Self::QrScan),
            other => Err(UnknownChangeType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Violations of the audit-entry arithmetic invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryValidationError {
    /// `old_qty + change_amount` does not equal `new_qty`.
    #[error("inconsistent change arithmetic: {old_qty} + {change_amount} != {new_qty}")]
    InconsistentAmount {
        old_qty: i32,
        change_amount: i32,
        new_qty: i32,
    },
    /// The recorded resulting quantity is negative.
    #[error("quantity cannot be negative")]
    NegativeQuantity { new_qty: i32 },
}

/// Raw parts of a history entry, prior to invariant checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtyHistoryDraft {
    pub id: i64,
    pub item_id: ItemId,
    pub article: String,
    pub old_qty: i32,
    pub new_qty: i32,
    pub change_amount: i32,
    pub change_type: ChangeType,
    pub notes: Option<String>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable audit record of a quantity change.
///
/// Every entry satisfies `new_qty = old_qty + change_amount` and
/// `new_qty >= 0`; the constructor rejects anything else. The `article`
/// field is a snapshot of the item's name at change time and survives later
/// renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QtyHistoryEntry {
    id: i64,
    item_id: ItemId,
    article: String,
    old_qty: i32,
    new_qty: i32,
    change_amount: i32,
    change_type: ChangeType,
    notes: Option<String>,
    updated_by: String,
    created_at: DateTime<Utc>,
}

impl QtyHistoryEntry {
    /// Validate the arithmetic invariants and construct an entry.
    pub fn new(draft: QtyHistoryDraft) -> Result<Self, HistoryValidationError> {
        if draft.new_qty < 0 {
            return Err(HistoryValidationError::NegativeQuantity {
                new_qty: draft.new_qty,
            });
        }
        let expected = i64::from(draft.old_qty) + i64::from(draft.change_amount);
        if expected != i64::from(draft.new_qty) {
            return Err(HistoryValidationError::InconsistentAmount {
                old_qty: draft.old_qty,
                change_amount: draft.change_amount,
                new_qty: draft.new_qty,
            });
        }
        Ok(Self {
            id: draft.id,
            item_id: draft.item_id,
            article: draft.article,
            old_qty: draft.old_qty,
            new_qty: draft.new_qty,
            change_amount: draft.change_amount,
            change_type: draft.change_type,
            notes: draft.notes,
            updated_by: draft.updated_by,
            created_at: draft.created_at,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// Item name as of the change.
    pub fn article(&self) -> &str {
        self.article.as_str()
    }

    pub fn old_qty(&self) -> i32 {
        self.old_qty
    }

    pub fn new_qty(&self) -> i32 {
        self.new_qty
    }

    pub fn change_amount(&self) -> i32 {
        self.change_amount
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn updated_by(&self) -> &str {
        self.updated_by.as_str()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Insert payload for a new history row, written only by the item
/// repository inside the same transaction as the quantity change itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQtyHistoryRecord {
    pub item_id: ItemId,
    pub article: String,
    pub old_qty: i32,
    pub new_qty: i32,
    pub change_amount: i32,
    pub change_type: ChangeType,
    pub notes: Option<String>,
    pub updated_by: String,
}
