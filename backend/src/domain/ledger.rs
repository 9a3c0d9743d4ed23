//! Quantity-change planning.
//!
//! Every stock mutation is planned here before anything touches storage:
//! the resulting quantity, the signed change amount, the change-type
//! classification, and the audit note all come out of [`plan_change`]. Both
//! the Diesel adapter and the in-memory test store call the same planner, so
//! the arithmetic invariants (`new_qty = old_qty + change_amount`,
//! `new_qty >= 0`) hold in exactly one place.

use thiserror::Error;

use crate::domain::history::{ChangeType, NewQtyHistoryRecord};
use crate::domain::item::ItemId;

/// The two shapes a quantity change can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QtyChange {
    /// Signed delta applied to the current quantity.
    Adjust(i32),
    /// Replacement target quantity, independent of the current value.
    SetTo(i32),
}

/// Entry path a change arrived through; selects the default classification
/// and audit note when the caller does not specify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Detail-view update: adjustments classify as `adjustment`, absolute
    /// sets as `manual`.
    Detail,
    /// Scanner-driven quick update: classification follows the sign of the
    /// change, with `qr_scan` for a zero-delta set.
    QrScan,
    /// Batch update: defaults to `adjustment` regardless of shape.
    Bulk,
}

/// Full description of one requested quantity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtyChangeSpec {
    pub change: QtyChange,
    /// Caller-supplied classification; overrides the origin default.
    pub change_type: Option<ChangeType>,
    pub origin: ChangeOrigin,
    /// Caller-supplied note; overrides the origin default.
    pub notes: Option<String>,
    /// Actor recorded on the audit entry.
    pub updated_by: String,
}

impl QtyChangeSpec {
    /// Checks that hold independent of the current quantity.
    pub fn validate(&self) -> Result<(), LedgerViolation> {
        match self.change {
            QtyChange::Adjust(0) => Err(LedgerViolation::ZeroAdjustment),
            QtyChange::SetTo(target) if target < 0 => Err(LedgerViolation::NegativeQuantity),
            _ => Ok(()),
        }
    }
}

/// Rules a requested change can violate. Terminal outcomes; never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerViolation {
    /// An adjustment of zero is meaningless and rejected outright.
    #[error("adjustment must be nonzero")]
    ZeroAdjustment,
    /// The target or resulting quantity would drop below zero.
    #[error("quantity cannot be negative")]
    NegativeQuantity,
    /// The adjustment overflows the representable stock range.
    #[error("quantity change exceeds the stock range")]
    OutOfRange,
}

/// A validated change, ready to persist together with its audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtyChangePlan {
    pub old_qty: i32,
    pub new_qty: i32,
    pub change_amount: i32,
    pub change_type: ChangeType,
    pub notes: String,
}

impl QtyChangePlan {
    /// Attach the item snapshot and actor to produce the history insert.
    pub fn into_record(
        self,
        item_id: ItemId,
        article: &str,
        updated_by: &str,
    ) -> NewQtyHistoryRecord {
        NewQtyHistoryRecord {
            item_id,
            article: article.to_owned(),
            old_qty: self.old_qty,
            new_qty: self.new_qty,
            change_amount: self.change_amount,
            change_type: self.change_type,
            notes: Some(self.notes),
            updated_by: updated_by.to_owned(),
        }
    }
}

/// Plan a quantity change against the current stock level.
///
/// Callers must read `old_qty` under the same lock that later writes the
/// plan; nothing may be persisted when this returns an error.
pub fn plan_change(old_qty: i32, spec: &QtyChangeSpec) -> Result<QtyChangePlan, LedgerViolation> {
    spec.validate()?;

    let new_qty = match spec.change {
        QtyChange::SetTo(target) => target,
        QtyChange::Adjust(delta) => old_qty
            .checked_add(delta)
            .ok_or(LedgerViolation::OutOfRange)?,
    };
    if new_qty < 0 {
        return Err(LedgerViolation::NegativeQuantity);
    }

    let change_amount = new_qty - old_qty;
    let change_type = spec
        .change_type
        .unwrap_or_else(|| default_change_type(spec.origin, spec.change, change_amount));
    let notes = spec
        .notes
        .clone()
        .unwrap_or_else(|| default_notes(spec.origin, spec.change, old_qty, new_qty));

    Ok(QtyChangePlan {
        old_qty,
        new_qty,
        change_amount,
        change_type,
        notes,
    })
}

fn default_change_type(origin: ChangeOrigin, change: QtyChange, change_amount: i32) -> ChangeType {
    match origin {
        ChangeOrigin::Detail => match change {
            QtyChange::Adjust(_) => ChangeType::Adjustment,
            QtyChange::SetTo(_) => ChangeType::Manual,
        },
        ChangeOrigin::Bulk => ChangeType::Adjustment,
        ChangeOrigin::QrScan => {
            if change_amount > 0 {
                ChangeType::Inbound
            } else if change_amount < 0 {
                ChangeType::Outbound
            } else {
                ChangeType::QrScan
            }
        }
    }
}

fn default_notes(origin: ChangeOrigin, change: QtyChange, old_qty: i32, new_qty: i32) -> String {
    match (origin, change) {
        (ChangeOrigin::Detail, QtyChange::Adjust(delta)) => format!("Adjusted by {delta:+}"),
        (ChangeOrigin::Detail, QtyChange::SetTo(_)) => {
            format!("Updated from {old_qty} to {new_qty}")
        }
        (ChangeOrigin::QrScan, QtyChange::Adjust(delta)) => {
            format!("QR Scan Update: Adjusted by {delta:+}")
        }
        (ChangeOrigin::QrScan, QtyChange::SetTo(target)) => {
            format!("QR Scan Update: Set to {target}")
        }
        (ChangeOrigin::Bulk, QtyChange::Adjust(delta)) => {
            format!("Bulk update: Adjusted by {delta}")
        }
        (ChangeOrigin::Bulk, QtyChange::SetTo(target)) => format!("Bulk update: Set to {target}"),
    }
}

/// Audit plan written alongside a freshly created item with opening stock.
pub fn initial_stock_plan(qty: i32) -> QtyChangePlan {
    QtyChangePlan {
        old_qty: 0,
        new_qty: qty,
        change_amount: qty,
        change_type: ChangeType::Inbound,
        notes: "Initial stock creation".to_owned(),
    }
}

/// Audit plan recording the zeroing-out of an item about to be deleted.
pub fn deletion_plan(old_qty: i32) -> QtyChangePlan {
    QtyChangePlan {
        old_qty,
        new_qty: 0,
        change_amount: -old_qty,
        change_type: ChangeType::Outbound,
        notes: "Item deleted from system".to_owned(),
    }
}
