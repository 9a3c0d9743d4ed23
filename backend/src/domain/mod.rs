//! Domain model and services for the warehouse inventory core.
//!
//! Entities are strongly typed and validated on construction; services
//! orchestrate the repository ports and enforce the access policy. The
//! quantity ledger in [`ledger`] is the single authoritative path for stock
//! changes: every mutation pairs the item update with an immutable audit
//! entry in one transaction.

pub mod access;
pub mod category;
pub mod category_service;
pub mod error;
pub mod history;
pub mod identity;
pub mod item;
pub mod item_service;
pub mod ledger;
pub mod ledger_service;
pub mod ports;
pub mod scan;
pub mod scan_service;
pub mod stats_service;
pub mod user;

pub use self::access::ListScope;
pub use self::category::{Category, CategoryDraft, CategoryId, CategoryValidationError};
pub use self::error::{DomainError, DomainResult};
pub use self::history::{
    ChangeType, HistoryValidationError, NewQtyHistoryRecord, QtyHistoryDraft, QtyHistoryEntry,
    UnknownChangeType,
};
pub use self::identity::{IdentityContext, Role, UnknownRole};
pub use self::item::{
    Item, ItemDraft, ItemFieldUpdate, ItemId, ItemPatch, ItemValidationError,
};
pub use self::ledger::{
    ChangeOrigin, LedgerViolation, QtyChange, QtyChangePlan, QtyChangeSpec,
};
pub use self::scan::{
    NewScanLogRecord, ScanAction, ScanLogEntry, ScanType, UnknownScanValue,
};
pub use self::user::{NewUser, User, UserId};
