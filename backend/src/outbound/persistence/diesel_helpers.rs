//! Shared error mapping and row conversion for the Diesel adapters.

use std::str::FromStr;

use tracing::debug;

use crate::domain::history::{QtyHistoryDraft, QtyHistoryEntry};
use crate::domain::item::{Item, ItemDraft, ItemId};
use crate::domain::category::CategoryId;

use super::models::{ItemRow, QtyHistoryRow};
use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(super) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors,
/// logging the underlying cause at debug level.
pub(super) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        _ => query("database error"),
    }
}

/// Whether a Diesel error is a unique-constraint violation, e.g. a
/// duplicate category name or username.
pub(super) fn is_unique_violation(error: &diesel::result::Error) -> bool {
    matches!(
        error,
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _
        )
    )
}

/// Convert an item row into the validated domain entity.
pub(super) fn item_from_row<E>(row: ItemRow, query: impl FnOnce(String) -> E) -> Result<Item, E> {
    let ItemRow {
        id,
        article,
        komponen,
        purchase_order_ref,
        ordered_qty,
        qty,
        location_code,
        min_stock,
        category_id,
        created_at,
        updated_at,
    } = row;
    Item::new(
        ItemId::new(id),
        ItemDraft {
            article,
            komponen,
            purchase_order_ref,
            ordered_qty,
            qty,
            location_code,
            min_stock,
            category_id: category_id.map(CategoryId::new),
        },
        created_at,
        updated_at,
    )
    .map_err(|err| query(format!("stored item {id} failed validation: {err}")))
}

/// Convert a history row into the validated domain entry.
pub(super) fn history_from_row<E>(
    row: QtyHistoryRow,
    query: impl Fn(String) -> E,
) -> Result<QtyHistoryEntry, E> {
    let QtyHistoryRow {
        id,
        item_id,
        article,
        old_qty,
        new_qty,
        change_amount,
        change_type,
        notes,
        updated_by,
        created_at,
    } = row;
    let change_type = crate::domain::history::ChangeType::from_str(&change_type)
        .map_err(|err| query(format!("stored history entry {id} is invalid: {err}")))?;
    QtyHistoryEntry::new(QtyHistoryDraft {
        id,
        item_id: ItemId::new(item_id),
        article,
        old_qty,
        new_qty,
        change_amount,
        change_type,
        notes,
        updated_by,
        created_at,
    })
    .map_err(|err| query(format!("stored history entry {id} is invalid: {err}")))
}
