//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation.

diesel::table! {
    /// Item categories scoping visibility and writes.
    categories (id) {
        /// Primary key.
        id -> Int8,
        /// Unique category name.
        name -> Varchar,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (maintained by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User accounts consumed by the authentication collaborator.
    users (id) {
        /// Primary key.
        id -> Int8,
        /// Unique login name, also recorded as the audit actor.
        username -> Varchar,
        /// Password hash; hashing itself happens outside the core.
        password_hash -> Varchar,
        /// Role string: admin, staff, or operator.
        role -> Varchar,
        /// Optional category scope; NULL reads everything.
        category_id -> Nullable<Int8>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (maintained by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tracked stock-keeping units.
    items (id) {
        /// Primary key.
        id -> Int8,
        /// Item name.
        article -> Varchar,
        /// Component/type classification.
        komponen -> Varchar,
        /// Optional purchase order reference.
        purchase_order_ref -> Nullable<Varchar>,
        /// Quantity on order, never negative.
        ordered_qty -> Int4,
        /// Stock on hand, never negative; changes only through the ledger.
        qty -> Int4,
        /// Optional storage location code.
        location_code -> Nullable<Varchar>,
        /// Reorder threshold, never negative.
        min_stock -> Int4,
        /// Optional owning category.
        category_id -> Nullable<Int8>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (maintained by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable quantity-change audit trail.
    qty_history (id) {
        /// Primary key.
        id -> Int8,
        /// Owning item; rows cascade away with it.
        item_id -> Int8,
        /// Item name snapshot at change time.
        article -> Varchar,
        /// Quantity before the change.
        old_qty -> Int4,
        /// Quantity after the change, never negative.
        new_qty -> Int4,
        /// Signed difference, always `new_qty - old_qty`.
        change_amount -> Int4,
        /// Classification string, one of the ledger change types.
        change_type -> Varchar,
        /// Optional free-text note.
        notes -> Nullable<Text>,
        /// Actor username.
        updated_by -> Varchar,
        /// Append timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable scan event log.
    scan_logs (id) {
        /// Primary key.
        id -> Int8,
        /// Owning item; rows cascade away with it.
        item_id -> Int8,
        /// Item name snapshot at scan time.
        article -> Varchar,
        /// Payload channel: qr, barcode, or manual.
        scan_type -> Varchar,
        /// Raw scanned payload.
        scan_data -> Text,
        /// What the scan was used for.
        action -> Varchar,
        /// Human-readable outcome summary.
        result -> Text,
        /// Actor username.
        scanned_by -> Varchar,
        /// Append timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(items -> categories (category_id));
diesel::joinable!(users -> categories (category_id));
diesel::joinable!(qty_history -> items (item_id));
diesel::joinable!(scan_logs -> items (item_id));

diesel::allow_tables_to_appear_in_same_query!(categories, users, items, qty_history, scan_logs);
