//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and are
//! never exposed to the domain; adapters convert them through the validated
//! domain constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{categories, items, qty_history, scan_logs, users};

/// Row struct for reading from the items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: i64,
    pub article: String,
    pub komponen: String,
    pub purchase_order_ref: Option<String>,
    pub ordered_qty: i32,
    pub qty: i32,
    pub location_code: Option<String>,
    pub min_stock: i32,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new item rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub(crate) struct NewItemRow<'a> {
    pub article: &'a str,
    pub komponen: &'a str,
    pub purchase_order_ref: Option<&'a str>,
    pub ordered_qty: i32,
    pub qty: i32,
    pub location_code: Option<&'a str>,
    pub min_stock: i32,
    pub category_id: Option<i64>,
}

/// Changeset for the non-quantity item fields.
///
/// Single options skip the column when absent; the nested options on
/// nullable columns write NULL for `Some(None)`.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = items)]
pub(crate) struct ItemChangeset {
    pub article: Option<String>,
    pub komponen: Option<String>,
    pub purchase_order_ref: Option<Option<String>>,
    pub ordered_qty: Option<i32>,
    pub location_code: Option<Option<String>>,
    pub min_stock: Option<i32>,
    pub category_id: Option<Option<i64>>,
}

/// Row struct for reading from the qty_history table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = qty_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct QtyHistoryRow {
    pub id: i64,
    pub item_id: i64,
    pub article: String,
    pub old_qty: i32,
    pub new_qty: i32,
    pub change_amount: i32,
    pub change_type: String,
    pub notes: Option<String>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending history rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = qty_history)]
pub(crate) struct NewQtyHistoryRow<'a> {
    pub item_id: i64,
    pub article: &'a str,
    pub old_qty: i32,
    pub new_qty: i32,
    pub change_amount: i32,
    pub change_type: &'a str,
    pub notes: Option<&'a str>,
    pub updated_by: &'a str,
}

/// Row struct for reading from the scan_logs table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scan_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ScanLogRow {
    pub id: i64,
    pub item_id: i64,
    pub article: String,
    pub scan_type: String,
    pub scan_data: String,
    pub action: String,
    pub result: String,
    pub scanned_by: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending scan log rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scan_logs)]
pub(crate) struct NewScanLogRow<'a> {
    pub item_id: i64,
    pub article: &'a str,
    pub scan_type: &'a str,
    pub scan_data: &'a str,
    pub action: &'a str,
    pub result: &'a str,
    pub scanned_by: &'a str,
}

/// Row struct for reading from the categories table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating category rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = categories)]
pub(crate) struct NewCategoryRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub category_id: Option<i64>,
    #[expect(dead_code, reason = "schema field not carried into the domain record")]
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field not carried into the domain record")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating user rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub category_id: Option<i64>,
}
