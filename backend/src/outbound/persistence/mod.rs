//! PostgreSQL persistence adapters built on Diesel with async connections.
//!
//! Each adapter implements one domain port. Quantity mutations run inside a
//! transaction that locks the item row, re-reads the quantity, plans the
//! change through the domain ledger, and writes the item and its history
//! entry together.

mod diesel_category_repository;
mod diesel_helpers;
mod diesel_item_repository;
mod diesel_qty_history_repository;
mod diesel_scan_log_repository;
mod diesel_user_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_category_repository::DieselCategoryRepository;
pub use diesel_item_repository::DieselItemRepository;
pub use diesel_qty_history_repository::DieselQtyHistoryRepository;
pub use diesel_scan_log_repository::DieselScanLogRepository;
pub use diesel_user_repository::DieselUserRepository;

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

/// Embedded SQL migrations, applied by the consuming binary at startup.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
