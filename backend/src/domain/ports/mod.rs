//! Domain ports for the hexagonal boundary.
//!
//! Each port carries its own adapter error enum (connection vs. query) plus
//! snake_case helper constructors; services translate those into the domain
//! error taxonomy. Mock implementations are generated for tests, and no-op
//! fixtures are exported for tests that do not exercise a given port.

mod category_repository;
mod item_repository;
mod qty_history_repository;
mod scan_log_repository;
mod user_repository;

pub use category_repository::{
    CategoryDeleteOutcome, CategoryRepository, CategoryRepositoryError, FixtureCategoryRepository,
};
pub use item_repository::{
    DistinctFilterValues, ItemFilter, ItemMutationOutcome, ItemPage, ItemRepository,
    ItemRepositoryError, ItemSort, ItemSortField, LocationStats, SortDirection, StockSummary,
};
pub use qty_history_repository::{
    FixtureQtyHistoryRepository, HistoryFilter, QtyHistoryRepository, QtyHistoryRepositoryError,
};
pub use scan_log_repository::{
    FixtureScanLogRepository, ScanLogFilter, ScanLogRepository, ScanLogRepositoryError,
};
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};

#[cfg(test)]
pub use category_repository::MockCategoryRepository;
#[cfg(test)]
pub use item_repository::MockItemRepository;
#[cfg(test)]
pub use qty_history_repository::MockQtyHistoryRepository;
#[cfg(test)]
pub use scan_log_repository::MockScanLogRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
