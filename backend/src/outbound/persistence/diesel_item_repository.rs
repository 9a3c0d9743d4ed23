//! PostgreSQL-backed `ItemRepository` implementation using Diesel.
//!
//! Quantity mutations lock the item row (`SELECT ... FOR UPDATE`), re-read
//! the stored quantity, plan the change through the domain ledger, and
//! write the item update and history insert in the same transaction. A
//! ledger rule violation rolls the transaction back and surfaces as a
//! rejected outcome rather than an adapter error.

use async_trait::async_trait;
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::access::ListScope;
use crate::domain::category::CategoryId;
use crate::domain::item::{Item, ItemDraft, ItemFieldUpdate, ItemId};
use crate::domain::ledger::{self, LedgerViolation, QtyChange, QtyChangeSpec};
use crate::domain::ports::{
    DistinctFilterValues, ItemFilter, ItemMutationOutcome, ItemPage, ItemRepository,
    ItemRepositoryError, ItemSort, ItemSortField, LocationStats, SortDirection, StockSummary,
};

use super::diesel_helpers::{history_from_row, item_from_row, map_diesel_error, map_pool_error};
use super::models::{ItemChangeset, ItemRow, NewItemRow, NewQtyHistoryRow, QtyHistoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{items, qty_history};

/// Default page size when the caller does not paginate explicitly.
const DEFAULT_PAGE_SIZE: i64 = 100;

/// Diesel-backed implementation of the item repository port.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> ItemRepositoryError {
    map_pool_error(error, ItemRepositoryError::connection)
}

fn map_db(error: diesel::result::Error) -> ItemRepositoryError {
    map_diesel_error(
        error,
        ItemRepositoryError::query,
        ItemRepositoryError::connection,
    )
}

/// Failure raised inside a mutation transaction; a rejected plan rolls the
/// transaction back exactly like a database error would.
enum TxFailure {
    Db(diesel::result::Error),
    Rejected(LedgerViolation),
}

impl From<diesel::result::Error> for TxFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

enum TxResult {
    Missing,
    Mutated {
        item: ItemRow,
        history: Option<QtyHistoryRow>,
    },
}

/// Whether an absolute set equal to the stored quantity still records a
/// history entry.
#[derive(Clone, Copy)]
enum QtyWritePolicy {
    SkipWhenUnchanged,
    AlwaysRecord,
}

fn changeset_from(fields: &ItemFieldUpdate) -> ItemChangeset {
    ItemChangeset {
        article: fields.article.clone(),
        komponen: fields.komponen.clone(),
        purchase_order_ref: fields.purchase_order_ref.clone(),
        ordered_qty: fields.ordered_qty,
        location_code: fields.location_code.clone(),
        min_stock: fields.min_stock,
        category_id: fields.category_id.map(|c| c.map(CategoryId::as_i64)),
    }
}

fn new_history_row<'a>(record: &'a crate::domain::history::NewQtyHistoryRecord) -> NewQtyHistoryRow<'a> {
    NewQtyHistoryRow {
        item_id: record.item_id.as_i64(),
        article: &record.article,
        old_qty: record.old_qty,
        new_qty: record.new_qty,
        change_amount: record.change_amount,
        change_type: record.change_type.as_str(),
        notes: record.notes.as_deref(),
        updated_by: &record.updated_by,
    }
}

/// Boxed query over the items table with an arbitrary select clause.
type BoxedItems<'a, ST> = items::BoxedQuery<'a, diesel::pg::Pg, ST>;

/// Apply the category scope to an already-boxed query.
fn apply_scope<ST>(
    mut query: BoxedItems<'static, ST>,
    scope: &ListScope,
) -> BoxedItems<'static, ST> {
    if let ListScope::Category(category) = scope {
        query = query.filter(items::category_id.eq(category.as_i64()));
    }
    query
}

/// Apply the scope plus the caller's filters to an already-boxed query.
fn apply_filters<ST>(
    query: BoxedItems<'static, ST>,
    scope: &ListScope,
    filter: &ItemFilter,
) -> BoxedItems<'static, ST> {
    let mut query = apply_scope(query, scope);
    if let Some(search) = &filter.search {
        let pattern = format!("%{search}%");
        query = query.filter(
            items::article
                .ilike(pattern.clone())
                .or(items::komponen.ilike(pattern.clone()))
                .or(items::purchase_order_ref.ilike(pattern.clone()))
                .or(items::location_code.ilike(pattern)),
        );
    }
    if let Some(location_code) = &filter.location_code {
        query = query.filter(items::location_code.eq(location_code.clone()));
    }
    if let Some(komponen) = &filter.komponen {
        query = query.filter(items::komponen.eq(komponen.clone()));
    }
    if filter.low_stock {
        query = query.filter(items::qty.le(items::min_stock));
    }
    query
}

fn sorted<ST>(
    query: BoxedItems<'static, ST>,
    sort: Option<ItemSort>,
) -> BoxedItems<'static, ST> {
    let Some(sort) = sort else {
        return query.order((items::location_code.asc(), items::article.asc()));
    };
    match (sort.field, sort.direction) {
        (ItemSortField::Article, SortDirection::Asc) => query.order(items::article.asc()),
        (ItemSortField::Article, SortDirection::Desc) => query.order(items::article.desc()),
        (ItemSortField::Komponen, SortDirection::Asc) => query.order(items::komponen.asc()),
        (ItemSortField::Komponen, SortDirection::Desc) => query.order(items::komponen.desc()),
        (ItemSortField::LocationCode, SortDirection::Asc) => {
            query.order(items::location_code.asc())
        }
        (ItemSortField::LocationCode, SortDirection::Desc) => {
            query.order(items::location_code.desc())
        }
        (ItemSortField::Qty, SortDirection::Asc) => query.order(items::qty.asc()),
        (ItemSortField::Qty, SortDirection::Desc) => query.order(items::qty.desc()),
        (ItemSortField::MinStock, SortDirection::Asc) => query.order(items::min_stock.asc()),
        (ItemSortField::MinStock, SortDirection::Desc) => query.order(items::min_stock.desc()),
        (ItemSortField::UpdatedAt, SortDirection::Asc) => query.order(items::updated_at.asc()),
        (ItemSortField::UpdatedAt, SortDirection::Desc) => query.order(items::updated_at.desc()),
    }
}

impl DieselItemRepository {
    async fn mutate(
        &self,
        item_id: ItemId,
        fields: &ItemFieldUpdate,
        qty_change: Option<&QtyChangeSpec>,
        policy: QtyWritePolicy,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let result = conn
            .transaction::<TxResult, TxFailure, _>(|conn| {
                async move {
                    let locked: Option<ItemRow> = items::table
                        .find(item_id.as_i64())
                        .for_update()
                        .select(ItemRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(current) = locked else {
                        return Ok(TxResult::Missing);
                    };

                    if !fields.is_empty() {
                        diesel::update(items::table.find(item_id.as_i64()))
                            .set(changeset_from(fields))
                            .execute(conn)
                            .await?;
                    }

                    let mut history = None;
                    if let Some(spec) = qty_change {
                        let skip = matches!(policy, QtyWritePolicy::SkipWhenUnchanged)
                            && matches!(spec.change, QtyChange::SetTo(target) if target == current.qty);
                        if !skip {
                            let plan = ledger::plan_change(current.qty, spec)
                                .map_err(TxFailure::Rejected)?;
                            // Snapshot the name as of this change, including a
                            // rename applied in the same call.
                            let article =
                                fields.article.as_deref().unwrap_or(current.article.as_str());
                            diesel::update(items::table.find(item_id.as_i64()))
                                .set(items::qty.eq(plan.new_qty))
                                .execute(conn)
                                .await?;
                            let record = plan.into_record(item_id, article, &spec.updated_by);
                            let row: QtyHistoryRow = diesel::insert_into(qty_history::table)
                                .values(new_history_row(&record))
                                .returning(QtyHistoryRow::as_returning())
                                .get_result(conn)
                                .await?;
                            history = Some(row);
                        }
                    }

                    let stored: ItemRow = items::table
                        .find(item_id.as_i64())
                        .select(ItemRow::as_select())
                        .first(conn)
                        .await?;
                    Ok(TxResult::Mutated {
                        item: stored,
                        history,
                    })
                }
                .scope_boxed()
            })
            .await;

        match result {
            Ok(TxResult::Missing) => Ok(ItemMutationOutcome::NotFound),
            Ok(TxResult::Mutated { item, history }) => {
                let item = item_from_row(item, ItemRepositoryError::query)?;
                let history = history
                    .map(|row| history_from_row(row, ItemRepositoryError::query))
                    .transpose()?;
                Ok(ItemMutationOutcome::Updated { item, history })
            }
            Err(TxFailure::Rejected(violation)) => Ok(ItemMutationOutcome::Rejected(violation)),
            Err(TxFailure::Db(error)) => Err(map_db(error)),
        }
    }
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn insert(
        &self,
        draft: &ItemDraft,
        created_by: &str,
    ) -> Result<Item, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = conn
            .transaction::<ItemRow, diesel::result::Error, _>(|conn| {
                async move {
                    let row: ItemRow = diesel::insert_into(items::table)
                        .values(NewItemRow {
                            article: &draft.article,
                            komponen: &draft.komponen,
                            purchase_order_ref: draft.purchase_order_ref.as_deref(),
                            ordered_qty: draft.ordered_qty,
                            qty: draft.qty,
                            location_code: draft.location_code.as_deref(),
                            min_stock: draft.min_stock,
                            category_id: draft.category_id.map(CategoryId::as_i64),
                        })
                        .returning(ItemRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if row.qty > 0 {
                        let record = ledger::initial_stock_plan(row.qty).into_record(
                            ItemId::new(row.id),
                            &row.article,
                            created_by,
                        );
                        diesel::insert_into(qty_history::table)
                            .values(new_history_row(&record))
                            .execute(conn)
                            .await?;
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_db)?;
        item_from_row(row, ItemRepositoryError::query)
    }

    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = items::table
            .find(item_id.as_i64())
            .select(ItemRow::as_select())
            .first::<ItemRow>(&mut conn)
            .await
            .optional()
            .map_err(map_db)?;
        row.map(|row| item_from_row(row, ItemRepositoryError::query))
            .transpose()
    }

    async fn update(
        &self,
        item_id: ItemId,
        fields: ItemFieldUpdate,
        qty_change: Option<QtyChangeSpec>,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        self.mutate(
            item_id,
            &fields,
            qty_change.as_ref(),
            QtyWritePolicy::SkipWhenUnchanged,
        )
        .await
    }

    async fn apply_qty_change(
        &self,
        item_id: ItemId,
        spec: QtyChangeSpec,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        self.mutate(
            item_id,
            &ItemFieldUpdate::default(),
            Some(&spec),
            QtyWritePolicy::AlwaysRecord,
        )
        .await
    }

    async fn delete(
        &self,
        item_id: ItemId,
        deleted_by: &str,
    ) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let removed = conn
            .transaction::<Option<ItemRow>, diesel::result::Error, _>(|conn| {
                async move {
                    let locked: Option<ItemRow> = items::table
                        .find(item_id.as_i64())
                        .for_update()
                        .select(ItemRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(current) = locked else {
                        return Ok(None);
                    };
                    // The final zeroing-out entry is recorded before the row
                    // goes away; the cascade then clears the item's trail.
                    let record = ledger::deletion_plan(current.qty).into_record(
                        ItemId::new(current.id),
                        &current.article,
                        deleted_by,
                    );
                    diesel::insert_into(qty_history::table)
                        .values(new_history_row(&record))
                        .execute(conn)
                        .await?;
                    diesel::delete(items::table.find(item_id.as_i64()))
                        .execute(conn)
                        .await?;
                    Ok(Some(current))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_db)?;
        removed
            .map(|row| item_from_row(row, ItemRepositoryError::query))
            .transpose()
    }

    async fn list(
        &self,
        scope: &ListScope,
        filter: &ItemFilter,
    ) -> Result<ItemPage, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = filter.offset.unwrap_or(0);

        let rows_query = apply_filters(
            items::table.select(ItemRow::as_select()).into_boxed(),
            scope,
            filter,
        );
        let rows: Vec<ItemRow> = sorted(rows_query, filter.sort)
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await
            .map_err(map_db)?;
        let total: i64 = apply_filters(items::table.count().into_boxed(), scope, filter)
            .get_result(&mut conn)
            .await
            .map_err(map_db)?;

        let items = rows
            .into_iter()
            .map(|row| item_from_row(row, ItemRepositoryError::query))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ItemPage { items, total })
    }

    async fn stats(&self, scope: &ListScope) -> Result<StockSummary, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let total_items: i64 = apply_scope(items::table.count().into_boxed(), scope)
            .get_result(&mut conn)
            .await
            .map_err(map_db)?;
        let total_qty: Option<i64> =
            apply_scope(items::table.select(sum(items::qty)).into_boxed(), scope)
                .first(&mut conn)
                .await
                .map_err(map_db)?;
        let total_ordered_qty: Option<i64> = apply_scope(
            items::table.select(sum(items::ordered_qty)).into_boxed(),
            scope,
        )
        .first(&mut conn)
        .await
        .map_err(map_db)?;
        let low_stock_items: i64 = apply_scope(items::table.count().into_boxed(), scope)
            .filter(items::qty.le(items::min_stock))
            .get_result(&mut conn)
            .await
            .map_err(map_db)?;

        // Typed group-by queries cannot be boxed, so the scope arms are
        // spelled out.
        let location_rows: Vec<(Option<String>, i64, Option<i64>)> = match scope {
            ListScope::Unrestricted => {
                items::table
                    .filter(items::location_code.is_not_null())
                    .group_by(items::location_code)
                    .select((items::location_code, count_star(), sum(items::qty)))
                    .order_by(count_star().desc())
                    .load(&mut conn)
                    .await
            }
            ListScope::Category(category) => {
                items::table
                    .filter(items::category_id.eq(category.as_i64()))
                    .filter(items::location_code.is_not_null())
                    .group_by(items::location_code)
                    .select((items::location_code, count_star(), sum(items::qty)))
                    .order_by(count_star().desc())
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_db)?;

        let by_location = location_rows
            .into_iter()
            .filter_map(|(location_code, item_count, qty)| {
                location_code.map(|location_code| LocationStats {
                    location_code,
                    item_count,
                    total_qty: qty.unwrap_or(0),
                })
            })
            .collect();

        Ok(StockSummary {
            total_items,
            total_qty: total_qty.unwrap_or(0),
            total_ordered_qty: total_ordered_qty.unwrap_or(0),
            low_stock_items,
            by_location,
        })
    }

    async fn distinct_values(
        &self,
        scope: &ListScope,
    ) -> Result<DistinctFilterValues, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let komponen: Vec<String> = apply_scope(
            items::table
                .select(items::komponen)
                .distinct()
                .order(items::komponen.asc())
                .into_boxed(),
            scope,
        )
        .load(&mut conn)
        .await
        .map_err(map_db)?;
        let location_codes: Vec<Option<String>> = apply_scope(
            items::table
                .select(items::location_code)
                .distinct()
                .order(items::location_code.asc())
                .into_boxed(),
            scope,
        )
        .filter(items::location_code.is_not_null())
        .load(&mut conn)
        .await
        .map_err(map_db)?;

        Ok(DistinctFilterValues {
            komponen,
            location_codes: location_codes.into_iter().flatten().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and changeset construction.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool(PoolError::checkout("connection refused"));
        assert!(matches!(err, ItemRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn diesel_not_found_maps_to_query_error() {
        let err = map_db(diesel::result::Error::NotFound);
        assert!(matches!(err, ItemRepositoryError::Query { .. }));
    }

    #[rstest]
    fn changeset_preserves_nested_null_semantics() {
        let fields = ItemFieldUpdate {
            article: Some("Bearing".to_owned()),
            purchase_order_ref: Some(None),
            category_id: Some(Some(CategoryId::new(2))),
            ..ItemFieldUpdate::default()
        };
        let changeset = changeset_from(&fields);
        assert_eq!(changeset.article.as_deref(), Some("Bearing"));
        assert_eq!(changeset.purchase_order_ref, Some(None));
        assert_eq!(changeset.category_id, Some(Some(2)));
        assert_eq!(changeset.komponen, None);
    }

    #[rstest]
    fn history_rows_borrow_the_record_fields() {
        let record = ledger::initial_stock_plan(7).into_record(
            ItemId::new(3),
            "Bearing 608",
            "dewi",
        );
        let row = new_history_row(&record);
        assert_eq!(row.item_id, 3);
        assert_eq!(row.change_type, "inbound");
        assert_eq!(row.notes, Some("Initial stock creation"));
    }
}
