//! Behavioural coverage for the quantity ledger and its surrounding
//! services, run against an in-memory store.
//!
//! The store implements the repository ports with the same transactional
//! discipline as the Diesel adapters: a quantity change either commits the
//! item update and its history entry together or leaves the store
//! untouched. A fault-injection switch simulates a failure between the two
//! writes to prove the rollback behaviour.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rstest::{fixture, rstest};
use tracing_subscriber::EnvFilter;

use warehouse_backend::domain::access::ListScope;
use warehouse_backend::domain::category::{Category, CategoryDraft, CategoryId};
use warehouse_backend::domain::category_service::CategoryService;
use warehouse_backend::domain::error::DomainError;
use warehouse_backend::domain::history::{
    ChangeType, NewQtyHistoryRecord, QtyHistoryDraft, QtyHistoryEntry,
};
use warehouse_backend::domain::identity::{IdentityContext, Role};
use warehouse_backend::domain::item::{Item, ItemDraft, ItemFieldUpdate, ItemId, ItemPatch};
use warehouse_backend::domain::item_service::ItemService;
use warehouse_backend::domain::ledger::{self, QtyChange, QtyChangeSpec};
use warehouse_backend::domain::ledger_service::{
    BulkUpdateEntry, LedgerService, QtyUpdateRequest,
};
use warehouse_backend::domain::ports::{
    CategoryDeleteOutcome, CategoryRepository, CategoryRepositoryError, DistinctFilterValues,
    HistoryFilter, ItemFilter, ItemMutationOutcome, ItemPage, ItemRepository,
    ItemRepositoryError, ItemSort, ItemSortField, LocationStats, QtyHistoryRepository,
    QtyHistoryRepositoryError, ScanLogFilter, ScanLogRepository, ScanLogRepositoryError,
    SortDirection, StockSummary,
};
use warehouse_backend::domain::scan::{NewScanLogRecord, ScanAction, ScanLogEntry};
use warehouse_backend::domain::scan_service::{CountOutcome, CountScan, ScanService};
use warehouse_backend::domain::user::UserId;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    items: BTreeMap<i64, Item>,
    history: Vec<QtyHistoryEntry>,
    scans: Vec<ScanLogEntry>,
    categories: BTreeMap<i64, Category>,
    next_item_id: i64,
    next_history_id: i64,
    next_scan_id: i64,
    next_category_id: i64,
    fail_before_history_insert: bool,
}

#[derive(Default)]
struct InMemoryWarehouse {
    state: Mutex<State>,
}

fn to_draft(item: &Item) -> ItemDraft {
    ItemDraft {
        article: item.article().to_owned(),
        komponen: item.komponen().to_owned(),
        purchase_order_ref: item.purchase_order_ref().map(ToOwned::to_owned),
        ordered_qty: item.ordered_qty(),
        qty: item.qty(),
        location_code: item.location_code().map(ToOwned::to_owned),
        min_stock: item.min_stock(),
        category_id: item.category_id(),
    }
}

fn entry_from_record(id: i64, record: NewQtyHistoryRecord) -> QtyHistoryEntry {
    QtyHistoryEntry::new(QtyHistoryDraft {
        id,
        item_id: record.item_id,
        article: record.article,
        old_qty: record.old_qty,
        new_qty: record.new_qty,
        change_amount: record.change_amount,
        change_type: record.change_type,
        notes: record.notes,
        updated_by: record.updated_by,
        created_at: Utc::now(),
    })
    .expect("ledger plans satisfy the audit invariants")
}

fn in_scope(scope: &ListScope, category_id: Option<CategoryId>) -> bool {
    match scope {
        ListScope::Unrestricted => true,
        ListScope::Category(category) => category_id == Some(*category),
    }
}

fn matches_filter(filter: &ItemFilter, item: &Item) -> bool {
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let haystacks = [
            Some(item.article()),
            Some(item.komponen()),
            item.purchase_order_ref(),
            item.location_code(),
        ];
        if !haystacks
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    if let Some(location_code) = &filter.location_code {
        if item.location_code() != Some(location_code.as_str()) {
            return false;
        }
    }
    if let Some(komponen) = &filter.komponen {
        if item.komponen() != komponen {
            return false;
        }
    }
    if filter.low_stock && !item.is_low_stock() {
        return false;
    }
    true
}

impl InMemoryWarehouse {
    fn set_fail_before_history_insert(&self, fail: bool) {
        self.state.lock().expect("state lock").fail_before_history_insert = fail;
    }

    fn stored_qty(&self, item_id: ItemId) -> Option<i32> {
        self.state
            .lock()
            .expect("state lock")
            .items
            .get(&item_id.as_i64())
            .map(Item::qty)
    }

    fn history_count(&self, item_id: ItemId) -> usize {
        self.state
            .lock()
            .expect("state lock")
            .history
            .iter()
            .filter(|entry| entry.item_id() == item_id)
            .count()
    }

    fn all_history(&self) -> Vec<QtyHistoryEntry> {
        self.state.lock().expect("state lock").history.clone()
    }

    fn scan_log(&self) -> Vec<ScanLogEntry> {
        self.state.lock().expect("state lock").scans.clone()
    }

    fn apply_mutation(
        &self,
        item_id: ItemId,
        fields: &ItemFieldUpdate,
        qty_change: Option<&QtyChangeSpec>,
        always_record: bool,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        let Some(current) = state.items.get(&item_id.as_i64()).cloned() else {
            return Ok(ItemMutationOutcome::NotFound);
        };

        let mut draft = to_draft(&current);
        if let Some(article) = &fields.article {
            draft.article = article.clone();
        }
        if let Some(komponen) = &fields.komponen {
            draft.komponen = komponen.clone();
        }
        if let Some(purchase_order_ref) = &fields.purchase_order_ref {
            draft.purchase_order_ref = purchase_order_ref.clone();
        }
        if let Some(ordered_qty) = fields.ordered_qty {
            draft.ordered_qty = ordered_qty;
        }
        if let Some(location_code) = &fields.location_code {
            draft.location_code = location_code.clone();
        }
        if let Some(min_stock) = fields.min_stock {
            draft.min_stock = min_stock;
        }
        if let Some(category_id) = fields.category_id {
            draft.category_id = category_id;
        }

        let mut entry = None;
        if let Some(spec) = qty_change {
            let skip = !always_record
                && matches!(spec.change, QtyChange::SetTo(target) if target == current.qty());
            if !skip {
                let plan = match ledger::plan_change(current.qty(), spec) {
                    Ok(plan) => plan,
                    Err(violation) => return Ok(ItemMutationOutcome::Rejected(violation)),
                };
                if state.fail_before_history_insert {
                    // A fault between the item update and the history
                    // insert rolls the whole transaction back; nothing in
                    // the store may change.
                    return Err(ItemRepositoryError::query(
                        "injected fault before history insert",
                    ));
                }
                draft.qty = plan.new_qty;
                let record = plan.into_record(item_id, &draft.article, &spec.updated_by);
                state.next_history_id += 1;
                entry = Some(entry_from_record(state.next_history_id, record));
            }
        }

        let updated = Item::new(item_id, draft, current.created_at(), Utc::now())
            .map_err(|err| ItemRepositoryError::query(err.to_string()))?;
        state.items.insert(item_id.as_i64(), updated.clone());
        if let Some(entry) = entry.clone() {
            state.history.push(entry);
        }
        Ok(ItemMutationOutcome::Updated {
            item: updated,
            history: entry,
        })
    }
}

#[async_trait]
impl ItemRepository for InMemoryWarehouse {
    async fn insert(
        &self,
        draft: &ItemDraft,
        created_by: &str,
    ) -> Result<Item, ItemRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        state.next_item_id += 1;
        let item_id = ItemId::new(state.next_item_id);
        let item = Item::new(item_id, draft.clone(), Utc::now(), Utc::now())
            .map_err(|err| ItemRepositoryError::query(err.to_string()))?;
        state.items.insert(item_id.as_i64(), item.clone());
        if item.qty() > 0 {
            let record = ledger::initial_stock_plan(item.qty()).into_record(
                item_id,
                item.article(),
                created_by,
            );
            state.next_history_id += 1;
            let entry = entry_from_record(state.next_history_id, record);
            state.history.push(entry);
        }
        Ok(item)
    }

    async fn find_by_id(&self, item_id: ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .items
            .get(&item_id.as_i64())
            .cloned())
    }

    async fn update(
        &self,
        item_id: ItemId,
        fields: ItemFieldUpdate,
        qty_change: Option<QtyChangeSpec>,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        self.apply_mutation(item_id, &fields, qty_change.as_ref(), false)
    }

    async fn apply_qty_change(
        &self,
        item_id: ItemId,
        spec: QtyChangeSpec,
    ) -> Result<ItemMutationOutcome, ItemRepositoryError> {
        self.apply_mutation(item_id, &ItemFieldUpdate::default(), Some(&spec), true)
    }

    async fn delete(
        &self,
        item_id: ItemId,
        deleted_by: &str,
    ) -> Result<Option<Item>, ItemRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        let Some(removed) = state.items.remove(&item_id.as_i64()) else {
            return Ok(None);
        };
        // The final entry is appended first, then the cascade clears the
        // item's whole trail, matching the database adapter.
        let record = ledger::deletion_plan(removed.qty()).into_record(
            item_id,
            removed.article(),
            deleted_by,
        );
        state.next_history_id += 1;
        let entry = entry_from_record(state.next_history_id, record);
        state.history.push(entry);
        state.history.retain(|entry| entry.item_id() != item_id);
        state.scans.retain(|entry| entry.item_id != item_id);
        Ok(Some(removed))
    }

    async fn list(
        &self,
        scope: &ListScope,
        filter: &ItemFilter,
    ) -> Result<ItemPage, ItemRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut matches: Vec<Item> = state
            .items
            .values()
            .filter(|item| in_scope(scope, item.category_id()) && matches_filter(filter, item))
            .cloned()
            .collect();
        match filter.sort {
            Some(ItemSort {
                field: ItemSortField::UpdatedAt,
                direction: SortDirection::Desc,
            }) => matches.sort_by(|a, b| b.updated_at().cmp(&a.updated_at())),
            _ => matches.sort_by(|a, b| {
                (a.location_code().unwrap_or(""), a.article())
                    .cmp(&(b.location_code().unwrap_or(""), b.article()))
            }),
        }
        let total = matches.len() as i64;
        let offset = usize::try_from(filter.offset.unwrap_or(0)).unwrap_or(0);
        let limit = usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(usize::MAX);
        let items = matches.into_iter().skip(offset).take(limit).collect();
        Ok(ItemPage { items, total })
    }

    async fn stats(&self, scope: &ListScope) -> Result<StockSummary, ItemRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let visible: Vec<&Item> = state
            .items
            .values()
            .filter(|item| in_scope(scope, item.category_id()))
            .collect();
        let mut by_location: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for item in &visible {
            if let Some(code) = item.location_code() {
                let slot = by_location.entry(code.to_owned()).or_default();
                slot.0 += 1;
                slot.1 += i64::from(item.qty());
            }
        }
        Ok(StockSummary {
            total_items: visible.len() as i64,
            total_qty: visible.iter().map(|item| i64::from(item.qty())).sum(),
            total_ordered_qty: visible
                .iter()
                .map(|item| i64::from(item.ordered_qty()))
                .sum(),
            low_stock_items: visible.iter().filter(|item| item.is_low_stock()).count() as i64,
            by_location: by_location
                .into_iter()
                .map(|(location_code, (item_count, total_qty))| LocationStats {
                    location_code,
                    item_count,
                    total_qty,
                })
                .collect(),
        })
    }

    async fn distinct_values(
        &self,
        scope: &ListScope,
    ) -> Result<DistinctFilterValues, ItemRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut komponen: Vec<String> = Vec::new();
        let mut location_codes: Vec<String> = Vec::new();
        for item in state
            .items
            .values()
            .filter(|item| in_scope(scope, item.category_id()))
        {
            if !komponen.iter().any(|value| value == item.komponen()) {
                komponen.push(item.komponen().to_owned());
            }
            if let Some(code) = item.location_code() {
                if !location_codes.iter().any(|value| value == code) {
                    location_codes.push(code.to_owned());
                }
            }
        }
        komponen.sort();
        location_codes.sort();
        Ok(DistinctFilterValues {
            komponen,
            location_codes,
        })
    }
}

#[async_trait]
impl QtyHistoryRepository for InMemoryWarehouse {
    async fn list_for_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut entries: Vec<QtyHistoryEntry> = state
            .history
            .iter()
            .filter(|entry| entry.item_id() == item_id)
            .filter(|entry| {
                filter
                    .change_type
                    .is_none_or(|change_type| entry.change_type() == change_type)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.id()));
        entries.truncate(usize::try_from(filter.limit.unwrap_or(50)).unwrap_or(usize::MAX));
        Ok(entries)
    }

    async fn list_all(
        &self,
        scope: &ListScope,
        filter: &HistoryFilter,
    ) -> Result<Vec<QtyHistoryEntry>, QtyHistoryRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut entries: Vec<QtyHistoryEntry> = state
            .history
            .iter()
            .filter(|entry| {
                state
                    .items
                    .get(&entry.item_id().as_i64())
                    .is_some_and(|item| in_scope(scope, item.category_id()))
            })
            .filter(|entry| {
                filter
                    .change_type
                    .is_none_or(|change_type| entry.change_type() == change_type)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.id()));
        entries.truncate(usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(usize::MAX));
        Ok(entries)
    }
}

#[async_trait]
impl ScanLogRepository for InMemoryWarehouse {
    async fn record(
        &self,
        record: &NewScanLogRecord,
    ) -> Result<ScanLogEntry, ScanLogRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        state.next_scan_id += 1;
        let entry = ScanLogEntry {
            id: state.next_scan_id,
            item_id: record.item_id,
            article: record.article.clone(),
            scan_type: record.scan_type,
            scan_data: record.scan_data.clone(),
            action: record.action,
            result: record.result.clone(),
            scanned_by: record.scanned_by.clone(),
            created_at: Utc::now(),
        };
        state.scans.push(entry.clone());
        Ok(entry)
    }

    async fn list(
        &self,
        scope: &ListScope,
        filter: &ScanLogFilter,
    ) -> Result<Vec<ScanLogEntry>, ScanLogRepositoryError> {
        let state = self.state.lock().expect("state lock");
        let mut entries: Vec<ScanLogEntry> = state
            .scans
            .iter()
            .filter(|entry| {
                state
                    .items
                    .get(&entry.item_id.as_i64())
                    .is_some_and(|item| in_scope(scope, item.category_id()))
            })
            .filter(|entry| filter.action.is_none_or(|action| entry.action == action))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.id));
        entries.truncate(usize::try_from(filter.limit.unwrap_or(100)).unwrap_or(usize::MAX));
        Ok(entries)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryWarehouse {
    async fn insert(&self, draft: &CategoryDraft) -> Result<Category, CategoryRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        if state
            .categories
            .values()
            .any(|category| category.name() == draft.name)
        {
            return Err(CategoryRepositoryError::duplicate_name(&draft.name));
        }
        state.next_category_id += 1;
        let category = Category::new(
            CategoryId::new(state.next_category_id),
            draft.clone(),
            Utc::now(),
            Utc::now(),
        )
        .map_err(|err| CategoryRepositoryError::query(err.to_string()))?;
        state
            .categories
            .insert(category.id().as_i64(), category.clone());
        Ok(category)
    }

    async fn update(
        &self,
        category_id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        if !state.categories.contains_key(&category_id.as_i64()) {
            return Ok(None);
        }
        let category = Category::new(category_id, draft.clone(), Utc::now(), Utc::now())
            .map_err(|err| CategoryRepositoryError::query(err.to_string()))?;
        state
            .categories
            .insert(category_id.as_i64(), category.clone());
        Ok(Some(category))
    }

    async fn find_by_id(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .categories
            .get(&category_id.as_i64())
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .categories
            .values()
            .cloned()
            .collect())
    }

    async fn delete(
        &self,
        category_id: CategoryId,
    ) -> Result<CategoryDeleteOutcome, CategoryRepositoryError> {
        let mut state = self.state.lock().expect("state lock");
        if !state.categories.contains_key(&category_id.as_i64()) {
            return Ok(CategoryDeleteOutcome::NotFound);
        }
        let items = state
            .items
            .values()
            .filter(|item| item.category_id() == Some(category_id))
            .count() as i64;
        if items > 0 {
            return Ok(CategoryDeleteOutcome::Referenced { items, users: 0 });
        }
        state.categories.remove(&category_id.as_i64());
        Ok(CategoryDeleteOutcome::Deleted)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Warehouse {
    store: Arc<InMemoryWarehouse>,
    items: ItemService<InMemoryWarehouse, InMemoryWarehouse>,
    ledger: LedgerService<InMemoryWarehouse, InMemoryWarehouse>,
    scans: ScanService<InMemoryWarehouse, InMemoryWarehouse, InMemoryWarehouse>,
    categories: CategoryService<InMemoryWarehouse>,
}

#[fixture]
fn warehouse() -> Warehouse {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init();
    let store = Arc::new(InMemoryWarehouse::default());
    Warehouse {
        items: ItemService::new(Arc::clone(&store), Arc::clone(&store)),
        ledger: LedgerService::new(Arc::clone(&store), Arc::clone(&store)),
        scans: ScanService::new(
            Arc::clone(&store),
            LedgerService::new(Arc::clone(&store), Arc::clone(&store)),
            Arc::clone(&store),
        ),
        categories: CategoryService::new(Arc::clone(&store)),
        store,
    }
}

fn admin() -> IdentityContext {
    IdentityContext::new(UserId::new(1), "admin", Role::Admin, None)
}

fn staff(category: i64) -> IdentityContext {
    IdentityContext::new(
        UserId::new(2),
        "dewi",
        Role::Staff,
        Some(CategoryId::new(category)),
    )
}

fn operator() -> IdentityContext {
    IdentityContext::new(UserId::new(3), "scanner", Role::Operator, None)
}

fn adjust(delta: i32) -> QtyUpdateRequest {
    QtyUpdateRequest {
        change: QtyChange::Adjust(delta),
        change_type: None,
        notes: None,
    }
}

fn set_to(target: i32) -> QtyUpdateRequest {
    QtyUpdateRequest {
        change: QtyChange::SetTo(target),
        change_type: None,
        notes: None,
    }
}

async fn create_item(warehouse: &Warehouse, article: &str, qty: i32) -> Item {
    warehouse
        .items
        .create(
            &admin(),
            ItemDraft {
                article: article.to_owned(),
                komponen: "Component".to_owned(),
                qty,
                ..ItemDraft::default()
            },
        )
        .await
        .expect("create succeeds")
}

async fn create_item_in_category(
    warehouse: &Warehouse,
    article: &str,
    qty: i32,
    category: CategoryId,
) -> Item {
    warehouse
        .items
        .create(
            &admin(),
            ItemDraft {
                article: article.to_owned(),
                komponen: "Component".to_owned(),
                qty,
                category_id: Some(category),
                ..ItemDraft::default()
            },
        )
        .await
        .expect("create succeeds")
}

async fn create_category(warehouse: &Warehouse, name: &str) -> Category {
    warehouse
        .categories
        .create(
            &admin(),
            CategoryDraft {
                name: name.to_owned(),
                description: None,
            },
        )
        .await
        .expect("category create succeeds")
}

// ---------------------------------------------------------------------------
// Creation and audit bootstrap
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn creating_with_opening_stock_writes_one_inbound_entry(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 7).await;

    let history = warehouse
        .ledger
        .list_history(&admin(), item.id(), &HistoryFilter::default())
        .await
        .expect("history read succeeds");
    assert_eq!(history.len(), 1);
    let entry = history.first().expect("one entry");
    assert_eq!(entry.old_qty(), 0);
    assert_eq!(entry.new_qty(), 7);
    assert_eq!(entry.change_amount(), 7);
    assert_eq!(entry.change_type(), ChangeType::Inbound);
    assert_eq!(entry.notes(), Some("Initial stock creation"));
    assert_eq!(entry.updated_by(), "admin");
}

#[rstest]
#[tokio::test]
async fn creating_without_stock_writes_no_history(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 0).await;
    assert_eq!(warehouse.store.history_count(item.id()), 0);
}

// ---------------------------------------------------------------------------
// Ledger rule violations leave no trace
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn zero_adjustment_fails_without_touching_the_store(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 10).await;

    let error = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(0))
        .await
        .expect_err("zero adjustment rejected");
    assert_eq!(error, DomainError::validation("adjustment must be nonzero"));
    assert_eq!(warehouse.store.stored_qty(item.id()), Some(10));
    assert_eq!(warehouse.store.history_count(item.id()), 1);
}

#[rstest]
#[tokio::test]
async fn negative_target_fails_without_touching_the_store(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 10).await;

    let error = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), set_to(-1))
        .await
        .expect_err("negative target rejected");
    assert_eq!(
        error,
        DomainError::validation("quantity cannot be negative")
    );
    assert_eq!(warehouse.store.stored_qty(item.id()), Some(10));
    assert_eq!(warehouse.store.history_count(item.id()), 1);
}

#[rstest]
#[tokio::test]
async fn overdraw_fails_then_a_smaller_adjustment_applies(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 10).await;

    let error = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-15))
        .await
        .expect_err("overdraw rejected");
    assert_eq!(
        error,
        DomainError::validation("quantity cannot be negative")
    );
    assert_eq!(warehouse.store.stored_qty(item.id()), Some(10));

    let applied = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-3))
        .await
        .expect("smaller adjustment applies");
    assert_eq!(applied.item.qty(), 7);
    assert_eq!(applied.history.change_type(), ChangeType::Adjustment);
    assert_eq!(applied.history.change_amount(), -3);
}

// ---------------------------------------------------------------------------
// Atomicity under fault injection
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn a_fault_before_the_history_insert_rolls_everything_back(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 8).await;
    warehouse.store.set_fail_before_history_insert(true);

    let error = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-1))
        .await
        .expect_err("injected fault surfaces");
    assert!(matches!(error, DomainError::Internal { .. }));
    // The item keeps its pre-call quantity and no orphan history row exists.
    assert_eq!(warehouse.store.stored_qty(item.id()), Some(8));
    assert_eq!(warehouse.store.history_count(item.id()), 1);

    warehouse.store.set_fail_before_history_insert(false);
    let applied = warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-1))
        .await
        .expect("retry applies cleanly");
    assert_eq!(applied.item.qty(), 7);
    assert_eq!(warehouse.store.history_count(item.id()), 2);
}

// ---------------------------------------------------------------------------
// Category scoping
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn staff_cannot_touch_or_see_foreign_categories(warehouse: Warehouse) {
    let own = create_category(&warehouse, "Bearings").await;
    let foreign = create_category(&warehouse, "Fasteners").await;
    let visible = create_item_in_category(&warehouse, "Bearing 608", 5, own.id()).await;
    let hidden = create_item_in_category(&warehouse, "M8 bolt", 5, foreign.id()).await;

    let identity = staff(own.id().as_i64());
    let error = warehouse
        .items
        .update(
            &identity,
            hidden.id(),
            ItemPatch {
                min_stock: Some(1),
                ..ItemPatch::default()
            },
        )
        .await
        .expect_err("cross-category update denied");
    assert!(matches!(error, DomainError::PermissionDenied { .. }));

    let page = warehouse
        .items
        .list(&identity, &ItemFilter::default())
        .await
        .expect("list succeeds");
    assert_eq!(page.total, 1);
    assert!(page.items.iter().all(|item| item.id() == visible.id()));

    let error = warehouse
        .items
        .get(&identity, hidden.id())
        .await
        .expect_err("cross-category read hidden");
    assert!(matches!(error, DomainError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Bulk updates
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn bulk_update_skips_the_entry_that_would_go_negative(warehouse: Warehouse) {
    let first = create_item(&warehouse, "Item A", 5).await;
    let second = create_item(&warehouse, "Item B", 1).await;
    let third = create_item(&warehouse, "Item C", 5).await;

    let outcome = warehouse
        .ledger
        .bulk_apply(
            &admin(),
            vec![
                BulkUpdateEntry {
                    item_id: first.id(),
                    change: QtyChange::Adjust(-3),
                },
                BulkUpdateEntry {
                    item_id: second.id(),
                    change: QtyChange::Adjust(-3),
                },
                BulkUpdateEntry {
                    item_id: third.id(),
                    change: QtyChange::Adjust(-3),
                },
            ],
            None,
            None,
        )
        .await
        .expect("bulk apply succeeds");

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.succeeded(), 2);
    assert!(outcome
        .results
        .iter()
        .all(|result| result.item_id != second.id()));
    assert_eq!(warehouse.store.stored_qty(second.id()), Some(1));
    // Only the initial-stock entry exists for the skipped item.
    assert_eq!(warehouse.store.history_count(second.id()), 1);
    assert_eq!(warehouse.store.stored_qty(first.id()), Some(2));
    assert_eq!(warehouse.store.stored_qty(third.id()), Some(2));
}

// ---------------------------------------------------------------------------
// Scanner flows
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn qr_absolute_set_classifies_by_resulting_delta(warehouse: Warehouse) {
    let drained = create_item(&warehouse, "Bearing 608", 4).await;
    let applied = warehouse
        .scans
        .qr_quick_update(&operator(), &drained.id().to_string(), set_to(0))
        .await
        .expect("quick update succeeds");
    // Setting 4 → 0 is a negative delta, so the scanner default lands on
    // outbound rather than qr_scan.
    assert_eq!(applied.history.change_type(), ChangeType::Outbound);
    assert_eq!(applied.history.change_amount(), -4);

    let unchanged = create_item(&warehouse, "Bearing 625", 4).await;
    let applied = warehouse
        .scans
        .qr_quick_update(&operator(), &unchanged.id().to_string(), set_to(4))
        .await
        .expect("quick update succeeds");
    assert_eq!(applied.history.change_type(), ChangeType::QrScan);
    assert_eq!(applied.history.change_amount(), 0);

    let update_logs: Vec<_> = warehouse
        .store
        .scan_log()
        .into_iter()
        .filter(|entry| entry.action == ScanAction::Update)
        .collect();
    assert_eq!(update_logs.len(), 2);
    assert!(update_logs
        .iter()
        .any(|entry| entry.result == "Qty updated: 4 → 0"));
}

#[rstest]
#[tokio::test]
async fn qr_search_resolves_label_codes_and_logs_the_lookup(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 4).await;
    let code = format!("ITEM{:06}", item.id().as_i64());

    let matches = warehouse
        .scans
        .qr_search(&operator(), &code)
        .await
        .expect("search succeeds");
    assert_eq!(matches.len(), 1);

    let log = warehouse.store.scan_log();
    let entry = log.first().expect("one scan log entry");
    assert_eq!(entry.action, ScanAction::Search);
    assert_eq!(entry.result, "Found 1 items");
    assert_eq!(entry.scan_data, code);
}

#[rstest]
#[tokio::test]
async fn inventory_count_logs_and_reports_discrepancies(warehouse: Warehouse) {
    let exact = create_item(&warehouse, "Bearing 608", 7).await;
    let off = create_item(&warehouse, "Bearing 625", 7).await;

    let outcome = warehouse
        .scans
        .inventory_count(
            &operator(),
            vec![
                CountScan {
                    scan_data: exact.id().to_string(),
                    counted_qty: 7,
                },
                CountScan {
                    scan_data: off.id().to_string(),
                    counted_qty: 3,
                },
                CountScan {
                    scan_data: "no such payload".to_owned(),
                    counted_qty: 1,
                },
            ],
        )
        .await
        .expect("count succeeds");

    assert_eq!(outcome.total_scanned, 3);
    assert_eq!(outcome.discrepancies.len(), 1);
    let discrepancy = outcome.discrepancies.first().expect("one discrepancy");
    assert_eq!(discrepancy.item_id, off.id());
    assert_eq!(discrepancy.difference, -4);
    assert!(matches!(
        outcome.results.last(),
        Some(CountOutcome::Unresolved { .. })
    ));

    let check_ins: Vec<_> = warehouse
        .store
        .scan_log()
        .into_iter()
        .filter(|entry| entry.action == ScanAction::CheckIn)
        .collect();
    assert_eq!(check_ins.len(), 2);
    assert!(check_ins
        .iter()
        .any(|entry| entry.result == "Counted: 3, System: 7"));
    // Counting never mutates stock; reconciliation is a separate decision.
    assert_eq!(warehouse.store.stored_qty(off.id()), Some(7));
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn deleting_an_item_makes_it_and_its_history_unreachable(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 9).await;
    warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-2))
        .await
        .expect("adjustment applies");

    let removed = warehouse
        .items
        .delete(&admin(), item.id())
        .await
        .expect("delete succeeds");
    assert_eq!(removed.qty(), 7);

    let error = warehouse
        .items
        .get(&admin(), item.id())
        .await
        .expect_err("item gone");
    assert!(matches!(error, DomainError::NotFound { .. }));
    let error = warehouse
        .ledger
        .list_history(&admin(), item.id(), &HistoryFilter::default())
        .await
        .expect_err("history gone with the item");
    assert!(matches!(error, DomainError::NotFound { .. }));
    assert_eq!(warehouse.store.history_count(item.id()), 0);
}

#[rstest]
#[tokio::test]
async fn delete_is_admin_only_even_for_category_owners(warehouse: Warehouse) {
    let category = create_category(&warehouse, "Bearings").await;
    let item = create_item_in_category(&warehouse, "Bearing 608", 4, category.id()).await;

    let error = warehouse
        .items
        .delete(&staff(category.id().as_i64()), item.id())
        .await
        .expect_err("staff delete denied");
    assert!(matches!(error, DomainError::PermissionDenied { .. }));
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn category_deletion_is_blocked_while_items_reference_it(warehouse: Warehouse) {
    let category = create_category(&warehouse, "Bearings").await;
    let item = create_item_in_category(&warehouse, "Bearing 608", 4, category.id()).await;

    let error = warehouse
        .categories
        .delete(&admin(), category.id())
        .await
        .expect_err("referenced category is protected");
    assert!(matches!(error, DomainError::Conflict { .. }));

    warehouse
        .items
        .delete(&admin(), item.id())
        .await
        .expect("item delete succeeds");
    warehouse
        .categories
        .delete(&admin(), category.id())
        .await
        .expect("unreferenced category deletes");
}

// ---------------------------------------------------------------------------
// Audit invariants over a mixed sequence
// ---------------------------------------------------------------------------

#[rstest]
#[tokio::test]
async fn every_recorded_entry_satisfies_the_arithmetic_invariants(warehouse: Warehouse) {
    let item = create_item(&warehouse, "Bearing 608", 10).await;
    let requests = [
        adjust(-3),
        set_to(20),
        adjust(5),
        set_to(0),
        adjust(12),
    ];
    for request in requests {
        warehouse
            .ledger
            .apply_detail_update(&admin(), item.id(), request)
            .await
            .expect("change applies");
    }
    // Rejected attempts along the way must not add entries.
    warehouse
        .ledger
        .apply_detail_update(&admin(), item.id(), adjust(-100))
        .await
        .expect_err("overdraw rejected");

    let entries = warehouse.store.all_history();
    assert_eq!(entries.len(), 6);
    for entry in &entries {
        assert_eq!(entry.new_qty(), entry.old_qty() + entry.change_amount());
        assert!(entry.new_qty() >= 0);
    }
    assert_eq!(warehouse.store.stored_qty(item.id()), Some(12));
}
