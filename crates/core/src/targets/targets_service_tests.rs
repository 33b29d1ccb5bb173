//! Unit tests for the target service.

use super::*;
use crate::aggregation::ItemFilter;
use crate::deltas::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, DeltaRepositoryTrait, DeltaSnapshot,
    DeltaSource, InMemoryDeltaRepository, ItemDeltaKey, ItemDeltaUpdate,
};
use crate::errors::{Error, Result, ScopeError};
use crate::facts::{AgentDirectory, FactTable, SalesFact};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Implementations
// ============================================================================

#[derive(Default)]
struct MockDeltaRepository {
    class_deltas: HashMap<ClassDeltaKey, DeltaRecord>,
    item_deltas: HashMap<ItemDeltaKey, DeltaRecord>,
    legacy_money: HashMap<ClassDeltaKey, Decimal>,
    upserts: Mutex<Vec<ClassDeltaUpdate>>,
}

impl MockDeltaRepository {
    fn with_class(mut self, account: &str, class: &str, qty: Decimal) -> Self {
        self.class_deltas
            .insert(ClassDeltaKey::new(account, class), record(qty));
        self
    }

    fn with_item(mut self, account: &str, class: &str, item: &str, qty: Decimal) -> Self {
        self.item_deltas
            .insert(ItemDeltaKey::new(account, class, item), record(qty));
        self
    }

    fn with_legacy(mut self, account: &str, class: &str, money: Decimal) -> Self {
        self.legacy_money
            .insert(ClassDeltaKey::new(account, class), money);
        self
    }
}

#[async_trait]
impl DeltaRepositoryTrait for MockDeltaRepository {
    fn load_all_class_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, DeltaRecord>> {
        if user_id == "2" {
            Ok(self.class_deltas.clone())
        } else {
            Ok(HashMap::new())
        }
    }

    fn load_all_item_deltas(&self, user_id: &str) -> Result<HashMap<ItemDeltaKey, DeltaRecord>> {
        if user_id == "2" {
            Ok(self.item_deltas.clone())
        } else {
            Ok(HashMap::new())
        }
    }

    fn load_legacy_money_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, Decimal>> {
        if user_id == "2" {
            Ok(self.legacy_money.clone())
        } else {
            Ok(HashMap::new())
        }
    }

    async fn upsert_class_delta(&self, update: ClassDeltaUpdate) -> Result<DeltaRecord> {
        let stored = DeltaRecord {
            delta_qty: update.delta_qty,
            monthly_avg_2025_qty: update.monthly_avg_2025_qty,
            monthly_add_qty: update.monthly_add_qty,
            updated_at: Utc::now(),
        };
        self.upserts.lock().unwrap().push(update);
        Ok(stored)
    }

    async fn upsert_item_delta(&self, _update: ItemDeltaUpdate) -> Result<DeltaRecord> {
        unimplemented!()
    }
}

fn record(qty: Decimal) -> DeltaRecord {
    DeltaRecord {
        delta_qty: qty,
        monthly_avg_2025_qty: Decimal::ZERO,
        monthly_add_qty: Decimal::ZERO,
        updated_at: Utc::now(),
    }
}

fn fact(account: &str, class: &str, item: Option<&str>, qty: Decimal, money: Decimal) -> SalesFact {
    SalesFact::new("2", account, class, item.map(str::to_string), qty, money)
}

/// Account X: class A 10 units / 1000, class B 5 units / 0.
/// Account Y: class A 10 units / 3000.
fn facts() -> FactTable {
    FactTable::new(vec![
        fact("X", "A", Some("Bolt"), dec!(6), dec!(600)),
        fact("X", "A", Some("Nut"), dec!(4), dec!(400)),
        fact("X", "B", None, dec!(5), dec!(0)),
        fact("Y", "A", None, dec!(10), dec!(3000)),
        SalesFact::new("7", "Z", "A", None, dec!(1), dec!(100)),
    ])
    .unwrap()
}

fn service(repo: MockDeltaRepository) -> (TargetService, Arc<MockDeltaRepository>) {
    let repo = Arc::new(repo);
    (TargetService::new(repo.clone()), repo)
}

fn class<'a>(view: &'a ScopeView, class_id: &str) -> &'a ClassTarget {
    view.classes
        .iter()
        .find(|c| c.class_id == class_id)
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_single_account_scenario() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "A", dec!(2))
            .with_class("X", "B", dec!(3)),
    );
    let facts = facts();
    let scope = Scope::account("2", "X");
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();

    assert!(view.editable);
    assert_eq!(view.kind, ScopeKind::SingleAccount);

    let a = class(&view, "A");
    assert_eq!(a.metrics.avg_price, Some(dec!(100)));
    assert_eq!(a.metrics.delta_money, dec!(200));
    assert_eq!(a.metrics.target_money, dec!(1200));
    assert_eq!(a.metrics.target_qty, dec!(12));
    assert_eq!(a.delta_source, Some(DeltaSource::Recorded));

    let b = class(&view, "B");
    assert_eq!(b.metrics.avg_price, None);
    assert_eq!(b.metrics.delta_qty, dec!(3));
    assert_eq!(b.metrics.delta_money, Decimal::ZERO);
    assert_eq!(b.metrics.target_qty, dec!(8));

    assert_eq!(view.kpis.base_money, dec!(1000));
    assert_eq!(view.kpis.added_money, dec!(200));
    assert_eq!(view.kpis.target_money, dec!(1200));
    assert_eq!(view.kpis.growth_pct, Some(dec!(20)));
    // X is 1000 of the agent's 4000.
    assert_eq!(view.kpis.share_pct, Some(dec!(25)));
}

#[test]
fn test_multi_account_scope_combines_base_and_drops_share() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "A", dec!(2))
            .with_class("Y", "A", dec!(1)),
    );
    let facts = facts();
    let scope = Scope::agent("2", ["X", "Y"]);
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();

    assert!(!view.editable);
    assert_eq!(view.kind, ScopeKind::MultiAccount);
    assert_eq!(view.kpis.base_money, dec!(4000));

    // Combined class A: 20 units for 4000, so 200 per unit; delta 3.
    let a = class(&view, "A");
    assert_eq!(a.metrics.avg_price, Some(dec!(200)));
    assert_eq!(a.metrics.delta_qty, dec!(3));
    assert_eq!(a.delta_source, None);
    assert_eq!(view.kpis.target_money, dec!(4600));
    assert_eq!(view.kpis.growth_pct, Some(dec!(15)));
    assert_eq!(view.kpis.share_pct, None);
    assert_eq!(
        view.selection_share.as_ref().unwrap().share_pct,
        Some(dec!(100))
    );
}

#[test]
fn test_whole_agent_scope_sums_every_account() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "A", dec!(2))
            .with_class("Y", "A", dec!(1)),
    );
    let facts = facts();
    let scope = Scope::agent("2", Vec::<String>::new());
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(view.kind, ScopeKind::WholeAgent);
    assert_eq!(view.account_ids, vec!["X".to_string(), "Y".to_string()]);
    assert_eq!(class(&view, "A").metrics.delta_qty, dec!(3));
}

#[test]
fn test_multi_account_counts_delta_of_account_without_class_sales() {
    // Y never bought B, but B is in the combined X+Y table.
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("Y", "B", dec!(4))
            .with_item("Y", "B", "Washer", dec!(1))
            .with_item("Y", "A", "Bolt", dec!(2)),
    );
    let facts = facts();
    let scope = Scope::agent("2", ["X", "Y"]);
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();

    let b = class(&view, "B");
    assert_eq!(b.class_delta_qty, dec!(4));
    assert_eq!(b.items_delta_qty, dec!(1));
    assert_eq!(b.metrics.delta_qty, dec!(5));
    // B has no price in the combined table either.
    assert_eq!(b.metrics.delta_money, Decimal::ZERO);

    // Only X sold Bolt; Y's Bolt delta still lands on the combined item row.
    let items = service
        .item_view(&facts, &snapshot, &scope, &ItemFilter::default())
        .unwrap();
    let bolt = items.iter().find(|i| i.item_id == "Bolt").unwrap();
    assert_eq!(bolt.metrics.delta_qty, dec!(2));

    let whole_agent = Scope::agent("2", Vec::<String>::new());
    let view = service.scope_view(&facts, &snapshot, &whole_agent).unwrap();
    assert_eq!(class(&view, "B").metrics.delta_qty, dec!(5));
}

#[test]
fn test_multi_account_legacy_money_needs_the_account_price() {
    let repo = InMemoryDeltaRepository::new()
        .with_legacy_money("2", "Y", "A", dec!(300))
        .with_legacy_money("2", "Y", "B", dec!(500));
    let service = TargetService::new(Arc::new(repo));
    let facts = facts();
    let scope = Scope::agent("2", ["X", "Y"]);
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();

    // Y paid 300 per unit of A, so 300 converts to 1 unit, priced at the
    // combined 200 per unit.
    let a = class(&view, "A");
    assert_eq!(a.metrics.delta_qty, dec!(1));
    assert_eq!(a.metrics.delta_money, dec!(200));
    // Y has no price for B, so its money delta converts to nothing.
    assert_eq!(class(&view, "B").metrics.delta_qty, Decimal::ZERO);
}

#[test]
fn test_company_scope_covers_every_agent() {
    let (service, _) = service(MockDeltaRepository::default().with_class("X", "A", dec!(2)));
    let facts = facts();
    let scope = Scope::company();
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(view.kind, ScopeKind::Company);
    assert_eq!(view.kpis.base_money, dec!(4100));
    assert!(view.selection_share.is_none());
    assert_eq!(class(&view, "A").metrics.delta_qty, dec!(2));
}

#[test]
fn test_legacy_money_converts_at_account_price() {
    let (service, _) = service(MockDeltaRepository::default().with_legacy("X", "A", dec!(300)));
    let facts = facts();
    let scope = Scope::account("2", "X");
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    let a = class(&view, "A");
    assert_eq!(a.metrics.delta_qty, dec!(3));
    assert_eq!(a.delta_source, Some(DeltaSource::LegacyMoney));
    assert_eq!(a.metrics.delta_money, dec!(300));
}

#[test]
fn test_recorded_zero_blocks_legacy_money() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_legacy("X", "A", dec!(300))
            .with_class("X", "A", Decimal::ZERO),
    );
    let facts = facts();
    let scope = Scope::account("2", "X");
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(class(&view, "A").metrics.delta_qty, Decimal::ZERO);
}

#[test]
fn test_item_deltas_roll_up_into_class() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "A", dec!(2))
            .with_item("X", "A", "Bolt", dec!(1))
            .with_item("X", "A", "Nut", dec!(1)),
    );
    let facts = facts();
    let scope = Scope::account("2", "X");
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();

    let a = class(&view, "A");
    assert_eq!(a.class_delta_qty, dec!(2));
    assert_eq!(a.items_delta_qty, dec!(2));
    assert_eq!(a.metrics.delta_qty, dec!(4));
    assert_eq!(class(&view, "B").metrics.delta_qty, Decimal::ZERO);

    let items = service
        .item_view(&facts, &snapshot, &scope, &ItemFilter::default())
        .unwrap();
    let bolt = items.iter().find(|i| i.item_id == "Bolt").unwrap();
    assert_eq!(bolt.metrics.delta_qty, dec!(1));
    assert_eq!(bolt.metrics.delta_money, dec!(100));
}

#[test]
fn test_orphan_delta_does_not_contribute() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "Gone", dec!(50))
            .with_item("X", "Gone", "Old", dec!(5)),
    );
    let facts = facts();
    let scope = Scope::account("2", "X");
    let snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(view.classes.len(), 2);
    assert_eq!(view.kpis.added_qty, Decimal::ZERO);
}

#[tokio::test]
async fn test_save_rejected_outside_single_account() {
    let (service, repo) = service(MockDeltaRepository::default());
    let facts = facts();
    let scope = Scope::agent("2", ["X", "Y"]);
    let mut snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let err = service
        .save_class_delta(
            &facts,
            &mut snapshot,
            &scope,
            ClassDeltaEdit {
                class_id: "A".to_string(),
                delta_qty: dec!(1),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Scope(ScopeError::ReadOnly { selected: 2 })
    ));
    assert!(repo.upserts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_save_class_delta_records_monthly_snapshot() {
    let (service, repo) = service(MockDeltaRepository::default());
    let facts = facts();
    let scope = Scope::account("2", "X");
    let mut snapshot = service.load_snapshot(&facts, &scope).unwrap();
    service
        .save_class_delta(
            &facts,
            &mut snapshot,
            &scope,
            ClassDeltaEdit {
                class_id: "A".to_string(),
                delta_qty: dec!(24),
            },
        )
        .await
        .unwrap();

    let upserts = repo.upserts.lock().unwrap().clone();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].user_id, "2");
    assert_eq!(upserts[0].monthly_add_qty, dec!(2));
    assert_eq!(upserts[0].monthly_avg_2025_qty, dec!(10) / dec!(12));

    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(class(&view, "A").metrics.delta_qty, dec!(24));
}

#[tokio::test]
async fn test_save_unknown_class_is_stored_but_inert() {
    let repo = Arc::new(InMemoryDeltaRepository::new());
    let service = TargetService::new(repo.clone());
    let facts = facts();
    let scope = Scope::account("2", "X");
    let mut snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let stored = service
        .save_class_delta(
            &facts,
            &mut snapshot,
            &scope,
            ClassDeltaEdit {
                class_id: "Future".to_string(),
                delta_qty: dec!(7),
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.monthly_avg_2025_qty, Decimal::ZERO);
    assert_eq!(repo.load_all_class_deltas("2").unwrap().len(), 1);

    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(view.kpis.added_qty, Decimal::ZERO);
}

#[tokio::test]
async fn test_save_item_delta_changes_only_its_class() {
    let repo = Arc::new(InMemoryDeltaRepository::new());
    let service = TargetService::new(repo);
    let facts = facts();
    let scope = Scope::account("2", "X");
    let mut snapshot = service.load_snapshot(&facts, &scope).unwrap();
    let before = service.scope_view(&facts, &snapshot, &scope).unwrap();

    service
        .save_item_delta(
            &facts,
            &mut snapshot,
            &scope,
            ItemDeltaEdit {
                class_id: "A".to_string(),
                item_id: "Bolt".to_string(),
                delta_qty: dec!(3),
            },
        )
        .await
        .unwrap();
    let after = service.scope_view(&facts, &snapshot, &scope).unwrap();

    assert_eq!(
        class(&after, "A").metrics.delta_qty - class(&before, "A").metrics.delta_qty,
        dec!(3)
    );
    assert_eq!(
        class(&after, "B").metrics.delta_qty,
        class(&before, "B").metrics.delta_qty
    );
}

#[tokio::test]
async fn test_reload_snapshot_picks_up_other_session_writes() {
    let repo = Arc::new(InMemoryDeltaRepository::new());
    let service = TargetService::new(repo.clone());
    let facts = facts();
    let scope = Scope::account("2", "X");
    let mut snapshot: DeltaSnapshot = service.load_snapshot(&facts, &scope).unwrap();

    repo.upsert_class_delta(ClassDeltaUpdate {
        user_id: "2".to_string(),
        account_id: "X".to_string(),
        class_id: "A".to_string(),
        delta_qty: dec!(1),
        monthly_avg_2025_qty: Decimal::ZERO,
        monthly_add_qty: Decimal::ZERO,
    })
    .await
    .unwrap();

    let stale = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(class(&stale, "A").metrics.delta_qty, Decimal::ZERO);
    service.reload_snapshot(&mut snapshot).unwrap();
    let fresh = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(class(&fresh, "A").metrics.delta_qty, dec!(1));
}

#[test]
fn test_selection_report() {
    let (service, _) = service(
        MockDeltaRepository::default()
            .with_class("X", "A", dec!(2))
            .with_class("Y", "A", dec!(1)),
    );
    let service = service
        .with_agent_directory(AgentDirectory::parse("2=Ofir"))
        .with_report_customer_cap(1);
    let facts = facts();
    let snapshot = service
        .load_snapshot(&facts, &Scope::agent("2", Vec::<String>::new()))
        .unwrap();
    let report = service
        .selection_report(&facts, &snapshot, "2", &["Y".to_string(), "X".to_string()])
        .unwrap();

    assert_eq!(report.agent_label, "2 — Ofir");
    assert_eq!(report.customers.len(), 2);
    assert_eq!(report.customers[0].account_id, "X");
    assert_eq!(report.customers[0].added_money, dec!(200));
    assert_eq!(report.customers[1].added_money, dec!(300));
    assert_eq!(report.per_customer.len(), 1);
    let combined_a = report.combined.iter().find(|c| c.class_id == "A").unwrap();
    assert_eq!(combined_a.metrics.delta_qty, dec!(3));
}

#[test]
fn test_report_cap_counts_customers_without_facts() {
    let (service, _) = service(MockDeltaRepository::default());
    let service = service.with_report_customer_cap(1);
    let facts = facts();
    let snapshot = service
        .load_snapshot(&facts, &Scope::agent("2", Vec::<String>::new()))
        .unwrap();
    let report = service
        .selection_report(&facts, &snapshot, "2", &["X".to_string(), "Q".to_string()])
        .unwrap();

    // "Q" sorts first and takes the only per-customer slot.
    assert_eq!(report.customers.len(), 1);
    assert_eq!(report.customers[0].account_id, "X");
    assert!(report.per_customer.is_empty());
}

#[tokio::test]
async fn test_save_into_empty_snapshot_keeps_stored_deltas() {
    let repo = Arc::new(InMemoryDeltaRepository::new());
    repo.upsert_class_delta(ClassDeltaUpdate {
        user_id: "2".to_string(),
        account_id: "X".to_string(),
        class_id: "B".to_string(),
        delta_qty: dec!(3),
        monthly_avg_2025_qty: Decimal::ZERO,
        monthly_add_qty: Decimal::ZERO,
    })
    .await
    .unwrap();
    let service = TargetService::new(repo.clone());
    let facts = facts();
    let scope = Scope::account("2", "X");

    let mut snapshot = DeltaSnapshot::default();
    service
        .save_class_delta(
            &facts,
            &mut snapshot,
            &scope,
            ClassDeltaEdit {
                class_id: "A".to_string(),
                delta_qty: dec!(2),
            },
        )
        .await
        .unwrap();

    let view = service.scope_view(&facts, &snapshot, &scope).unwrap();
    assert_eq!(class(&view, "A").metrics.delta_qty, dec!(2));
    assert_eq!(class(&view, "B").metrics.delta_qty, dec!(3));
}

#[test]
fn test_unknown_agent_is_an_error() {
    let (service, _) = service(MockDeltaRepository::default());
    let facts = facts();
    let snapshot = DeltaSnapshot::default();
    let err = service
        .scope_view(&facts, &snapshot, &Scope::account("99", "X"))
        .unwrap_err();
    assert!(matches!(err, Error::Scope(ScopeError::UnknownAgent(_))));
}
