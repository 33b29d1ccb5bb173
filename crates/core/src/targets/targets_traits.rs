use async_trait::async_trait;

use super::scope::Scope;
use super::targets_model::{ClassDeltaEdit, ItemDeltaEdit, ItemTarget, ScopeView, SelectionReport};
use crate::aggregation::ItemFilter;
use crate::deltas::{DeltaRecord, DeltaSnapshot};
use crate::errors::Result;
use crate::facts::{CustomerSummary, FactTable};

/// Trait for target computation and editing.
///
/// Every read takes the caller's `DeltaSnapshot` explicitly; the service
/// keeps no per-user state of its own.
#[async_trait]
pub trait TargetServiceTrait: Send + Sync {
    /// Loads a snapshot holding every user the scope reads.
    fn load_snapshot(&self, facts: &FactTable, scope: &Scope) -> Result<DeltaSnapshot>;

    /// Re-reads every user in `snapshot` from the store.
    fn reload_snapshot(&self, snapshot: &mut DeltaSnapshot) -> Result<()>;

    fn customer_summaries(&self, facts: &FactTable, agent_id: &str) -> Result<Vec<CustomerSummary>>;

    /// Class table and KPIs for a scope.
    fn scope_view(&self, facts: &FactTable, snapshot: &DeltaSnapshot, scope: &Scope)
        -> Result<ScopeView>;

    /// Item detail table for a scope.
    fn item_view(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        scope: &Scope,
        filter: &ItemFilter,
    ) -> Result<Vec<ItemTarget>>;

    /// Summary, combined table and per-customer tables for a selection.
    fn selection_report(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        agent_id: &str,
        account_ids: &[String],
    ) -> Result<SelectionReport>;

    /// Stores a class-level delta; the scope must be a single account.
    async fn save_class_delta(
        &self,
        facts: &FactTable,
        snapshot: &mut DeltaSnapshot,
        scope: &Scope,
        edit: ClassDeltaEdit,
    ) -> Result<DeltaRecord>;

    /// Stores an item-level delta; the scope must be a single account.
    async fn save_item_delta(
        &self,
        facts: &FactTable,
        snapshot: &mut DeltaSnapshot,
        scope: &Scope,
        edit: ItemDeltaEdit,
    ) -> Result<DeltaRecord>;
}
