use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;

use super::derivation::derive_metrics;
use super::scope::{Scope, ScopeKind};
use super::targets_model::{
    ClassDeltaEdit, ClassTarget, CustomerClassTable, CustomerTargetSummary, ItemDeltaEdit,
    ItemTarget, ScopeKpis, ScopeView, SelectionReport,
};
use super::targets_traits::TargetServiceTrait;
use crate::aggregation::{aggregate_classes, aggregate_items, ItemFilter};
use crate::constants::{DEFAULT_REPORT_CUSTOMER_CAP, PERCENT_SCALE};
use crate::deltas::{
    ClassDeltaUpdate, DeltaRecord, DeltaRepositoryTrait, DeltaResolver, DeltaSnapshot,
    DeltaSource, ItemDeltaUpdate,
};
use crate::errors::{Result, ScopeError};
use crate::facts::{AgentDirectory, CustomerSummary, FactTable, SalesFact};
use crate::utils::{per_month, percent_of};

type AccountFacts<'a> = BTreeMap<(&'a str, &'a str), Vec<&'a SalesFact>>;

/// Groups the facts of every (agent, account) pair in one pass. Pairs
/// without facts map to an empty list.
fn group_facts<'a>(facts: &'a FactTable, pairs: &'a [(String, String)]) -> AccountFacts<'a> {
    let mut grouped: AccountFacts<'a> = pairs
        .iter()
        .map(|(agent, account)| ((agent.as_str(), account.as_str()), Vec::new()))
        .collect();
    for fact in facts.facts() {
        if let Some(bucket) = grouped.get_mut(&(fact.agent_id.as_str(), fact.account_id.as_str())) {
            bucket.push(fact);
        }
    }
    grouped
}

#[derive(Debug, Default)]
struct ClassContribution {
    class_qty: Decimal,
    items_qty: Decimal,
    source: Option<DeltaSource>,
}

/// Sums class rows into the scope KPI tuple.
fn scope_kpis(classes: &[ClassTarget], share_pct: Option<Decimal>) -> ScopeKpis {
    let mut kpis = ScopeKpis {
        base_money: Decimal::ZERO,
        added_money: Decimal::ZERO,
        target_money: Decimal::ZERO,
        growth_pct: None,
        share_pct,
        base_qty: Decimal::ZERO,
        added_qty: Decimal::ZERO,
        target_qty: Decimal::ZERO,
    };
    for class in classes {
        kpis.base_money += class.metrics.sales_money;
        kpis.added_money += class.metrics.delta_money;
        kpis.base_qty += class.metrics.sales_qty;
        kpis.added_qty += class.metrics.delta_qty;
    }
    kpis.target_money = kpis.base_money + kpis.added_money;
    kpis.target_qty = kpis.base_qty + kpis.added_qty;
    kpis.growth_pct = percent_of(kpis.target_money, kpis.base_money)
        .map(|pct| pct - Decimal::from(PERCENT_SCALE));
    kpis
}

pub struct TargetService {
    delta_repository: Arc<dyn DeltaRepositoryTrait>,
    agents: AgentDirectory,
    report_customer_cap: usize,
}

impl TargetService {
    pub fn new(delta_repository: Arc<dyn DeltaRepositoryTrait>) -> Self {
        TargetService {
            delta_repository,
            agents: AgentDirectory::default(),
            report_customer_cap: DEFAULT_REPORT_CUSTOMER_CAP,
        }
    }

    pub fn with_agent_directory(mut self, agents: AgentDirectory) -> Self {
        self.agents = agents;
        self
    }

    pub fn with_report_customer_cap(mut self, cap: usize) -> Self {
        self.report_customer_cap = cap;
        self
    }

    pub fn agent_label(&self, agent_id: &str) -> String {
        self.agents.label(agent_id)
    }

    /// Derived class rows over `pairs`.
    ///
    /// Every selected account contributes its deltas to each class of the
    /// combined table, resolved against that account's own class price. An
    /// account that never bought the class has no price there, so its legacy
    /// money delta converts to nothing while recorded and item deltas count.
    fn class_targets(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        pairs: &[(String, String)],
    ) -> Vec<ClassTarget> {
        let grouped = group_facts(facts, pairs);
        let scope_classes = aggregate_classes(grouped.values().flatten().copied());

        let mut contributions: HashMap<&str, ClassContribution> = HashMap::new();
        for ((agent_id, account_id), account_facts) in &grouped {
            let resolver = DeltaResolver::new(snapshot.user(agent_id));
            let prices: HashMap<String, Option<Decimal>> =
                aggregate_classes(account_facts.iter().copied())
                    .into_iter()
                    .map(|class| (class.class_id, class.avg_price))
                    .collect();
            for class in &scope_classes {
                let avg_price = prices.get(&class.class_id).copied().flatten();
                let effective = resolver.effective_class_delta(account_id, &class.class_id, avg_price);
                let entry = contributions.entry(class.class_id.as_str()).or_default();
                entry.class_qty += effective.class_level.delta_qty;
                entry.items_qty += effective.items_qty;
                entry.source = Some(effective.class_level.source);
            }
        }

        let single_account = grouped.len() == 1;
        let mut targets = Vec::with_capacity(scope_classes.len());
        for class in &scope_classes {
            let contribution = contributions
                .remove(class.class_id.as_str())
                .unwrap_or_default();
            let delta_qty = contribution.class_qty + contribution.items_qty;
            targets.push(ClassTarget {
                metrics: derive_metrics(class.totals(), delta_qty),
                class_id: class.class_id.clone(),
                class_delta_qty: contribution.class_qty,
                items_delta_qty: contribution.items_qty,
                delta_source: contribution.source.filter(|_| single_account),
            });
        }
        targets
    }

    /// Derived item rows over `pairs`; like classes, every selected account
    /// contributes its item deltas to each item of the combined table.
    fn item_targets(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        pairs: &[(String, String)],
        filter: &ItemFilter,
    ) -> Vec<ItemTarget> {
        let grouped = group_facts(facts, pairs);
        let scope_items = aggregate_items(grouped.values().flatten().copied(), filter);

        scope_items
            .into_iter()
            .map(|item| {
                let delta_qty: Decimal = grouped
                    .keys()
                    .map(|(agent_id, account_id)| {
                        DeltaResolver::new(snapshot.user(agent_id)).item_delta(
                            account_id,
                            &item.class_id,
                            &item.item_id,
                        )
                    })
                    .sum();
                ItemTarget {
                    metrics: derive_metrics(item.totals(), delta_qty),
                    class_id: item.class_id,
                    item_id: item.item_id,
                }
            })
            .collect()
    }

    fn account_class_qty(facts: &FactTable, agent_id: &str, account_id: &str, class_id: &str) -> Decimal {
        facts
            .account_facts(agent_id, account_id)
            .into_iter()
            .filter(|f| f.class_id == class_id)
            .map(|f| f.quantity)
            .sum()
    }

    fn account_item_qty(
        facts: &FactTable,
        agent_id: &str,
        account_id: &str,
        class_id: &str,
        item_id: &str,
    ) -> Decimal {
        facts
            .account_facts(agent_id, account_id)
            .into_iter()
            .filter(|f| f.class_id == class_id && f.item_key() == item_id)
            .map(|f| f.quantity)
            .sum()
    }
}

#[async_trait]
impl TargetServiceTrait for TargetService {
    fn load_snapshot(&self, facts: &FactTable, scope: &Scope) -> Result<DeltaSnapshot> {
        DeltaSnapshot::load(self.delta_repository.as_ref(), &scope.user_ids(facts))
    }

    fn reload_snapshot(&self, snapshot: &mut DeltaSnapshot) -> Result<()> {
        snapshot.reload(self.delta_repository.as_ref())
    }

    fn customer_summaries(&self, facts: &FactTable, agent_id: &str) -> Result<Vec<CustomerSummary>> {
        if !facts.has_agent(agent_id) {
            return Err(ScopeError::UnknownAgent(agent_id.to_string()).into());
        }
        Ok(facts.customer_summaries(agent_id))
    }

    fn scope_view(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        scope: &Scope,
    ) -> Result<ScopeView> {
        let pairs = scope.account_pairs(facts)?;
        let classes = self.class_targets(facts, snapshot, &pairs);

        let base_money: Decimal = classes.iter().map(|c| c.metrics.sales_money).sum();
        let share_pct = match (scope.kind(), scope.agent_id()) {
            (ScopeKind::SingleAccount, Some(agent_id)) => {
                percent_of(base_money, facts.agent_total_money(agent_id))
            }
            _ => None,
        };
        let kpis = scope_kpis(&classes, share_pct);
        debug!(
            "Computed {:?} scope over {} accounts: {} classes, base {}, target {}",
            scope.kind(),
            pairs.len(),
            classes.len(),
            kpis.base_money,
            kpis.target_money
        );

        Ok(ScopeView {
            kind: scope.kind(),
            editable: scope.is_editable(),
            account_ids: pairs.into_iter().map(|(_, account)| account).collect(),
            classes,
            kpis,
            selection_share: scope
                .agent_id()
                .map(|agent_id| facts.selection_share(agent_id, scope.selected_accounts())),
        })
    }

    fn item_view(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        scope: &Scope,
        filter: &ItemFilter,
    ) -> Result<Vec<ItemTarget>> {
        let pairs = scope.account_pairs(facts)?;
        Ok(self.item_targets(facts, snapshot, &pairs, filter))
    }

    fn selection_report(
        &self,
        facts: &FactTable,
        snapshot: &DeltaSnapshot,
        agent_id: &str,
        account_ids: &[String],
    ) -> Result<SelectionReport> {
        if !facts.has_agent(agent_id) {
            return Err(ScopeError::UnknownAgent(agent_id.to_string()).into());
        }
        let accounts: Vec<String> = if account_ids.is_empty() {
            facts.accounts_for_agent(agent_id)
        } else {
            account_ids
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        let agent_label = self.agents.label(agent_id);

        let mut customers = Vec::new();
        let mut per_customer = Vec::new();
        // The cap counts selected customers, including ones without facts.
        for (position, account_id) in accounts.iter().enumerate() {
            if facts.account_facts(agent_id, account_id).is_empty() {
                continue;
            }
            let pair = [(agent_id.to_string(), account_id.clone())];
            let classes = self.class_targets(facts, snapshot, &pair);
            let kpis = scope_kpis(&classes, None);
            customers.push(CustomerTargetSummary {
                agent_label: agent_label.clone(),
                account_id: account_id.clone(),
                base_money: kpis.base_money,
                added_money: kpis.added_money,
                target_money: kpis.target_money,
                growth_pct: kpis.growth_pct,
            });
            if position < self.report_customer_cap {
                per_customer.push(CustomerClassTable {
                    account_id: account_id.clone(),
                    classes,
                });
            }
        }

        let pairs: Vec<(String, String)> = accounts
            .iter()
            .map(|account| (agent_id.to_string(), account.clone()))
            .collect();
        let combined = self.class_targets(facts, snapshot, &pairs);
        info!(
            "Built selection report for agent {} over {} customers",
            agent_id,
            customers.len()
        );

        Ok(SelectionReport {
            agent_id: agent_id.to_string(),
            agent_label,
            customers,
            combined,
            per_customer,
        })
    }

    async fn save_class_delta(
        &self,
        facts: &FactTable,
        snapshot: &mut DeltaSnapshot,
        scope: &Scope,
        edit: ClassDeltaEdit,
    ) -> Result<DeltaRecord> {
        let (agent_id, account_id) = scope.editable_account()?;
        let sales_qty = Self::account_class_qty(facts, agent_id, account_id, &edit.class_id);
        let update = ClassDeltaUpdate {
            user_id: agent_id.to_string(),
            account_id: account_id.to_string(),
            class_id: edit.class_id,
            delta_qty: edit.delta_qty,
            monthly_avg_2025_qty: per_month(sales_qty),
            monthly_add_qty: per_month(edit.delta_qty),
        };

        snapshot.ensure_user(self.delta_repository.as_ref(), agent_id)?;
        let record = self
            .delta_repository
            .upsert_class_delta(update.clone())
            .await?;
        snapshot.apply_class_update(&update, record.clone());
        info!(
            "Saved class delta {} for user {} account {} class {}",
            record.delta_qty, update.user_id, update.account_id, update.class_id
        );
        Ok(record)
    }

    async fn save_item_delta(
        &self,
        facts: &FactTable,
        snapshot: &mut DeltaSnapshot,
        scope: &Scope,
        edit: ItemDeltaEdit,
    ) -> Result<DeltaRecord> {
        let (agent_id, account_id) = scope.editable_account()?;
        let sales_qty =
            Self::account_item_qty(facts, agent_id, account_id, &edit.class_id, &edit.item_id);
        let update = ItemDeltaUpdate {
            user_id: agent_id.to_string(),
            account_id: account_id.to_string(),
            class_id: edit.class_id,
            item_id: edit.item_id,
            delta_qty: edit.delta_qty,
            monthly_avg_2025_qty: per_month(sales_qty),
            monthly_add_qty: per_month(edit.delta_qty),
        };

        snapshot.ensure_user(self.delta_repository.as_ref(), agent_id)?;
        let record = self
            .delta_repository
            .upsert_item_delta(update.clone())
            .await?;
        snapshot.apply_item_update(&update, record.clone());
        info!(
            "Saved item delta {} for user {} account {} class {} item {}",
            record.delta_qty, update.user_id, update.account_id, update.class_id, update.item_id
        );
        Ok(record)
    }
}
