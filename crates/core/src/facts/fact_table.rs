use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use super::facts_model::{CustomerSummary, SalesFact, SelectionShare};
use crate::errors::{Result, ValidationError};
use crate::utils::percent_of;

/// The working set of sales facts for one upload.
#[derive(Debug, Clone, Default)]
pub struct FactTable {
    facts: Vec<SalesFact>,
}

impl FactTable {
    /// Builds a table, rejecting facts with a negative quantity.
    pub fn new(facts: Vec<SalesFact>) -> Result<Self> {
        for (row, fact) in facts.iter().enumerate() {
            if fact.quantity.is_sign_negative() && !fact.quantity.is_zero() {
                return Err(ValidationError::NegativeQuantity {
                    row,
                    quantity: fact.quantity,
                }
                .into());
            }
            if fact.account_id.is_empty() {
                return Err(ValidationError::MissingField("account_id".to_string()).into());
            }
        }
        Ok(Self { facts })
    }

    pub fn facts(&self) -> &[SalesFact] {
        &self.facts
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Distinct agent ids, sorted.
    pub fn agents(&self) -> Vec<String> {
        self.facts
            .iter()
            .map(|f| f.agent_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.facts.iter().any(|f| f.agent_id == agent_id)
    }

    pub fn agent_facts<'a>(&'a self, agent_id: &'a str) -> impl Iterator<Item = &'a SalesFact> {
        self.facts.iter().filter(move |f| f.agent_id == agent_id)
    }

    /// Distinct account ids for an agent, sorted.
    pub fn accounts_for_agent(&self, agent_id: &str) -> Vec<String> {
        self.agent_facts(agent_id)
            .map(|f| f.account_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Facts of `agent_id` restricted to `accounts`; an empty slice selects
    /// every account of the agent.
    pub fn select<'a>(&'a self, agent_id: &str, accounts: &[String]) -> Vec<&'a SalesFact> {
        self.facts
            .iter()
            .filter(|f| f.agent_id == agent_id)
            .filter(|f| accounts.is_empty() || accounts.iter().any(|a| *a == f.account_id))
            .collect()
    }

    /// Facts of a single (agent, account) pair.
    pub fn account_facts<'a>(&'a self, agent_id: &str, account_id: &str) -> Vec<&'a SalesFact> {
        self.facts
            .iter()
            .filter(|f| f.agent_id == agent_id && f.account_id == account_id)
            .collect()
    }

    pub fn agent_total_money(&self, agent_id: &str) -> Decimal {
        self.agent_facts(agent_id).map(|f| f.net_money).sum()
    }

    /// Per-account totals for an agent, sorted by money descending then
    /// account id.
    pub fn customer_summaries(&self, agent_id: &str) -> Vec<CustomerSummary> {
        let mut totals: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
        for fact in self.agent_facts(agent_id) {
            let entry = totals
                .entry(fact.account_id.as_str())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += fact.net_money;
            entry.1 += fact.quantity;
        }
        let agent_total: Decimal = totals.values().map(|(money, _)| *money).sum();

        let mut summaries: Vec<CustomerSummary> = totals
            .into_iter()
            .map(|(account_id, (sales_money, sales_qty))| CustomerSummary {
                account_id: account_id.to_string(),
                sales_money,
                sales_qty,
                share_pct: percent_of(sales_money, agent_total),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.sales_money
                .cmp(&a.sales_money)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        summaries
    }

    /// Money share of a selection; an empty selection is the whole agent.
    pub fn selection_share(&self, agent_id: &str, accounts: &[String]) -> SelectionShare {
        let selected_money = self
            .select(agent_id, accounts)
            .iter()
            .map(|f| f.net_money)
            .sum();
        let agent_total_money = self.agent_total_money(agent_id);
        SelectionShare {
            selected_money,
            agent_total_money,
            share_pct: percent_of(selected_money, agent_total_money),
        }
    }
}
