//! Sales fact domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One normalized row of historical sales.
///
/// Facts are immutable once loaded; every computation works on a filtered
/// view (by agent, then by account selection).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesFact {
    pub agent_id: String,
    pub account_id: String,
    pub class_id: String,
    pub item_id: Option<String>,
    pub quantity: Decimal,
    pub net_money: Decimal,
}

impl SalesFact {
    pub fn new(
        agent_id: impl Into<String>,
        account_id: impl Into<String>,
        class_id: impl Into<String>,
        item_id: Option<String>,
        quantity: Decimal,
        net_money: Decimal,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            account_id: account_id.into(),
            class_id: class_id.into(),
            item_id,
            quantity,
            net_money,
        }
    }

    /// Item id used for item-level grouping; facts without one share the
    /// empty id.
    pub fn item_key(&self) -> &str {
        self.item_id.as_deref().unwrap_or("")
    }
}

/// Per-account totals for an agent's customer list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub account_id: String,
    pub sales_money: Decimal,
    pub sales_qty: Decimal,
    /// Share of the agent's total money, undefined when that total is not positive.
    pub share_pct: Option<Decimal>,
}

/// Money share of a selection within its agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionShare {
    pub selected_money: Decimal,
    pub agent_total_money: Decimal,
    pub share_pct: Option<Decimal>,
}

/// Display names for agent ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentDirectory {
    names: HashMap<String, String>,
}

impl AgentDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Parses `id=name,id=name`. Malformed pairs are skipped.
    pub fn parse(list: &str) -> Self {
        let names = list
            .split(',')
            .filter_map(|pair| {
                let (id, name) = pair.split_once('=')?;
                let (id, name) = (id.trim(), name.trim());
                if id.is_empty() || name.is_empty() {
                    return None;
                }
                Some((id.to_string(), name.to_string()))
            })
            .collect();
        Self { names }
    }

    /// `"{id} — {name}"` when a name is known, the raw id otherwise.
    pub fn label(&self, agent_id: &str) -> String {
        let id = agent_id.trim();
        match self.names.get(id) {
            Some(name) => format!("{} — {}", id, name),
            None => id.to_string(),
        }
    }
}
