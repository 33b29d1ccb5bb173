//! Target domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::scope::ScopeKind;
use crate::deltas::DeltaSource;
use crate::facts::SelectionShare;

/// Derived money and quantity figures for one class or item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetMetrics {
    pub sales_money: Decimal,
    pub sales_qty: Decimal,
    pub avg_price: Option<Decimal>,
    pub delta_qty: Decimal,
    pub delta_money: Decimal,
    pub target_money: Decimal,
    pub target_qty: Decimal,
    pub monthly_avg_2025_qty: Decimal,
    pub monthly_add_qty: Decimal,
    pub monthly_target_qty: Decimal,
    pub variance_qty: Decimal,
    pub attainment_pct: Option<Decimal>,
}

/// One derived row of the class table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassTarget {
    pub class_id: String,
    /// Class-level part of `metrics.delta_qty` (summed over accounts in
    /// multi-account scopes).
    pub class_delta_qty: Decimal,
    /// Item-level part of `metrics.delta_qty`.
    pub items_delta_qty: Decimal,
    /// Origin of the class-level delta; only meaningful for a single account.
    pub delta_source: Option<DeltaSource>,
    #[serde(flatten)]
    pub metrics: TargetMetrics,
}

/// One derived row of the item detail table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemTarget {
    pub class_id: String,
    pub item_id: String,
    #[serde(flatten)]
    pub metrics: TargetMetrics,
}

/// Scope-level KPI tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeKpis {
    pub base_money: Decimal,
    pub added_money: Decimal,
    pub target_money: Decimal,
    /// `target / base * 100 - 100`; undefined without a positive base.
    pub growth_pct: Option<Decimal>,
    /// Account share of its agent's base money; single-account scopes only.
    pub share_pct: Option<Decimal>,
    pub base_qty: Decimal,
    pub added_qty: Decimal,
    pub target_qty: Decimal,
}

/// Everything a caller needs to render one scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScopeView {
    pub kind: ScopeKind,
    pub editable: bool,
    pub account_ids: Vec<String>,
    pub classes: Vec<ClassTarget>,
    pub kpis: ScopeKpis,
    /// Money share of the selection within its agent; absent company-wide.
    pub selection_share: Option<SelectionShare>,
}

/// Per-customer line of a selection report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerTargetSummary {
    pub agent_label: String,
    pub account_id: String,
    pub base_money: Decimal,
    pub added_money: Decimal,
    pub target_money: Decimal,
    pub growth_pct: Option<Decimal>,
}

/// Class table of one customer inside a selection report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerClassTable {
    pub account_id: String,
    pub classes: Vec<ClassTarget>,
}

/// Targets report for a multi-customer selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub agent_id: String,
    pub agent_label: String,
    pub customers: Vec<CustomerTargetSummary>,
    /// Class table over the whole selection.
    pub combined: Vec<ClassTarget>,
    /// Per-customer class tables, capped.
    pub per_customer: Vec<CustomerClassTable>,
}

/// A user edit of one class-level delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeltaEdit {
    pub class_id: String,
    pub delta_qty: Decimal,
}

/// A user edit of one item-level delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeltaEdit {
    pub class_id: String,
    pub item_id: String,
    pub delta_qty: Decimal,
}
