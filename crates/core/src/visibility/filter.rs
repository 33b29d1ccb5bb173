use serde::{Deserialize, Serialize};

use super::visibility_model::{Cell, Column, PermissionSet, VisibleTable};
use crate::deltas;
use crate::errors::{Result, ScopeError};
use crate::facts::{CustomerSummary, SelectionShare};
use crate::targets::{
    ClassTarget, CustomerTargetSummary, ItemTarget, Scope, ScopeKind, ScopeKpis, ScopeView,
    SelectionReport, TargetMetrics,
};

use Column::*;

pub const CLASS_COLUMNS: &[Column] = &[
    ClassId,
    SalesMoney,
    SalesQty,
    AvgPrice,
    ClassDeltaQty,
    ItemsDeltaQty,
    DeltaQty,
    DeltaSource,
    DeltaMoney,
    TargetMoney,
    TargetQty,
    MonthlyAvg2025Qty,
    MonthlyAddQty,
    MonthlyTargetQty,
    VarianceQty,
    AttainmentPct,
];

pub const ITEM_COLUMNS: &[Column] = &[
    ClassId,
    ItemId,
    SalesMoney,
    SalesQty,
    AvgPrice,
    DeltaQty,
    DeltaMoney,
    TargetMoney,
    TargetQty,
    MonthlyAvg2025Qty,
    MonthlyAddQty,
    MonthlyTargetQty,
    VarianceQty,
    AttainmentPct,
];

pub const KPI_COLUMNS: &[Column] = &[
    BaseMoney,
    AddedMoney,
    TargetMoney,
    GrowthPct,
    SharePct,
    BaseQty,
    AddedQty,
    TargetQty,
];

pub const CUSTOMER_SUMMARY_COLUMNS: &[Column] = &[AccountId, SalesMoney, SalesQty, SharePct];

pub const CUSTOMER_TARGET_COLUMNS: &[Column] = &[
    AgentLabel,
    AccountId,
    BaseMoney,
    AddedMoney,
    TargetMoney,
    GrowthPct,
];

pub const SELECTION_SHARE_COLUMNS: &[Column] = &[SelectedMoney, AgentTotalMoney, SharePct];

pub const SAVED_DELTA_COLUMNS: &[Column] = &[DeltaQty, MonthlyAvg2025Qty, MonthlyAddQty, UpdatedAt];

/// A derived record that can be projected onto columns.
pub trait TableRow {
    fn cell(&self, column: Column) -> Cell;
}

fn metric_cell(metrics: &TargetMetrics, column: Column) -> Cell {
    match column {
        SalesMoney => metrics.sales_money.into(),
        SalesQty => metrics.sales_qty.into(),
        AvgPrice => metrics.avg_price.into(),
        DeltaQty => metrics.delta_qty.into(),
        DeltaMoney => metrics.delta_money.into(),
        TargetMoney => metrics.target_money.into(),
        TargetQty => metrics.target_qty.into(),
        MonthlyAvg2025Qty => metrics.monthly_avg_2025_qty.into(),
        MonthlyAddQty => metrics.monthly_add_qty.into(),
        MonthlyTargetQty => metrics.monthly_target_qty.into(),
        VarianceQty => metrics.variance_qty.into(),
        AttainmentPct => metrics.attainment_pct.into(),
        _ => Cell::Undefined,
    }
}

fn source_cell(source: Option<deltas::DeltaSource>) -> Cell {
    match source {
        Some(deltas::DeltaSource::Recorded) => "recorded".into(),
        Some(deltas::DeltaSource::LegacyMoney) => "legacy_money".into(),
        Some(deltas::DeltaSource::None) => "none".into(),
        None => Cell::Undefined,
    }
}

impl TableRow for ClassTarget {
    fn cell(&self, column: Column) -> Cell {
        match column {
            ClassId => self.class_id.as_str().into(),
            ClassDeltaQty => self.class_delta_qty.into(),
            ItemsDeltaQty => self.items_delta_qty.into(),
            DeltaSource => source_cell(self.delta_source),
            other => metric_cell(&self.metrics, other),
        }
    }
}

impl TableRow for ItemTarget {
    fn cell(&self, column: Column) -> Cell {
        match column {
            ClassId => self.class_id.as_str().into(),
            ItemId => self.item_id.as_str().into(),
            other => metric_cell(&self.metrics, other),
        }
    }
}

impl TableRow for ScopeKpis {
    fn cell(&self, column: Column) -> Cell {
        match column {
            BaseMoney => self.base_money.into(),
            AddedMoney => self.added_money.into(),
            TargetMoney => self.target_money.into(),
            GrowthPct => self.growth_pct.into(),
            SharePct => self.share_pct.into(),
            BaseQty => self.base_qty.into(),
            AddedQty => self.added_qty.into(),
            TargetQty => self.target_qty.into(),
            _ => Cell::Undefined,
        }
    }
}

impl TableRow for CustomerSummary {
    fn cell(&self, column: Column) -> Cell {
        match column {
            AccountId => self.account_id.as_str().into(),
            SalesMoney => self.sales_money.into(),
            SalesQty => self.sales_qty.into(),
            SharePct => self.share_pct.into(),
            _ => Cell::Undefined,
        }
    }
}

impl TableRow for CustomerTargetSummary {
    fn cell(&self, column: Column) -> Cell {
        match column {
            AgentLabel => self.agent_label.as_str().into(),
            AccountId => self.account_id.as_str().into(),
            BaseMoney => self.base_money.into(),
            AddedMoney => self.added_money.into(),
            TargetMoney => self.target_money.into(),
            GrowthPct => self.growth_pct.into(),
            _ => Cell::Undefined,
        }
    }
}

impl TableRow for SelectionShare {
    fn cell(&self, column: Column) -> Cell {
        match column {
            SelectedMoney => self.selected_money.into(),
            AgentTotalMoney => self.agent_total_money.into(),
            SharePct => self.share_pct.into(),
            _ => Cell::Undefined,
        }
    }
}

impl TableRow for deltas::DeltaRecord {
    fn cell(&self, column: Column) -> Cell {
        match column {
            DeltaQty => self.delta_qty.into(),
            MonthlyAvg2025Qty => self.monthly_avg_2025_qty.into(),
            MonthlyAddQty => self.monthly_add_qty.into(),
            UpdatedAt => self.updated_at.to_rfc3339().as_str().into(),
            _ => Cell::Undefined,
        }
    }
}

/// Redacted form of a `ScopeView`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleScopeView {
    pub kind: ScopeKind,
    pub editable: bool,
    pub account_ids: Vec<String>,
    pub classes: VisibleTable,
    pub kpis: VisibleTable,
    pub selection_share: Option<VisibleTable>,
}

/// Redacted form of a `SelectionReport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSelectionReport {
    pub agent_id: String,
    pub agent_label: String,
    pub customers: VisibleTable,
    pub combined: VisibleTable,
    pub per_customer: Vec<(String, VisibleTable)>,
}

/// Strips the columns a caller may not see.
///
/// Column visibility is decided from the permission set once per table;
/// each category is removed as a whole.
#[derive(Debug, Clone)]
pub struct VisibilityFilter {
    permissions: PermissionSet,
}

impl VisibilityFilter {
    pub fn new(permissions: PermissionSet) -> Self {
        Self { permissions }
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Rejects scopes the caller may not open at all.
    pub fn authorize_scope(&self, scope: &Scope) -> Result<()> {
        if scope.kind() == ScopeKind::Company && !self.permissions.is_privileged() {
            return Err(ScopeError::CompanyScopeForbidden.into());
        }
        Ok(())
    }

    pub fn table<T: TableRow>(&self, columns: &[Column], rows: &[T]) -> VisibleTable {
        let columns = self.permissions.visible_columns(columns);
        let rows = rows
            .iter()
            .map(|row| columns.iter().map(|column| row.cell(*column)).collect())
            .collect();
        VisibleTable { columns, rows }
    }

    pub fn class_table(&self, classes: &[ClassTarget]) -> VisibleTable {
        self.table(CLASS_COLUMNS, classes)
    }

    pub fn item_table(&self, items: &[ItemTarget]) -> VisibleTable {
        self.table(ITEM_COLUMNS, items)
    }

    pub fn customer_table(&self, customers: &[CustomerSummary]) -> VisibleTable {
        self.table(CUSTOMER_SUMMARY_COLUMNS, customers)
    }

    /// A just-saved delta; every value in it is a quantity.
    pub fn saved_delta(&self, record: &deltas::DeltaRecord) -> VisibleTable {
        self.table(SAVED_DELTA_COLUMNS, std::slice::from_ref(record))
    }

    pub fn scope_view(&self, view: &ScopeView) -> VisibleScopeView {
        VisibleScopeView {
            kind: view.kind,
            editable: view.editable,
            account_ids: view.account_ids.clone(),
            classes: self.class_table(&view.classes),
            kpis: self.table(KPI_COLUMNS, std::slice::from_ref(&view.kpis)),
            selection_share: view
                .selection_share
                .as_ref()
                .map(|share| self.table(SELECTION_SHARE_COLUMNS, std::slice::from_ref(share))),
        }
    }

    pub fn selection_report(&self, report: &SelectionReport) -> VisibleSelectionReport {
        VisibleSelectionReport {
            agent_id: report.agent_id.clone(),
            agent_label: report.agent_label.clone(),
            customers: self.table(CUSTOMER_TARGET_COLUMNS, &report.customers),
            combined: self.class_table(&report.combined),
            per_customer: report
                .per_customer
                .iter()
                .map(|customer| (customer.account_id.clone(), self.class_table(&customer.classes)))
                .collect(),
        }
    }
}
