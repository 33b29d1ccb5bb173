//! Visibility domain models.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Field categories a caller may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldCategory {
    /// Money-bearing columns and ratios derived from money.
    Money,
    /// Quantity-bearing columns, including monthly figures.
    Quantity,
    /// Item identifiers.
    ItemIdentity,
}

impl FieldCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Money => "money",
            FieldCategory::Quantity => "quantity",
            FieldCategory::ItemIdentity => "item_identity",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "money" => Ok(FieldCategory::Money),
            "quantity" | "qty" => Ok(FieldCategory::Quantity),
            "item_identity" | "item" => Ok(FieldCategory::ItemIdentity),
            other => Err(format!("Unknown field category: {}", other)),
        }
    }
}

/// What a caller may see. Privileged callers see everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    categories: BTreeSet<FieldCategory>,
    privileged: bool,
}

impl PermissionSet {
    pub fn new(categories: impl IntoIterator<Item = FieldCategory>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            privileged: false,
        }
    }

    pub fn privileged() -> Self {
        Self {
            categories: BTreeSet::new(),
            privileged: true,
        }
    }

    /// Parses a comma separated category list, e.g. `money,quantity`.
    /// The single token `all` yields a privileged set.
    pub fn parse(list: &str) -> Result<Self> {
        if list.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::privileged());
        }
        let categories = list
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<FieldCategory>()
                    .map_err(|e| Error::Validation(ValidationError::InvalidInput(e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(categories))
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn allows(&self, category: FieldCategory) -> bool {
        self.privileged || self.categories.contains(&category)
    }

    /// Narrows `columns` to the visible ones, keeping their order.
    pub fn visible_columns(&self, columns: &[Column]) -> Vec<Column> {
        columns
            .iter()
            .copied()
            .filter(|column| column.category().map_or(true, |c| self.allows(c)))
            .collect()
    }
}

/// Every column a derived table can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    AgentLabel,
    AccountId,
    ClassId,
    ItemId,
    UpdatedAt,
    // money
    SalesMoney,
    AvgPrice,
    DeltaMoney,
    TargetMoney,
    AttainmentPct,
    BaseMoney,
    AddedMoney,
    GrowthPct,
    SharePct,
    SelectedMoney,
    AgentTotalMoney,
    // quantity
    SalesQty,
    DeltaQty,
    TargetQty,
    MonthlyAvg2025Qty,
    MonthlyAddQty,
    MonthlyTargetQty,
    VarianceQty,
    ClassDeltaQty,
    ItemsDeltaQty,
    DeltaSource,
    BaseQty,
    AddedQty,
}

impl Column {
    /// Category gating this column; `None` is always visible.
    pub fn category(&self) -> Option<FieldCategory> {
        use Column::*;
        match self {
            AgentLabel | AccountId | ClassId | UpdatedAt => None,
            ItemId => Some(FieldCategory::ItemIdentity),
            SalesMoney | AvgPrice | DeltaMoney | TargetMoney | AttainmentPct | BaseMoney
            | AddedMoney | GrowthPct | SharePct | SelectedMoney | AgentTotalMoney => {
                Some(FieldCategory::Money)
            }
            SalesQty | DeltaQty | TargetQty | MonthlyAvg2025Qty | MonthlyAddQty
            | MonthlyTargetQty | VarianceQty | ClassDeltaQty | ItemsDeltaQty | DeltaSource
            | BaseQty | AddedQty => Some(FieldCategory::Quantity),
        }
    }
}

/// A single output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(Decimal),
    Text(String),
    Undefined,
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Number(value)
    }
}

impl From<Option<Decimal>> for Cell {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Cell::Undefined, Cell::Number)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

/// A redacted table: only visible columns, rows aligned to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl VisibleTable {
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Cell of `column` in row `row`, if both exist.
    pub fn cell(&self, row: usize, column: Column) -> Option<&Cell> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.rows.get(row)?.get(index)
    }
}
