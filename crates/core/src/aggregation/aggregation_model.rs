//! Aggregated sales models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::safe_div;

/// Running money and quantity sums for one group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub sales_money: Decimal,
    pub sales_qty: Decimal,
}

impl SalesTotals {
    pub fn add(&mut self, money: Decimal, qty: Decimal) {
        self.sales_money += money;
        self.sales_qty += qty;
    }

    /// Money per unit; `None` when no quantity was sold or the class sold
    /// for nothing. A zero price cannot convert money into quantity.
    pub fn avg_price(&self) -> Option<Decimal> {
        if self.sales_money.is_zero() {
            return None;
        }
        safe_div(self.sales_money, Some(self.sales_qty))
    }
}

/// Sales of one product class within a scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassAggregate {
    pub class_id: String,
    pub sales_money: Decimal,
    pub sales_qty: Decimal,
    pub avg_price: Option<Decimal>,
}

impl ClassAggregate {
    pub fn totals(&self) -> SalesTotals {
        SalesTotals {
            sales_money: self.sales_money,
            sales_qty: self.sales_qty,
        }
    }
}

/// Sales of one item (within its class) within a scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemAggregate {
    pub class_id: String,
    pub item_id: String,
    pub sales_money: Decimal,
    pub sales_qty: Decimal,
    pub avg_price: Option<Decimal>,
}

impl ItemAggregate {
    pub fn totals(&self) -> SalesTotals {
        SalesTotals {
            sales_money: self.sales_money,
            sales_qty: self.sales_qty,
        }
    }
}

/// Narrows the item detail view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    /// Case-insensitive substring of the item id.
    pub query: Option<String>,
    /// Only these classes; empty keeps every class.
    pub classes: Vec<String>,
}

impl ItemFilter {
    pub fn matches(&self, class_id: &str, item_id: &str) -> bool {
        if !self.classes.is_empty() && !self.classes.iter().any(|c| c == class_id) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => item_id.to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        }
    }
}
