use std::collections::BTreeMap;

use log::debug;

use super::aggregation_model::{ClassAggregate, ItemAggregate, ItemFilter, SalesTotals};
use crate::facts::SalesFact;

/// Groups facts by `key_fn`, returning one entry per distinct key sorted by
/// money descending, ties broken by key ascending.
pub fn aggregate_by<'a, K, I, F>(facts: I, key_fn: F) -> Vec<(K, SalesTotals)>
where
    K: Ord,
    I: IntoIterator<Item = &'a SalesFact>,
    F: Fn(&'a SalesFact) -> K,
{
    let mut groups: BTreeMap<K, SalesTotals> = BTreeMap::new();
    for fact in facts {
        groups
            .entry(key_fn(fact))
            .or_default()
            .add(fact.net_money, fact.quantity);
    }

    // BTreeMap iteration is key-ascending and sort_by is stable, so equal
    // money keeps the key order.
    let mut rows: Vec<(K, SalesTotals)> = groups.into_iter().collect();
    rows.sort_by(|a, b| b.1.sales_money.cmp(&a.1.sales_money));
    rows
}

/// One row per class present in `facts`.
pub fn aggregate_classes<'a, I>(facts: I) -> Vec<ClassAggregate>
where
    I: IntoIterator<Item = &'a SalesFact>,
{
    let rows: Vec<ClassAggregate> = aggregate_by(facts, |f| f.class_id.as_str())
        .into_iter()
        .map(|(class_id, totals)| ClassAggregate {
            class_id: class_id.to_string(),
            sales_money: totals.sales_money,
            sales_qty: totals.sales_qty,
            avg_price: totals.avg_price(),
        })
        .collect();
    debug!("Aggregated {} classes", rows.len());
    rows
}

/// One row per (class, item) present in `facts` that passes `filter`.
pub fn aggregate_items<'a, I>(facts: I, filter: &ItemFilter) -> Vec<ItemAggregate>
where
    I: IntoIterator<Item = &'a SalesFact>,
{
    let matching = facts
        .into_iter()
        .filter(|f| filter.matches(&f.class_id, f.item_key()));
    aggregate_by(matching, |f| (f.class_id.as_str(), f.item_key()))
        .into_iter()
        .map(|((class_id, item_id), totals)| ItemAggregate {
            class_id: class_id.to_string(),
            item_id: item_id.to_string(),
            sales_money: totals.sales_money,
            sales_qty: totals.sales_qty,
            avg_price: totals.avg_price(),
        })
        .collect()
}
