//! Delta domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Key of a class-level delta (and of a legacy money delta) within one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeltaKey {
    pub account_id: String,
    pub class_id: String,
}

impl ClassDeltaKey {
    pub fn new(account_id: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            class_id: class_id.into(),
        }
    }
}

/// Key of an item-level delta within one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeltaKey {
    pub account_id: String,
    pub class_id: String,
    pub item_id: String,
}

impl ItemDeltaKey {
    pub fn new(
        account_id: impl Into<String>,
        class_id: impl Into<String>,
        item_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            class_id: class_id.into(),
            item_id: item_id.into(),
        }
    }
}

/// A persisted quantity delta with its monthly snapshot at save time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRecord {
    pub delta_qty: Decimal,
    pub monthly_avg_2025_qty: Decimal,
    pub monthly_add_qty: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for a class-level delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeltaUpdate {
    pub user_id: String,
    pub account_id: String,
    pub class_id: String,
    pub delta_qty: Decimal,
    pub monthly_avg_2025_qty: Decimal,
    pub monthly_add_qty: Decimal,
}

impl ClassDeltaUpdate {
    pub fn key(&self) -> ClassDeltaKey {
        ClassDeltaKey::new(self.account_id.clone(), self.class_id.clone())
    }
}

/// Upsert payload for an item-level delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDeltaUpdate {
    pub user_id: String,
    pub account_id: String,
    pub class_id: String,
    pub item_id: String,
    pub delta_qty: Decimal,
    pub monthly_avg_2025_qty: Decimal,
    pub monthly_add_qty: Decimal,
}

impl ItemDeltaUpdate {
    pub fn key(&self) -> ItemDeltaKey {
        ItemDeltaKey::new(
            self.account_id.clone(),
            self.class_id.clone(),
            self.item_id.clone(),
        )
    }
}

/// Where an effective class-level delta came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaSource {
    /// A stored quantity delta (authoritative even when zero).
    Recorded,
    /// Converted from a legacy money delta at the current average price.
    LegacyMoney,
    /// Nothing applicable was stored.
    None,
}

/// A class-level delta after the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDelta {
    pub delta_qty: Decimal,
    pub source: DeltaSource,
}

impl ResolvedDelta {
    pub fn none() -> Self {
        Self {
            delta_qty: Decimal::ZERO,
            source: DeltaSource::None,
        }
    }
}

/// The delta attributed to a class once item deltas are rolled up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveClassDelta {
    pub class_level: ResolvedDelta,
    /// Sum of the item deltas stored under the class.
    pub items_qty: Decimal,
}

impl EffectiveClassDelta {
    /// Class-level delta plus every item delta under the class.
    pub fn total_qty(&self) -> Decimal {
        self.class_level.delta_qty + self.items_qty
    }
}
