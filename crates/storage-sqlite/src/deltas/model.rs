//! Database models for target deltas.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use sales_targets_core::deltas::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, ItemDeltaKey, ItemDeltaUpdate,
};
use sales_targets_core::errors::{Result, ValidationError};

/// Decimal view of a stored REAL; `None` for NaN or infinities.
pub(crate) fn decimal_from_db(value: f64) -> Option<Decimal> {
    if value.is_finite() {
        Decimal::from_f64(value)
    } else {
        None
    }
}

pub(crate) fn decimal_to_db(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NonFiniteDelta(value.to_string()).into())
}

pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Database model for class-level quantity deltas
#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::class_delta_qty)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClassDeltaQtyDB {
    pub user_id: String,
    pub account_id: String,
    pub class_id: String,
    pub delta_qty: f64,
    pub monthly_avg_2025_qty: f64,
    pub monthly_add_qty: f64,
    pub updated_at: String,
}

impl ClassDeltaQtyDB {
    pub fn from_update(update: &ClassDeltaUpdate, updated_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            user_id: update.user_id.clone(),
            account_id: update.account_id.clone(),
            class_id: update.class_id.clone(),
            delta_qty: decimal_to_db(update.delta_qty)?,
            monthly_avg_2025_qty: decimal_to_db(update.monthly_avg_2025_qty)?,
            monthly_add_qty: decimal_to_db(update.monthly_add_qty)?,
            updated_at: updated_at.to_rfc3339(),
        })
    }

    /// Domain entry for this row, or `None` when the row is malformed.
    pub fn into_entry(self) -> Option<(ClassDeltaKey, DeltaRecord)> {
        let record = DeltaRecord {
            delta_qty: decimal_from_db(self.delta_qty)?,
            monthly_avg_2025_qty: decimal_from_db(self.monthly_avg_2025_qty)?,
            monthly_add_qty: decimal_from_db(self.monthly_add_qty)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        };
        Some((ClassDeltaKey::new(self.account_id, self.class_id), record))
    }
}

/// Database model for item-level quantity deltas
#[derive(Queryable, Selectable, Insertable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::item_delta_qty)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ItemDeltaQtyDB {
    pub user_id: String,
    pub account_id: String,
    pub class_id: String,
    pub item_id: String,
    pub delta_qty: f64,
    pub monthly_avg_2025_qty: f64,
    pub monthly_add_qty: f64,
    pub updated_at: String,
}

impl ItemDeltaQtyDB {
    pub fn from_update(update: &ItemDeltaUpdate, updated_at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            user_id: update.user_id.clone(),
            account_id: update.account_id.clone(),
            class_id: update.class_id.clone(),
            item_id: update.item_id.clone(),
            delta_qty: decimal_to_db(update.delta_qty)?,
            monthly_avg_2025_qty: decimal_to_db(update.monthly_avg_2025_qty)?,
            monthly_add_qty: decimal_to_db(update.monthly_add_qty)?,
            updated_at: updated_at.to_rfc3339(),
        })
    }

    pub fn into_entry(self) -> Option<(ItemDeltaKey, DeltaRecord)> {
        let record = DeltaRecord {
            delta_qty: decimal_from_db(self.delta_qty)?,
            monthly_avg_2025_qty: decimal_from_db(self.monthly_avg_2025_qty)?,
            monthly_add_qty: decimal_from_db(self.monthly_add_qty)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        };
        Some((
            ItemDeltaKey::new(self.account_id, self.class_id, self.item_id),
            record,
        ))
    }
}

/// Database model for the legacy money deltas
#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::class_delta_money)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClassDeltaMoneyDB {
    pub user_id: String,
    pub account_id: String,
    pub class_id: String,
    pub delta_money: f64,
    pub updated_at: String,
}

impl ClassDeltaMoneyDB {
    /// The timestamp is not read back, only the amount must be sound.
    pub fn into_entry(self) -> Option<(ClassDeltaKey, Decimal)> {
        let money = decimal_from_db(self.delta_money)?;
        Some((ClassDeltaKey::new(self.account_id, self.class_id), money))
    }
}
