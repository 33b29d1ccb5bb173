use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::deltas_model::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, ItemDeltaKey, ItemDeltaUpdate,
};
use super::deltas_traits::DeltaRepositoryTrait;
use crate::errors::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    class_deltas: HashMap<(String, ClassDeltaKey), DeltaRecord>,
    item_deltas: HashMap<(String, ItemDeltaKey), DeltaRecord>,
    legacy_money: HashMap<(String, ClassDeltaKey), Decimal>,
}

/// Process-local delta store, for embedding without a database and for tests.
#[derive(Debug, Default)]
pub struct InMemoryDeltaRepository {
    tables: RwLock<Tables>,
}

impl InMemoryDeltaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a legacy money delta; current logic never writes these.
    pub fn with_legacy_money(
        self,
        user_id: &str,
        account_id: &str,
        class_id: &str,
        delta_money: Decimal,
    ) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.legacy_money.insert(
                (user_id.to_string(), ClassDeltaKey::new(account_id, class_id)),
                delta_money,
            );
        }
        self
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Repository("delta tables lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Repository("delta tables lock poisoned".to_string()))
    }
}

fn for_user<K: Clone + Eq + std::hash::Hash, V: Clone>(
    rows: &HashMap<(String, K), V>,
    user_id: &str,
) -> HashMap<K, V> {
    rows.iter()
        .filter(|((user, _), _)| user == user_id)
        .map(|((_, key), value)| (key.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl DeltaRepositoryTrait for InMemoryDeltaRepository {
    fn load_all_class_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, DeltaRecord>> {
        Ok(for_user(&self.read()?.class_deltas, user_id))
    }

    fn load_all_item_deltas(&self, user_id: &str) -> Result<HashMap<ItemDeltaKey, DeltaRecord>> {
        Ok(for_user(&self.read()?.item_deltas, user_id))
    }

    fn load_legacy_money_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, Decimal>> {
        Ok(for_user(&self.read()?.legacy_money, user_id))
    }

    async fn upsert_class_delta(&self, update: ClassDeltaUpdate) -> Result<DeltaRecord> {
        let record = DeltaRecord {
            delta_qty: update.delta_qty,
            monthly_avg_2025_qty: update.monthly_avg_2025_qty,
            monthly_add_qty: update.monthly_add_qty,
            updated_at: Utc::now(),
        };
        self.write()?
            .class_deltas
            .insert((update.user_id.clone(), update.key()), record.clone());
        Ok(record)
    }

    async fn upsert_item_delta(&self, update: ItemDeltaUpdate) -> Result<DeltaRecord> {
        let record = DeltaRecord {
            delta_qty: update.delta_qty,
            monthly_avg_2025_qty: update.monthly_avg_2025_qty,
            monthly_add_qty: update.monthly_add_qty,
            updated_at: Utc::now(),
        };
        self.write()?
            .item_deltas
            .insert((update.user_id.clone(), update.key()), record.clone());
        Ok(record)
    }
}
