use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;

use super::deltas_model::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, ItemDeltaKey, ItemDeltaUpdate,
};
use super::deltas_traits::DeltaRepositoryTrait;
use crate::errors::Result;

type ByClass<T> = HashMap<String, HashMap<String, T>>;

/// One user's deltas, indexed account -> class (-> item).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDeltas {
    class_deltas: ByClass<DeltaRecord>,
    item_deltas: ByClass<HashMap<String, DeltaRecord>>,
    legacy_money: ByClass<Decimal>,
}

impl UserDeltas {
    pub fn from_maps(
        class_deltas: HashMap<ClassDeltaKey, DeltaRecord>,
        item_deltas: HashMap<ItemDeltaKey, DeltaRecord>,
        legacy_money: HashMap<ClassDeltaKey, Decimal>,
    ) -> Self {
        let mut deltas = Self::default();
        for (key, record) in class_deltas {
            deltas.put_class(key, record);
        }
        for (key, record) in item_deltas {
            deltas.put_item(key, record);
        }
        for (key, money) in legacy_money {
            deltas
                .legacy_money
                .entry(key.account_id)
                .or_default()
                .insert(key.class_id, money);
        }
        deltas
    }

    fn put_class(&mut self, key: ClassDeltaKey, record: DeltaRecord) {
        self.class_deltas
            .entry(key.account_id)
            .or_default()
            .insert(key.class_id, record);
    }

    fn put_item(&mut self, key: ItemDeltaKey, record: DeltaRecord) {
        self.item_deltas
            .entry(key.account_id)
            .or_default()
            .entry(key.class_id)
            .or_default()
            .insert(key.item_id, record);
    }

    pub fn class_delta(&self, account_id: &str, class_id: &str) -> Option<&DeltaRecord> {
        self.class_deltas.get(account_id)?.get(class_id)
    }

    pub fn item_delta(&self, account_id: &str, class_id: &str, item_id: &str) -> Option<&DeltaRecord> {
        self.item_deltas.get(account_id)?.get(class_id)?.get(item_id)
    }

    pub fn legacy_money(&self, account_id: &str, class_id: &str) -> Option<Decimal> {
        self.legacy_money.get(account_id)?.get(class_id).copied()
    }

    /// Sum of every item delta stored under (account, class).
    pub fn item_delta_sum(&self, account_id: &str, class_id: &str) -> Decimal {
        self.item_deltas
            .get(account_id)
            .and_then(|classes| classes.get(class_id))
            .map(|items| items.values().map(|r| r.delta_qty).sum())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn class_delta_count(&self) -> usize {
        self.class_deltas.values().map(HashMap::len).sum()
    }

    pub fn item_delta_count(&self) -> usize {
        self.item_deltas
            .values()
            .flat_map(HashMap::values)
            .map(HashMap::len)
            .sum()
    }
}

/// Point-in-time copy of the delta store for a set of users.
///
/// The caller owns the snapshot and passes it into every computation.
/// Saves apply their stored record to it; `reload` re-reads the store so
/// writes from other sessions become visible.
#[derive(Debug, Clone)]
pub struct DeltaSnapshot {
    users: HashMap<String, UserDeltas>,
    loaded_at: DateTime<Utc>,
}

impl Default for DeltaSnapshot {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }
}

impl DeltaSnapshot {
    /// Loads the deltas of every user in `user_ids`.
    pub fn load(repository: &dyn DeltaRepositoryTrait, user_ids: &[String]) -> Result<Self> {
        let mut snapshot = Self::default();
        for user_id in user_ids {
            snapshot.load_user(repository, user_id)?;
        }
        Ok(snapshot)
    }

    /// Re-reads every user already in the snapshot.
    pub fn reload(&mut self, repository: &dyn DeltaRepositoryTrait) -> Result<()> {
        let user_ids: Vec<String> = self.users.keys().cloned().collect();
        let mut fresh = Self::load(repository, &user_ids)?;
        std::mem::swap(self, &mut fresh);
        debug!("Reloaded deltas for {} users", self.users.len());
        Ok(())
    }

    /// Loads `user_id` if the snapshot does not hold it yet.
    pub fn ensure_user(&mut self, repository: &dyn DeltaRepositoryTrait, user_id: &str) -> Result<()> {
        if !self.users.contains_key(user_id) {
            self.load_user(repository, user_id)?;
        }
        Ok(())
    }

    fn load_user(&mut self, repository: &dyn DeltaRepositoryTrait, user_id: &str) -> Result<()> {
        let deltas = UserDeltas::from_maps(
            repository.load_all_class_deltas(user_id)?,
            repository.load_all_item_deltas(user_id)?,
            repository.load_legacy_money_deltas(user_id)?,
        );
        debug!(
            "Loaded {} class and {} item deltas for user {}",
            deltas.class_delta_count(),
            deltas.item_delta_count(),
            user_id
        );
        self.users.insert(user_id.to_string(), deltas);
        Ok(())
    }

    /// Deltas for `user_id`; users never loaded have none.
    pub fn user(&self, user_id: &str) -> Option<&UserDeltas> {
        self.users.get(user_id)
    }

    pub fn user_ids(&self) -> BTreeSet<&str> {
        self.users.keys().map(String::as_str).collect()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn apply_class_update(&mut self, update: &ClassDeltaUpdate, record: DeltaRecord) {
        self.users
            .entry(update.user_id.clone())
            .or_default()
            .put_class(update.key(), record);
    }

    pub fn apply_item_update(&mut self, update: &ItemDeltaUpdate, record: DeltaRecord) {
        self.users
            .entry(update.user_id.clone())
            .or_default()
            .put_item(update.key(), record);
    }
}
