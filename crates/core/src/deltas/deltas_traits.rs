use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::deltas_model::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, ItemDeltaKey, ItemDeltaUpdate,
};
use crate::errors::Result;

/// Persistence contract for user-entered deltas.
///
/// Loads return a point-in-time snapshot of one user's rows. Upserts are
/// atomic per key with last-write-wins semantics; no version check is made.
/// Rows that cannot be decoded are left out of the loaded maps.
#[async_trait]
pub trait DeltaRepositoryTrait: Send + Sync {
    /// All class-level quantity deltas of `user_id`, keyed by (account, class).
    fn load_all_class_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, DeltaRecord>>;

    /// All item-level quantity deltas of `user_id`, keyed by (account, class, item).
    fn load_all_item_deltas(&self, user_id: &str) -> Result<HashMap<ItemDeltaKey, DeltaRecord>>;

    /// Read-only money deltas written before quantities were tracked.
    fn load_legacy_money_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, Decimal>>;

    async fn upsert_class_delta(&self, update: ClassDeltaUpdate) -> Result<DeltaRecord>;

    async fn upsert_item_delta(&self, update: ItemDeltaUpdate) -> Result<DeltaRecord>;
}
