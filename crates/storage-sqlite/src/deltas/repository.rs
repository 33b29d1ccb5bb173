use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel::SqliteConnection;
use log::{debug, warn};
use rust_decimal::Decimal;

use sales_targets_core::deltas::{
    ClassDeltaKey, ClassDeltaUpdate, DeltaRecord, DeltaRepositoryTrait, ItemDeltaKey,
    ItemDeltaUpdate,
};
use sales_targets_core::Result;

use super::model::{ClassDeltaMoneyDB, ClassDeltaQtyDB, ItemDeltaQtyDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{class_delta_money, class_delta_qty, item_delta_qty};

/// SQLite-backed delta store.
///
/// Reads go through the pool, writes through the single writer actor.
pub struct DeltaRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl DeltaRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        DeltaRepository { pool, writer }
    }
}

#[async_trait]
impl DeltaRepositoryTrait for DeltaRepository {
    fn load_all_class_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, DeltaRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = class_delta_qty::table
            .filter(class_delta_qty::user_id.eq(user_id))
            .select(ClassDeltaQtyDB::as_select())
            .load::<ClassDeltaQtyDB>(&mut conn)
            .map_err(StorageError::from)?;

        let total = rows.len();
        let mut out = HashMap::with_capacity(total);
        for row in rows {
            let label = format!("{}/{}", row.account_id, row.class_id);
            match row.into_entry() {
                Some((key, record)) => {
                    out.insert(key, record);
                }
                None => warn!("Dropping malformed class delta row {} for user {}", label, user_id),
            }
        }
        debug!("Loaded {}/{} class delta rows for user {}", out.len(), total, user_id);
        Ok(out)
    }

    fn load_all_item_deltas(&self, user_id: &str) -> Result<HashMap<ItemDeltaKey, DeltaRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = item_delta_qty::table
            .filter(item_delta_qty::user_id.eq(user_id))
            .select(ItemDeltaQtyDB::as_select())
            .load::<ItemDeltaQtyDB>(&mut conn)
            .map_err(StorageError::from)?;

        let total = rows.len();
        let mut out = HashMap::with_capacity(total);
        for row in rows {
            let label = format!("{}/{}/{}", row.account_id, row.class_id, row.item_id);
            match row.into_entry() {
                Some((key, record)) => {
                    out.insert(key, record);
                }
                None => warn!("Dropping malformed item delta row {} for user {}", label, user_id),
            }
        }
        debug!("Loaded {}/{} item delta rows for user {}", out.len(), total, user_id);
        Ok(out)
    }

    fn load_legacy_money_deltas(&self, user_id: &str) -> Result<HashMap<ClassDeltaKey, Decimal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = class_delta_money::table
            .filter(class_delta_money::user_id.eq(user_id))
            .select(ClassDeltaMoneyDB::as_select())
            .load::<ClassDeltaMoneyDB>(&mut conn)
            .map_err(StorageError::from)?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let label = format!("{}/{}", row.account_id, row.class_id);
            match row.into_entry() {
                Some((key, money)) => {
                    out.insert(key, money);
                }
                None => warn!("Dropping malformed legacy money row {} for user {}", label, user_id),
            }
        }
        Ok(out)
    }

    async fn upsert_class_delta(&self, update: ClassDeltaUpdate) -> Result<DeltaRecord> {
        let now = Utc::now();
        let row = ClassDeltaQtyDB::from_update(&update, now)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(class_delta_qty::table)
                    .values(&row)
                    .on_conflict((
                        class_delta_qty::user_id,
                        class_delta_qty::account_id,
                        class_delta_qty::class_id,
                    ))
                    .do_update()
                    .set((
                        class_delta_qty::delta_qty.eq(excluded(class_delta_qty::delta_qty)),
                        class_delta_qty::monthly_avg_2025_qty
                            .eq(excluded(class_delta_qty::monthly_avg_2025_qty)),
                        class_delta_qty::monthly_add_qty
                            .eq(excluded(class_delta_qty::monthly_add_qty)),
                        class_delta_qty::updated_at.eq(excluded(class_delta_qty::updated_at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;

        Ok(DeltaRecord {
            delta_qty: update.delta_qty,
            monthly_avg_2025_qty: update.monthly_avg_2025_qty,
            monthly_add_qty: update.monthly_add_qty,
            updated_at: now,
        })
    }

    async fn upsert_item_delta(&self, update: ItemDeltaUpdate) -> Result<DeltaRecord> {
        let now = Utc::now();
        let row = ItemDeltaQtyDB::from_update(&update, now)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(item_delta_qty::table)
                    .values(&row)
                    .on_conflict((
                        item_delta_qty::user_id,
                        item_delta_qty::account_id,
                        item_delta_qty::class_id,
                        item_delta_qty::item_id,
                    ))
                    .do_update()
                    .set((
                        item_delta_qty::delta_qty.eq(excluded(item_delta_qty::delta_qty)),
                        item_delta_qty::monthly_avg_2025_qty
                            .eq(excluded(item_delta_qty::monthly_avg_2025_qty)),
                        item_delta_qty::monthly_add_qty
                            .eq(excluded(item_delta_qty::monthly_add_qty)),
                        item_delta_qty::updated_at.eq(excluded(item_delta_qty::updated_at)),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;

        Ok(DeltaRecord {
            delta_qty: update.delta_qty,
            monthly_avg_2025_qty: update.monthly_avg_2025_qty,
            monthly_add_qty: update.monthly_add_qty,
            updated_at: now,
        })
    }
}
