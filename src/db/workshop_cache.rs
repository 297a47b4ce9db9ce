//! Database queries for the workshop cache.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, EntityTrait, Insert, QueryOrder, Set};

use crate::entity::workshop_cache::{self as cache, ActiveModel, Entity as WorkshopCache};
use crate::error::{AppError, AppResult};
use crate::models::WorkshopCacheSnapshot;
use crate::store::{WorkshopCacheReader, WorkshopCacheWriter};

use super::DbPool;

fn to_snapshot(model: cache::Model) -> WorkshopCacheSnapshot {
    WorkshopCacheSnapshot {
        id: model.id,
        name: model.name,
        date_start: model.date_start,
        date_end: model.date_end,
        status: model.status,
    }
}

fn to_active(snapshot: WorkshopCacheSnapshot) -> ActiveModel {
    ActiveModel {
        id: Set(snapshot.id),
        name: Set(snapshot.name),
        date_start: Set(snapshot.date_start),
        date_end: Set(snapshot.date_end),
        status: Set(snapshot.status),
        updated_at: Set(Utc::now()),
    }
}

/// Insert that overwrites the row already holding the snapshot's id.
fn upsert(snapshot: WorkshopCacheSnapshot) -> Insert<ActiveModel> {
    WorkshopCache::insert(to_active(snapshot)).on_conflict(
        OnConflict::column(cache::Column::Id)
            .update_columns([
                cache::Column::Name,
                cache::Column::DateStart,
                cache::Column::DateEnd,
                cache::Column::Status,
                cache::Column::UpdatedAt,
            ])
            .to_owned(),
    )
}

#[async_trait]
impl WorkshopCacheReader for DbPool {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopCacheSnapshot>> {
        let result = WorkshopCache::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get workshop cache: {}", e)))?;

        Ok(result.map(to_snapshot))
    }

    async fn find_all(&self, status: Option<&str>) -> AppResult<Vec<WorkshopCacheSnapshot>> {
        let rows = WorkshopCache::find()
            .order_by_asc(cache::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list workshop cache: {}", e)))?;

        // Status is matched case-insensitively; the cache stores what the event carried
        Ok(rows
            .into_iter()
            .map(to_snapshot)
            .filter(|snapshot| snapshot.matches_status(status))
            .collect())
    }
}

#[async_trait]
impl WorkshopCacheWriter for DbPool {
    async fn insert(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot> {
        upsert(snapshot.clone())
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert workshop cache: {}", e)))?;

        Ok(snapshot)
    }

    async fn update(&self, snapshot: WorkshopCacheSnapshot) -> AppResult<WorkshopCacheSnapshot> {
        let result = to_active(snapshot)
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update workshop cache: {}", e)))?;

        Ok(to_snapshot(result))
    }
}
