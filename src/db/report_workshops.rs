//! Database queries for workshop extension rows.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::entity::report_workshop::{self as workshop, ActiveModel, Entity as ReportWorkshop};
use crate::error::{AppError, AppResult};
use crate::models::{NewWorkshopExtension, WorkshopExtension};
use crate::store::ExtensionStore;

use super::DbPool;

fn to_domain(model: workshop::Model) -> WorkshopExtension {
    let image_urls = match serde_json::from_value::<Vec<String>>(model.image_urls) {
        Ok(urls) => urls,
        Err(e) => {
            tracing::warn!("Workshop {} has unreadable image_urls: {}", model.id, e);
            Vec::new()
        }
    };

    WorkshopExtension {
        id: model.id,
        report_id: model.report_id,
        workshop_cache_id: model.workshop_cache_id,
        workshop_name: model.workshop_name,
        date_start: model.workshop_date_start,
        date_end: model.workshop_date_end,
        description: model.description,
        image_urls,
    }
}

#[async_trait]
impl ExtensionStore for DbPool {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<WorkshopExtension>> {
        let result = ReportWorkshop::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get workshop: {}", e)))?;

        Ok(result.map(to_domain))
    }

    async fn find_by_report_id(&self, report_id: i32) -> AppResult<Vec<WorkshopExtension>> {
        let rows = ReportWorkshop::find()
            .filter(workshop::Column::ReportId.eq(report_id))
            .order_by_asc(workshop::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list workshops: {}", e)))?;

        Ok(rows.into_iter().map(to_domain).collect())
    }

    async fn insert_many(
        &self,
        rows: Vec<NewWorkshopExtension>,
    ) -> AppResult<Vec<WorkshopExtension>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            let model = ActiveModel {
                report_id: Set(row.report_id),
                workshop_cache_id: Set(row.workshop_cache_id),
                workshop_name: Set(row.workshop_name),
                workshop_date_start: Set(row.date_start),
                workshop_date_end: Set(row.date_end),
                description: Set(row.description),
                image_urls: Set(serde_json::json!(row.image_urls)),
                created_at: Set(now),
                ..Default::default()
            };

            let result = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to insert workshop: {}", e)))?;
            inserted.push(to_domain(result));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit workshops: {}", e)))?;

        Ok(inserted)
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<bool> {
        let result = ReportWorkshop::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete workshop: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_by_report_id(&self, report_id: i32) -> AppResult<u64> {
        let result = ReportWorkshop::delete_many()
            .filter(workshop::Column::ReportId.eq(report_id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete workshops: {}", e)))?;

        Ok(result.rows_affected)
    }
}
