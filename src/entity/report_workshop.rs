//! Workshop extension entity: locally owned workshop rows attached to a remote report.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "report_workshops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Id of the report in the remote report service (no local FK)
    pub report_id: i32,
    /// Soft link to workshop_cache.id; the snapshot may arrive later
    #[sea_orm(column_name = "workshop_id")]
    pub workshop_cache_id: Option<i32>,
    pub workshop_name: Option<String>,
    pub workshop_date_start: Option<Date>,
    pub workshop_date_end: Option<Date>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// JSON array of image URLs
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: JsonValue,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
