//! Workshop cache entity: snapshots of externally managed workshops.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workshop_cache")]
pub struct Model {
    /// Workshop id assigned by the workshop service
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
    pub date_start: Option<Date>,
    pub date_end: Option<Date>,
    /// "A" (active) or "I" (inactive), as the last event carried it
    pub status: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
