//! Create workshop_cache table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkshopCache::Table)
                    .if_not_exists()
                    // Ids come from the workshop service, never generated here
                    .col(
                        ColumnDef::new(WorkshopCache::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkshopCache::Name).string().not_null())
                    .col(ColumnDef::new(WorkshopCache::DateStart).date().null())
                    .col(ColumnDef::new(WorkshopCache::DateEnd).date().null())
                    .col(ColumnDef::new(WorkshopCache::Status).string_len(1).null())
                    .col(
                        ColumnDef::new(WorkshopCache::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workshop_cache_status")
                    .table(WorkshopCache::Table)
                    .col(WorkshopCache::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkshopCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkshopCache {
    Table,
    Id,
    Name,
    DateStart,
    DateEnd,
    Status,
    UpdatedAt,
}
