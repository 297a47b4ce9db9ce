//! Create report_workshops table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportWorkshops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportWorkshops::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportWorkshops::ReportId).integer().not_null())
                    // Soft link: the cache row may not exist yet, so no foreign key
                    .col(ColumnDef::new(ReportWorkshops::WorkshopId).integer())
                    .col(ColumnDef::new(ReportWorkshops::WorkshopName).string())
                    .col(ColumnDef::new(ReportWorkshops::WorkshopDateStart).date())
                    .col(ColumnDef::new(ReportWorkshops::WorkshopDateEnd).date())
                    .col(ColumnDef::new(ReportWorkshops::Description).text())
                    .col(
                        ColumnDef::new(ReportWorkshops::ImageUrls)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(ReportWorkshops::CreatedAt)
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
                    .name("idx_report_workshops_report")
                    .table(ReportWorkshops::Table)
                    .col(ReportWorkshops::ReportId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportWorkshops::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ReportWorkshops {
    Table,
    Id,
    ReportId,
    WorkshopId,
    WorkshopName,
    WorkshopDateStart,
    WorkshopDateEnd,
    Description,
    ImageUrls,
    CreatedAt,
}
