//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_workshop_cache;
mod m20250601_000002_create_report_workshops;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_workshop_cache::Migration),
            Box::new(m20250601_000002_create_report_workshops::Migration),
        ]
    }
}
