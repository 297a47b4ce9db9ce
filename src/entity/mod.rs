//! SeaORM entity definitions for PostgreSQL database.

pub mod report_workshop;
pub mod workshop_cache;
