//! Database migrations for Geotrack

pub use sea_orm_migration::prelude::*;

mod migration;
pub use migration::Migrator;
