//! Test utilities for database integration tests
//!
//! Backed by an in-memory SQLite database so tests need no external
//! services. The pool is pinned to one connection because every SQLite
//! `:memory:` connection opens its own empty database.

use crate::{connect_with, DbConnection};
use sea_orm::ConnectOptions;
use std::sync::Arc;

pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// A fresh, migrated, in-memory database
pub async fn memory_database() -> anyhow::Result<Arc<DbConnection>> {
    let mut opt = ConnectOptions::new(MEMORY_DATABASE_URL);
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    connect_with(opt)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create test database: {}", e))
}
