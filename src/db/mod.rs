// [rust] Module declarations - organize database-related functionality
pub mod models; // Row types and API response shapes
pub mod queries; // Read/write queries for users, categories and order history

// [rust] Re-export so callers can write db::User instead of db::models::User
pub use models::*;
pub use queries::*;

// [library] SQLx - async SQL toolkit; MySQL pool types
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;

use crate::config::Config;

// [rust] Shared handle to the connection pool, cloned into every handler
pub type Database = Arc<Pool<MySql>>;

// [business] Pool factory - bounded pool with an acquire deadline, optional migrations
pub async fn create_pool(config: &Config) -> Result<Database, anyhow::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect(config.database_url())
        .await?;

    if config.run_migrations {
        // [library] Migration files are embedded into the binary at compile time
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(pool))
}

// [business] Pool that never connects until first use - lets the router be built without a live database
pub fn lazy_pool(database_url: &str) -> Result<Database, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_lazy(database_url)?;
    Ok(Arc::new(pool))
}
