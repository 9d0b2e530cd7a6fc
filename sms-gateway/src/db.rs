use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Initialize a connection pool to the PostgreSQL database using the pool
/// sizing knobs from `Config`.
pub async fn init_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect(&config.database_url)
        .await
}

/// Run the embedded migrations against `pool`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./db/migrations").run(pool).await
}
