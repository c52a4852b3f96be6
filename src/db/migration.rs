use sqlx::AnyPool;
use tracing::info;

// Kept to the subset of DDL that MySQL and SQLite both accept. One statement
// per query: MySQL rejects multi-statement strings by default.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS deposit_addresses (
        address VARCHAR(128) NOT NULL PRIMARY KEY,
        smart_address VARCHAR(128) NULL UNIQUE,
        chain VARCHAR(16) NOT NULL,
        created_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS processed_transactions (
        tx_hash VARCHAR(128) NOT NULL PRIMARY KEY,
        chain VARCHAR(32) NOT NULL,
        address VARCHAR(128) NOT NULL,
        amount VARCHAR(96) NOT NULL,
        processed_at BIGINT NOT NULL
    )",
];

pub async fn run_migrations(pool: &AnyPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}
