// Connection pool shared by every request. The `any` driver lets the same
// queries run against MySQL in production and SQLite locally/in tests.

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::migrate::MigrateDatabase;
use sqlx::{AnyPool, Sqlite};
use std::time::Duration;
use tracing::info;

pub async fn establish_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<AnyPool, sqlx::Error> {
    install_default_drivers();

    let file_backed_sqlite = database_url.starts_with("sqlite:") && !database_url.contains(":memory:");

    // Create database if it doesn't exist
    if file_backed_sqlite && !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        Sqlite::create_database(database_url).await?;
        info!("Created SQLite database {}", database_url);
    }

    let mut options = AnyPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5));

    // Every connection to `sqlite::memory:` is its own database, so keep a
    // single connection alive for the lifetime of the pool.
    if database_url.contains(":memory:") {
        options = options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = options.connect(database_url).await?;

    if file_backed_sqlite {
        // Enable WAL mode for better concurrency
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
    }

    info!("Database connection established ({})", backend_name(database_url));
    Ok(pool)
}

fn backend_name(database_url: &str) -> &str {
    database_url.split(':').next().unwrap_or("unknown")
}
