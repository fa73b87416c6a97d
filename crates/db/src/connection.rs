use std::str::FromStr;
use std::time::Duration;

use chowline_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

/// Opens the pool described by the database section of the application
/// config. The busy timeout is derived from the same acquire timeout so a
/// locked database gives up in step with the pool.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let timeout = Duration::from_secs(timeout_secs.max(1));
    let options = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(timeout);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(timeout)
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use chowline_core::config::DatabaseConfig;

    use super::connect;

    #[tokio::test]
    async fn connect_builds_the_pool_from_the_config_section() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 7,
        };
        let pool = connect(&config).await.expect("connect");

        let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("read foreign_keys pragma");
        assert_eq!(foreign_keys, 1);

        let busy_timeout_ms: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .expect("read busy_timeout pragma");
        assert_eq!(busy_timeout_ms, 7_000, "busy timeout follows timeout_secs");

        pool.close().await;
    }

    #[tokio::test]
    async fn zero_limits_are_clamped_instead_of_rejected() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 0,
            timeout_secs: 0,
        };
        let pool = connect(&config).await.expect("connect despite zero limits");

        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("query");
        assert_eq!(one, 1);

        pool.close().await;
    }
}
