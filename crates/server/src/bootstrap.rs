use std::sync::Arc;
use std::time::Duration;

use chowline_channel::IntentDispatcher;
use chowline_core::config::{AppConfig, ConfigError, LoadOptions};
use chowline_db::{connect, migrations, DbPool, SqliteHandoffQueue};
use chowline_worker::{
    HttpNotifier, HttpRecordStore, HttpSearchIndex, RecommendationWorker, Resolver,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<IntentDispatcher>,
    pub worker: Arc<RecommendationWorker>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let queue = Arc::new(SqliteHandoffQueue::with_visibility_timeout(
        db_pool.clone(),
        Duration::from_secs(config.worker.visibility_timeout_secs),
    ));

    let dispatcher = Arc::new(IntentDispatcher::new(config.dialog.clone(), queue.clone()));

    let resolver = Resolver::new(
        Arc::new(HttpSearchIndex::from_config(&config.search)),
        Arc::new(HttpRecordStore::from_config(&config.records)),
        &config.worker,
    );
    let worker = Arc::new(RecommendationWorker::new(
        queue,
        resolver,
        Arc::new(HttpNotifier::from_config(&config.notify)),
        Duration::from_secs(config.worker.poll_interval_secs),
    ));

    Ok(Application { config, db_pool, dispatcher, worker })
}
