use estate_hub::config::DatabaseConfig;
use estate_hub::error::AppError;
use estate_hub::repository::Repositories;
use estate_hub::store::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens (and migrates) the configured database behind the SQLite repositories.
pub(crate) fn open_repositories(config: &DatabaseConfig) -> Result<Repositories, AppError> {
    if config.is_in_memory() {
        tracing::warn!("using an in-memory database; data is lost on exit");
    }
    let db = Database::open(&config.path)?;
    Ok(Repositories::sqlite(Arc::new(db)))
}
