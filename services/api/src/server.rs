use crate::cli::ServeArgs;
use crate::infra::{open_repositories, AppState};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_hub::api::AppServices;
use estate_hub::clock::SystemClock;
use estate_hub::config::AppConfig;
use estate_hub::error::AppError;
use estate_hub::listings::HttpRecommendationClient;
use estate_hub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.database.take() {
        config.database.path = path;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repositories = open_repositories(&config.database)?;
    let recommender = Arc::new(HttpRecommendationClient::from_config(
        &config.recommendations,
    )?);
    let services = AppServices::new(&repositories, Arc::new(SystemClock), recommender);

    let app = with_marketplace_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.database.path,
        "estate hub api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
