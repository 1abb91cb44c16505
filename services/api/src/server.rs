use crate::cli::ServeArgs;
use crate::infra::{load_guidelines, memory_service, seed_demo_data, AppState};
use crate::routes::with_record_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use igtrack::config::AppConfig;
use igtrack::error::AppError;
use igtrack::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let guidelines = load_guidelines(&config.guidelines)?;
    info!(guidelines = ?guidelines.names(), "guideline tables loaded");

    let (service, store) = memory_service(guidelines);
    seed_demo_data(&service, &store)?;

    let app = with_record_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "immunoglobulin tracking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
