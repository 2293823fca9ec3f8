use crate::cli::ServeArgs;
use crate::infra::{Analytics, AppState};
use crate::routes::analytics_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use edu_insight::config::AppConfig;
use edu_insight::error::AppError;
use edu_insight::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let analytics = Arc::new(Analytics::load(&config.analytics)?);
    info!(
        students = analytics.dataset.len(),
        high_risk = analytics.summary.kpis.high_risk,
        "analytics loaded"
    );

    let app = analytics_router(analytics)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "learning analytics service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
