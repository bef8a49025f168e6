use crate::cli::ServeArgs;
use crate::infra::{AppState, PolicyState};
use crate::routes::risk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use vendowise::config::AppConfig;
use vendowise::error::AppError;
use vendowise::{telemetry, PolicyStore};

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

    let store = PolicyStore::new(&config.policy.path);
    let policy = store.load_or_init()?;
    let policy_state = PolicyState::new(store, policy);

    let app = risk_routes()
        .layer(Extension(policy_state))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, policy = %config.policy.path.display(), "vendowise risk service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
