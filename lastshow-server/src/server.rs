use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use axum::{
    Extension, Router,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, get_service},
    serve,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt};

use shared::config::server::{Config, LogFormat};

use crate::{
    app_state::AppState,
    middleware::{
        request_context::{self, RequestIdState},
        route_guard::{self, GuardState},
    },
    routes,
    services::api_client::{ApiClientError, HttpObituaryApi},
    tracer,
};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Handle to the process-wide Prometheus recorder, installed on first use.
pub fn metrics_handle() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                warn!("a metrics recorder was already installed; /metrics will stay empty");
            }
            handle
        })
        .clone()
}

async fn metrics_endpoint(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        handle.render(),
    )
}

/// Initializes the tracing subscriber for logging using the provided configuration.
///
/// Returns the configured level; a subscriber installed earlier is left in place.
pub fn initialize_tracing(config: &Config) -> String {
    let env_filter = build_env_filter(config);

    let fmt_builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let installed = if matches!(config.logging.format, LogFormat::Json) {
        fmt_builder.json().with_ansi(false).try_init()
    } else {
        fmt_builder.with_ansi(true).try_init()
    };
    if installed.is_err() {
        warn!("tracing subscriber already installed");
    }

    config.logging.level.clone()
}

fn build_env_filter(config: &Config) -> EnvFilter {
    let default_level = config
        .logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    })
}

/// Creates the application state around an HTTP client for the configured API.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built for the API base URL.
pub fn create_app_state(config: Config) -> Result<Arc<AppState>, ApiClientError> {
    let api = HttpObituaryApi::new(config.api.base_url.clone())?;
    Ok(Arc::new(AppState::new(config, Arc::new(api))))
}

/// Creates the static file service for serving frontend assets.
///
/// Unknown paths fall back to the SPA index so client-side routes resolve.
pub fn create_static_service<S>(static_dir: PathBuf, spa_index: PathBuf) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().fallback_service(
        ServeDir::new(static_dir)
            .append_index_html_on_directories(true)
            .fallback(get_service(ServeFile::new(spa_index))),
    )
}

/// Creates the main application router with all middleware and routes.
///
/// Layer order, outermost first: request id, tracing, route guard.
pub fn create_app_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let config = state.config.clone();
    let request_id_state = RequestIdState::from_config(&config);
    let guard_state = GuardState::from_state(&state);
    let static_files_service =
        create_static_service(config.web.static_dir.clone(), config.web.spa_index.clone());

    Router::new()
        .merge(routes::auth::create_router_auth(&state))
        .merge(routes::dashboard::create_router_dashboard())
        .merge(routes::health::create_health_router())
        .merge(routes::openapi::openapi_routes())
        .route("/metrics", get(metrics_endpoint))
        .merge(static_files_service)
        .layer(Extension(metrics_handle))
        .layer(middleware::from_fn_with_state(
            guard_state,
            route_guard::enforce_route_guard,
        ))
        .layer(tracer::create_trace_layer())
        .layer(middleware::from_fn_with_state(
            request_id_state,
            request_context::assign_request_id,
        ))
        .with_state(state)
}

/// Resolves when a shutdown signal is received.
pub async fn create_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for CTRL+C; shutting down");
    }
    info!("Shutting down...");
}

/// Starts the gateway and binds it to the configured port.
///
/// # Errors
/// Returns an error if the API client cannot be built, the port cannot be bound,
/// or the server fails while running.
pub async fn run(config: Config) -> anyhow::Result<()> {
    initialize_tracing(&config);
    info!(
        profile = %config.profile,
        api = %config.api.base_url,
        "Starting gateway..."
    );

    let metrics_handle = metrics_handle();
    let state = create_app_state(config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let app = create_app_router(state, metrics_handle);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await?;

    Ok(())
}
