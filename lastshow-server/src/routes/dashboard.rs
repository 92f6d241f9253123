use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tracing::info;

use crate::{
    app_state::AppState,
    handlers::{
        dashboard::dashboard_summary,
        obituaries::{create_obituary, delete_obituary},
    },
};

// Portrait uploads pass through the gateway untouched.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Dashboard data and the create/delete actions behind it
pub fn create_router_dashboard() -> Router<Arc<AppState>> {
    info!("Creating dashboard router");
    Router::new()
        .route("/dashboard/summary", get(dashboard_summary))
        .route(
            "/dashboard/obituaries",
            post(create_obituary).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/dashboard/obituaries/{id}", delete(delete_obituary))
}
