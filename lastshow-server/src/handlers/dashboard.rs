use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::{debug, instrument};

use shared::models::DashboardView;

use crate::{
    app_state::AppState,
    http::error::{ApiError, AppResult},
};

// Dashboard data for the signed-in user, cached per session until a mutation lands
#[utoipa::path(
    get,
    path = "/dashboard/summary",
    responses(
        (status = 200, description = "Current user and their obituaries", body = DashboardView),
        (status = 401, description = "Missing or rejected session", body = crate::http::problem::ProblemDetails),
        (status = 502, description = "Remote API failure", body = crate::http::problem::ProblemDetails)
    ),
    tag = "Dashboard"
)]
#[instrument(skip(state, headers))]
pub async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<DashboardView>> {
    let token = state
        .codec
        .read(&headers)
        .into_token()
        .ok_or_else(|| ApiError::unauthorized("sign in to view the dashboard"))?;
    let view_path = state.config.routes.dashboard.as_str();

    if let Some(view) = state.views.get(view_path, &token) {
        debug!("dashboard served from cache");
        return Ok(Json(view));
    }

    let (user, listing) = tokio::try_join!(
        state.api.current_user(&token),
        state.api.list_my_obituaries(&token)
    )?;
    let view = DashboardView {
        user,
        total: listing.total,
        obituaries: listing.obituaries,
    };

    state.views.put(view_path, &token, view.clone());
    Ok(Json(view))
}
