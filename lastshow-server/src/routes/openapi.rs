use std::sync::Arc;

use crate::{app_state::AppState, openapi::ApiDoc};
use axum::{Json, Router, response::IntoResponse, routing::get};
use utoipa::OpenApi;

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

pub fn openapi_routes() -> Router<Arc<AppState>> {
    Router::new().route("/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::test_implementations::ScriptedApi;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use shared::config::server::{Config, Profile};
    use tower::ServiceExt;

    #[tokio::test]
    async fn openapi_document_lists_gateway_paths() {
        let state = Arc::new(AppState::new(
            Config::default_for_profile(Profile::Test),
            Arc::new(ScriptedApi::default()),
        ));
        let response = openapi_routes()
            .with_state(state)
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        for path in [
            "/login",
            "/register",
            "/logout",
            "/dashboard/summary",
            "/dashboard/obituaries",
            "/dashboard/obituaries/{id}",
        ] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
    }
}
