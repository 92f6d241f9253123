use std::sync::Arc;

use axum::{Router, routing::post};
use tower_http::services::ServeFile;
use tracing::info;

use crate::{
    app_state::AppState,
    handlers::auth::{login, logout, register},
};

/// Form actions for signing in, signing up and signing out.
///
/// `GET` on the login and registration paths still serves the page itself.
pub fn create_router_auth(state: &AppState) -> Router<Arc<AppState>> {
    info!("Creating auth router");
    let routes = &state.config.routes;
    let page = ServeFile::new(&state.config.web.spa_index);
    Router::new()
        .route(&routes.login, post(login).get_service(page.clone()))
        .route(&routes.register, post(register).get_service(page))
        .route(&routes.logout, post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::test_implementations::ScriptedApi;
    use shared::config::server::{Config, Profile};

    #[test]
    fn test_create_router_auth() {
        let state = AppState::new(
            Config::default_for_profile(Profile::Test),
            Arc::new(ScriptedApi::default()),
        );
        let router = create_router_auth(&state);
        assert!(router.has_routes(), "Router should not be empty");
    }

    #[tokio::test]
    async fn logout_is_mounted_at_the_configured_path() {
        use axum::{
            body::Body,
            http::{Request, StatusCode, header},
        };
        use tower::ServiceExt;

        let mut config = Config::default_for_profile(Profile::Test);
        config.routes.logout = "/sign-out".to_string();
        let state = Arc::new(AppState::new(config, Arc::new(ScriptedApi::default())));
        let router = create_router_auth(&state).with_state(state);

        let post = |uri: &str| Request::post(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(post("/sign-out")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(response.headers().contains_key(header::SET_COOKIE));

        let response = router.oneshot(post("/logout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
