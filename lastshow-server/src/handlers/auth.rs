use std::sync::Arc;

use axum::{Form, extract::State};
use tracing::instrument;

use shared::models::{Credentials, FormState, Registration};

use crate::{
    app_state::AppState,
    services::auth_flow::{AuthOutcome, AuthWorkflow},
};

// Login form action
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in; session cookie set and redirected to the dashboard"),
        (status = 422, description = "Login failed", body = FormState)
    ),
    tag = "Auth"
)]
#[instrument(skip(state, credentials))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(credentials): Form<Credentials>,
) -> AuthOutcome {
    AuthWorkflow::new(&state).login(&credentials).await
}

// Registration form action; signs the new account in on success
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = Registration, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Account created and signed in; redirected to the dashboard"),
        (status = 422, description = "Registration or the follow-up login failed", body = FormState)
    ),
    tag = "Auth"
)]
#[instrument(skip(state, registration))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(registration): Form<Registration>,
) -> AuthOutcome {
    AuthWorkflow::new(&state).register(&registration).await
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 303, description = "Session cookie cleared; redirected to the login page")
    ),
    tag = "Auth"
)]
#[instrument(skip(state))]
pub async fn logout(State(state): State<Arc<AppState>>) -> AuthOutcome {
    AuthWorkflow::new(&state).logout()
}
