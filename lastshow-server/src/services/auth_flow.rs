use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;
use tracing::{error, info, instrument, warn};

use shared::models::{Credentials, ErrorBody, FormState, GENERIC_ERROR_MESSAGE, Registration};

use crate::{
    app_state::AppState,
    auth::session::{SessionCodec, SessionToken},
    http::error::ApiError,
    services::api_client::{ApiClientError, ObituaryApi},
};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Change to the session cookie that accompanies a redirect.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    Issue(Cookie<'static>),
    Clear(Cookie<'static>),
}

impl SessionChange {
    #[must_use]
    pub fn cookie(&self) -> &Cookie<'static> {
        match self {
            Self::Issue(cookie) | Self::Clear(cookie) => cookie,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedirectTo {
    pub location: String,
    pub session: SessionChange,
}

/// Result of a login, registration or logout.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Redirect(RedirectTo),
    Failure(FormState),
}

impl AuthOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self::Failure(FormState::failed(message))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Redirect(_) => "redirect",
            Self::Failure(_) => "failure",
        }
    }
}

impl IntoResponse for AuthOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(redirect) => {
                let cookie = redirect.session.cookie().to_string();
                let Ok(value) = HeaderValue::from_str(&cookie) else {
                    error!("session cookie is not a valid header value");
                    return ApiError::internal_server_error("could not update the session")
                        .into_response();
                };
                let mut response = Redirect::to(&redirect.location).into_response();
                response.headers_mut().append(header::SET_COOKIE, value);
                response
            }
            Self::Failure(state) => (StatusCode::UNPROCESSABLE_ENTITY, Json(state)).into_response(),
        }
    }
}

/// Login, registration and logout against the remote API.
pub struct AuthWorkflow<'a> {
    api: &'a dyn ObituaryApi,
    codec: &'a SessionCodec,
    login_path: &'a str,
    dashboard_path: &'a str,
}

impl<'a> AuthWorkflow<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            api: state.api.as_ref(),
            codec: &state.codec,
            login_path: &state.config.routes.login,
            dashboard_path: &state.config.routes.dashboard,
        }
    }

    /// Exchanges credentials for a session and sends the user to the dashboard.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> AuthOutcome {
        metrics::counter!("auth_attempts_total", "action" => "login").increment(1);
        let outcome = self.exchange(credentials).await;
        record_outcome("login", &outcome);
        outcome
    }

    async fn exchange(&self, credentials: &Credentials) -> AuthOutcome {
        match self.api.login(credentials).await {
            Ok(response) => match SessionToken::new(response.access_token) {
                Some(token) => {
                    info!("login accepted");
                    AuthOutcome::Redirect(RedirectTo {
                        location: self.dashboard_path.to_string(),
                        session: SessionChange::Issue(self.codec.issue(&token)),
                    })
                }
                None => {
                    warn!("login response carried an empty or non-cookie-safe access token");
                    AuthOutcome::failure(GENERIC_ERROR_MESSAGE)
                }
            },
            Err(err) => AuthOutcome::failure(failure_message(&err, LOGIN_FAILED)),
        }
    }

    /// Creates the account, then logs in with the same credentials.
    ///
    /// The login outcome is returned unchanged, redirect included.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> AuthOutcome {
        metrics::counter!("auth_attempts_total", "action" => "register").increment(1);

        let outcome = match self.api.register(registration).await {
            Ok(user) => {
                match user {
                    Some(user) => info!(user_id = %user.id, "account created"),
                    None => info!("account created"),
                }
                self.login(&registration.credentials()).await
            }
            Err(err) => AuthOutcome::failure(failure_message(&err, REGISTRATION_FAILED)),
        };

        record_outcome("register", &outcome);
        outcome
    }

    /// Clears the session and sends the user to the login page.
    #[must_use]
    pub fn logout(&self) -> AuthOutcome {
        metrics::counter!("auth_outcomes_total", "action" => "logout", "outcome" => "redirect")
            .increment(1);
        AuthOutcome::Redirect(RedirectTo {
            location: self.login_path.to_string(),
            session: SessionChange::Clear(self.codec.clear()),
        })
    }
}

fn failure_message(err: &ApiClientError, fallback: &str) -> String {
    match err {
        ApiClientError::Rejected { status, body } => {
            info!(status = %status, "remote API rejected the request");
            body.as_ref()
                .and_then(ErrorBody::detail_message)
                .unwrap_or_else(|| fallback.to_string())
        }
        ApiClientError::Transport(cause) | ApiClientError::Unexpected(cause) => {
            warn!(error = %cause, "auth request failed");
            GENERIC_ERROR_MESSAGE.to_string()
        }
    }
}

fn record_outcome(action: &'static str, outcome: &AuthOutcome) {
    metrics::counter!("auth_outcomes_total", "action" => action, "outcome" => outcome.label())
        .increment(1);
}
