//! Per-request gate on session presence.
//!
//! Only the presence of the session cookie is checked; the remote API
//! decides whether the token is actually valid.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{Span, debug};

use shared::config::server::RoutesConfig;

use crate::{app_state::AppState, auth::session::SessionCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Assets and probes the guard never looks at.
    Bypass,
    Landing,
    /// Login or registration page.
    Public,
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    PassThrough,
    RedirectToLogin,
    RedirectToDashboard,
}

impl GuardDecision {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::RedirectToLogin => "redirect_to_login",
            Self::RedirectToDashboard => "redirect_to_dashboard",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    landing: String,
    login: String,
    register: String,
    dashboard: String,
    bypass_prefixes: Vec<String>,
}

impl RoutePolicy {
    #[must_use]
    pub fn from_config(routes: &RoutesConfig) -> Self {
        Self {
            landing: routes.landing.clone(),
            login: routes.login.clone(),
            register: routes.register.clone(),
            dashboard: routes.dashboard.clone(),
            bypass_prefixes: routes.bypass_prefixes.clone(),
        }
    }

    /// Public paths match exactly; everything else not bypassed is protected.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == self.landing {
            RouteClass::Landing
        } else if path == self.login || path == self.register {
            RouteClass::Public
        } else if self
            .bypass_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RouteClass::Bypass
        } else {
            RouteClass::Protected
        }
    }

    #[must_use]
    pub fn decide(&self, class: RouteClass, has_session: bool) -> GuardDecision {
        match (class, has_session) {
            (RouteClass::Protected, false) => GuardDecision::RedirectToLogin,
            (RouteClass::Public, true) => GuardDecision::RedirectToDashboard,
            _ => GuardDecision::PassThrough,
        }
    }

    #[must_use]
    pub fn target(&self, decision: GuardDecision) -> Option<&str> {
        match decision {
            GuardDecision::PassThrough => None,
            GuardDecision::RedirectToLogin => Some(&self.login),
            GuardDecision::RedirectToDashboard => Some(&self.dashboard),
        }
    }
}

#[derive(Clone)]
pub struct GuardState {
    policy: Arc<RoutePolicy>,
    codec: SessionCodec,
}

impl GuardState {
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self {
            policy: Arc::new(RoutePolicy::from_config(&state.config.routes)),
            codec: state.codec.clone(),
        }
    }
}

/// Redirects by session presence; the decision is recorded on the request span.
pub async fn enforce_route_guard(
    State(guard): State<GuardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let class = guard.policy.classify(&path);
    if class == RouteClass::Bypass {
        return next.run(request).await;
    }

    let has_session = guard.codec.read(request.headers()).is_present();
    let decision = guard.policy.decide(class, has_session);
    debug!(path = %path, ?class, has_session, ?decision, "route guard decision");

    let span = Span::current();
    span.record("session_present", has_session);
    span.record("guard", decision.as_str());

    match guard.policy.target(decision) {
        Some(target) => {
            metrics::counter!("route_guard_redirects_total", "decision" => decision.as_str())
                .increment(1);
            Redirect::temporary(target).into_response()
        }
        None => next.run(request).await,
    }
}
