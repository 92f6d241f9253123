use axum::{extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use super::problem::ProblemDetails;
use crate::services::{api_client::ApiClientError, error_normalizer::normalize_error};

pub type AppResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut problem = ProblemDetails::new(self.status, self.code, self.message);
        if let Some(details) = self.details {
            problem = problem.with_extensions(details);
        }
        problem.into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request("malformed multipart body").with_details(json!({ "reason": err.body_text() }))
    }
}

/// Upstream failures on read paths: a rejected token stays a 401, anything else is a bad gateway.
impl From<ApiClientError> for ApiError {
    fn from(err: ApiClientError) -> Self {
        let message = normalize_error(&err);
        match &err {
            ApiClientError::Rejected { status, .. } if err.is_unauthorized() => {
                Self::unauthorized(message).with_details(json!({ "upstream_status": status.as_u16() }))
            }
            ApiClientError::Rejected { status, .. } => {
                Self::bad_gateway(message).with_details(json!({ "upstream_status": status.as_u16() }))
            }
            ApiClientError::Transport(cause) | ApiClientError::Unexpected(cause) => {
                warn!(error = %cause, "remote API call failed");
                Self::bad_gateway(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
    use serde_json::Value;
    use shared::models::{ErrorBody, GENERIC_ERROR_MESSAGE};

    async fn body_json(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("body to bytes");
        (status, serde_json::from_slice(&bytes).expect("problem json"))
    }

    #[tokio::test]
    async fn into_response_serializes_problem_details() {
        let (status, json) =
            body_json(ApiError::bad_request("nope").with_details(json!({ "field": "image" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["type"], "https://lastshow.app/problems/bad_request");
        assert_eq!(json["title"], "Bad Request");
        assert_eq!(json["status"], 400);
        assert_eq!(json["detail"], "nope");
        assert_eq!(json["extensions"]["field"], "image");
    }

    #[tokio::test]
    async fn rejected_token_maps_to_unauthorized() {
        let err = ApiClientError::Rejected {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorBody::parse(br#"{"detail":"Could not validate credentials"}"#),
        };
        let (status, json) = body_json(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["detail"], "Could not validate credentials");
        assert_eq!(json["extensions"]["upstream_status"], 401);
    }

    #[tokio::test]
    async fn other_upstream_failures_map_to_bad_gateway() {
        let rejected = ApiError::from(ApiClientError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
        });
        assert_eq!(rejected.status(), StatusCode::BAD_GATEWAY);

        let (status, json) =
            body_json(ApiError::from(ApiClientError::Transport("refused".into()))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["detail"], GENERIC_ERROR_MESSAGE);
        assert!(json.get("extensions").is_none());
    }
}
