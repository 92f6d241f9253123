//! Turns any failure from the remote API into one user-facing message.

use shared::models::{ErrorDetail, GENERIC_ERROR_MESSAGE};

use super::api_client::ApiClientError;

/// Picks the first usable message: the structured `detail`, then the error's
/// own message, then [`GENERIC_ERROR_MESSAGE`]. Never returns an empty string.
#[must_use]
pub fn normalize(detail: Option<&ErrorDetail>, message: Option<&str>) -> String {
    detail
        .and_then(ErrorDetail::message)
        .or_else(|| {
            message
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}

/// Message shown to the user for a failed API call.
///
/// Transport failures never expose their cause.
#[must_use]
pub fn normalize_error(error: &ApiClientError) -> String {
    match error {
        ApiClientError::Rejected { status, body } => {
            let fallback = format!("Request failed with status code {}", status.as_u16());
            normalize(
                body.as_ref().and_then(|body| body.detail.as_ref()),
                Some(&fallback),
            )
        }
        ApiClientError::Transport(_) => normalize(None, None),
        ApiClientError::Unexpected(message) => normalize(None, Some(message)),
    }
}
