use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::obituary::FieldErrors;

/// Message returned alongside field errors when the create form is invalid.
pub const INVALID_FORM_MESSAGE: &str = "Invalid form data. Please check the fields and try again.";

/// Result of a login or registration attempt that did not redirect.
///
/// An empty state means the form has not been submitted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormState {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a create or delete action on the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MutationState {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        default,
        rename = "fieldErrors",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_errors: Option<FieldErrors>,
}

impl MutationState {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            field_errors: None,
        }
    }

    #[must_use]
    pub fn invalid(field_errors: FieldErrors) -> Self {
        Self {
            success: false,
            error: Some(INVALID_FORM_MESSAGE.to_string()),
            field_errors: Some(field_errors),
        }
    }
}
