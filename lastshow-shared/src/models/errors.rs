use serde::{Deserialize, Serialize};

/// Message shown when a failure carries nothing more specific.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// One entry of a multi-field validation failure returned by the remote API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ValidationIssue {
    /// Location of the offending field, e.g. `["body", "email"]`.
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    /// Human readable message; entries without one are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Machine readable error kind.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// The `detail` member of a remote error body.
///
/// Either a list of validation issues, a single message, or something the
/// gateway does not recognise.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Issues(Vec<ValidationIssue>),
    Message(String),
    Other(serde_json::Value),
}

impl ErrorDetail {
    /// Display text for this detail, or `None` when it carries no usable text.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let text = match self {
            Self::Issues(issues) => issues
                .iter()
                .filter_map(|issue| issue.msg.as_deref().map(str::trim))
                .filter(|msg| !msg.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Self::Message(message) => message.clone(),
            Self::Other(_) => return None,
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Error body returned by the remote API: `{"detail": ...}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

impl ErrorBody {
    /// Parse a raw response body, returning `None` for anything that is not a JSON object.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Option<Self> {
        serde_json::from_slice(raw).ok()
    }

    /// Display text of the `detail` member, if any.
    #[must_use]
    pub fn detail_message(&self) -> Option<String> {
        self.detail.as_ref().and_then(ErrorDetail::message)
    }
}
