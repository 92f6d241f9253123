pub mod auth;
pub mod errors;
pub mod form;
pub mod obituary;

pub use auth::{Credentials, Registration, TokenResponse, User};
pub use errors::{ErrorBody, ErrorDetail, GENERIC_ERROR_MESSAGE, ValidationIssue};
pub use form::{FormState, INVALID_FORM_MESSAGE, MutationState};
pub use obituary::{FieldErrors, ImageUpload, Obituary, ObituaryDraft, ObituaryForm, ObituaryList};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Everything the dashboard page needs for one signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DashboardView {
    pub user: User,
    pub obituaries: Vec<Obituary>,
    pub total: usize,
}
