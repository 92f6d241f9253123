use tracing::{info, instrument, warn};

use shared::models::{MutationState, ObituaryForm};

use crate::{
    app_state::AppState,
    auth::session::SessionToken,
    services::{
        api_client::{ApiClientError, ObituaryApi},
        error_normalizer::normalize_error,
        view_cache::Revalidate,
    },
};

/// Create and delete obituaries on behalf of the signed-in user.
pub struct ObituaryWorkflow<'a> {
    api: &'a dyn ObituaryApi,
    views: &'a dyn Revalidate,
    dashboard_path: &'a str,
}

impl<'a> ObituaryWorkflow<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            api: state.api.as_ref(),
            views: state.views.as_ref(),
            dashboard_path: &state.config.routes.dashboard,
        }
    }

    /// Validates the form locally and, only if it passes, submits it.
    #[instrument(skip(self, token, form))]
    pub async fn create(&self, token: &SessionToken, form: ObituaryForm) -> MutationState {
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(field_errors) => {
                info!(fields = ?field_errors.keys().collect::<Vec<_>>(), "obituary form rejected");
                record("create", "invalid");
                return MutationState::invalid(field_errors);
            }
        };

        match self.api.create_obituary(token, &draft).await {
            Ok(obituary) => {
                info!(obituary_id = %obituary.id, "obituary created");
                self.views.revalidate(self.dashboard_path);
                record("create", "success");
                MutationState::succeeded()
            }
            Err(err) => {
                record("create", "failure");
                MutationState::failed(failure_message(&err))
            }
        }
    }

    #[instrument(skip(self, token))]
    pub async fn delete(&self, token: &SessionToken, id: &str) -> MutationState {
        match self.api.delete_obituary(token, id).await {
            Ok(()) => {
                info!("obituary deleted");
                self.views.revalidate(self.dashboard_path);
                record("delete", "success");
                MutationState::succeeded()
            }
            Err(err) => {
                record("delete", "failure");
                MutationState::failed(failure_message(&err))
            }
        }
    }
}

fn failure_message(err: &ApiClientError) -> String {
    match err {
        ApiClientError::Rejected { status, .. } => {
            info!(status = %status, "remote API rejected the mutation");
        }
        ApiClientError::Transport(cause) | ApiClientError::Unexpected(cause) => {
            warn!(error = %cause, "mutation request failed");
        }
    }
    normalize_error(err)
}

fn record(action: &'static str, outcome: &'static str) {
    metrics::counter!("obituary_mutations_total", "action" => action, "outcome" => outcome)
        .increment(1);
}
