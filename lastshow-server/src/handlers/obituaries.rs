use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use shared::models::{ImageUpload, MutationState, ObituaryForm};

use crate::{
    app_state::AppState,
    http::error::AppResult,
    services::obituary_flow::ObituaryWorkflow,
};

/// Multipart fields accepted by the create action.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ObituaryUpload {
    name: String,
    /// `YYYY-MM-DD`
    birth_date: String,
    /// `YYYY-MM-DD`
    death_date: String,
    /// Public only when exactly `true`.
    is_public: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

fn mutation_response(state: MutationState) -> Response {
    let status = if state.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(state)).into_response()
}

async fn read_obituary_form(mut multipart: Multipart) -> AppResult<ObituaryForm> {
    let mut form = ObituaryForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "name" => form.name = Some(field.text().await?),
            "birth_date" => form.birth_date = Some(field.text().await?),
            "death_date" => form.death_date = Some(field.text().await?),
            "is_public" => form.is_public = Some(field.text().await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field.bytes().await?;
                form.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

// Create action; the form is validated before anything is sent upstream
#[utoipa::path(
    post,
    path = "/dashboard/obituaries",
    request_body(content = ObituaryUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Obituary created", body = MutationState),
        (status = 303, description = "No session; redirected to the login page"),
        (status = 400, description = "Malformed multipart body", body = crate::http::problem::ProblemDetails),
        (status = 422, description = "Validation or upstream failure", body = MutationState)
    ),
    tag = "Obituaries"
)]
#[instrument(skip(state, headers, multipart))]
pub async fn create_obituary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let Some(token) = state.codec.read(&headers).into_token() else {
        return Ok(Redirect::to(&state.config.routes.login).into_response());
    };

    let form = read_obituary_form(multipart).await?;
    let outcome = ObituaryWorkflow::new(&state).create(&token, form).await;
    Ok(mutation_response(outcome))
}

#[utoipa::path(
    delete,
    path = "/dashboard/obituaries/{id}",
    params(("id" = String, Path, description = "Obituary identifier")),
    responses(
        (status = 200, description = "Obituary deleted", body = MutationState),
        (status = 303, description = "No session; redirected to the login page"),
        (status = 422, description = "Upstream failure", body = MutationState)
    ),
    tag = "Obituaries"
)]
#[instrument(skip(state, headers))]
pub async fn delete_obituary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let Some(token) = state.codec.read(&headers).into_token() else {
        return Redirect::to(&state.config.routes.login).into_response();
    };

    mutation_response(ObituaryWorkflow::new(&state).delete(&token, &id).await)
}
