#![allow(clippy::needless_for_each)] // Derive macro emits a for_each internally

use shared::models::{
    Credentials, DashboardView, FormState, MutationState, Obituary, Registration, User,
};
use utoipa::OpenApi;

use crate::{handlers::obituaries::ObituaryUpload, http::problem::ProblemDetails};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "The Last Show gateway",
        version = "1.0.0",
        description = "Session, form actions and dashboard data for The Last Show web client"
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::register,
        crate::handlers::auth::logout,
        crate::handlers::dashboard::dashboard_summary,
        crate::handlers::obituaries::create_obituary,
        crate::handlers::obituaries::delete_obituary,
    ),
    components(
        schemas(
            Credentials,
            Registration,
            FormState,
            MutationState,
            DashboardView,
            User,
            Obituary,
            ObituaryUpload,
            ProblemDetails,
        )
    ),
    tags(
        (name = "Auth", description = "Sign in, sign up and sign out"),
        (name = "Dashboard", description = "Data for the signed-in dashboard"),
        (name = "Obituaries", description = "Create and delete obituaries")
    )
)]
pub struct ApiDoc;
