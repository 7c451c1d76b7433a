//! `OpenAPI` document for the auth surface.

use crate::api::handlers::{auth, health};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::endpoints::register,
        auth::endpoints::login,
        auth::endpoints::me,
        auth::endpoints::forgot_password,
        auth::endpoints::change_password,
        auth::endpoints::logout,
    ),
    components(schemas(
        auth::types::Account,
        auth::types::FieldError,
        auth::types::UserResponse,
        auth::types::RegisterRequest,
        auth::types::LoginRequest,
        auth::types::ForgotPasswordRequest,
        auth::types::ChangePasswordRequest,
    )),
    tags(
        (name = "auth", description = "Credential and session lifecycle"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// Build the `OpenAPI` spec for all documented routes.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
