//! HTTP surface for the auth operations.
//!
//! Handlers translate between the wire and the service layer: they extract
//! the session cookie, map outcomes to status codes, and set or clear the
//! session cookie. All auth semantics live in [`super::service`].

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::service::{self, AuthAttempt};
use super::session::{clear_session_cookie, extract_session_token, session_cookie};
use super::state::AuthState;
use super::types::{
    Account, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    UserResponse,
};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, session cookie set", body = UserResponse),
        (status = 422, description = "Validation failed or username/email taken", body = UserResponse),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service::register(
        &pool,
        &auth_state,
        &request.username,
        &request.email,
        &request.password,
    )
    .await
    {
        Ok(attempt) => respond(StatusCode::CREATED, &auth_state, attempt),
        Err(err) => {
            error!("register failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted, session cookie set", body = UserResponse),
        (status = 422, description = "Unknown identifier or wrong password", body = UserResponse),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service::login(
        &pool,
        &auth_state,
        &request.username_or_email,
        &request.password,
    )
    .await
    {
        Ok(attempt) => respond(StatusCode::OK, &auth_state, attempt),
        Err(err) => {
            error!("login failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = Account),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let token = extract_session_token(&headers);
    match service::me(&pool, token.as_deref()).await {
        Ok(Some(account)) => (StatusCode::OK, Json(account)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("me lookup failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Always true, whether or not the email is registered", body = bool),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service::forgot_password(&pool, &auth_state, &request.email).await {
        Ok(sent) => (StatusCode::OK, Json(sent)).into_response(),
        Err(err) => {
            error!("forgot-password failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed, session cookie set", body = UserResponse),
        (status = 422, description = "Short password or invalid token", body = UserResponse),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "auth"
)]
pub async fn change_password(
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service::change_password(&pool, &auth_state, &request.token, &request.new_password).await
    {
        Ok(attempt) => respond(StatusCode::OK, &auth_state, attempt),
        Err(err) => {
            error!("change-password failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Whether a live session was destroyed; the cookie is cleared either way", body = bool)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let token = extract_session_token(&headers);
    let destroyed = match service::logout(&pool, token.as_deref()).await {
        Ok(destroyed) => destroyed,
        Err(err) => {
            error!("logout failed: {err}");
            false
        }
    };

    // Always clear the cookie, even when no session row was removed.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::OK, response_headers, Json(destroyed)).into_response()
}

fn respond(success_status: StatusCode, auth_state: &AuthState, attempt: AuthAttempt) -> Response {
    match attempt {
        AuthAttempt::Granted {
            account,
            session_token,
        } => {
            let mut headers = HeaderMap::new();
            if let Ok(cookie) = session_cookie(auth_state.config(), &session_token) {
                headers.insert(SET_COOKIE, cookie);
            }
            (success_status, headers, Json(UserResponse::user(account))).into_response()
        }
        AuthAttempt::Rejected(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(UserResponse::errors(errors)),
        )
            .into_response(),
    }
}
