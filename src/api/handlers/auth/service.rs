//! The six credential/session lifecycle operations.
//!
//! Every operation returns either a payload or an ordered list of
//! field-scoped errors; only unexpected storage failures surface as `Err`.
//! The transport sets or clears the session cookie based on the returned
//! outcome; no ambient request state is touched here.

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::error;

use super::accounts::{self, InsertOutcome};
use super::hasher;
use super::kv;
use super::session;
use super::state::AuthState;
use super::types::{Account, FieldError};
use super::utils::{build_reset_url, generate_token, hash_session_token, reset_token_key};
use super::validate::validate_register;
use crate::api::email::{self, EmailMessage};

/// One neutral message for unknown identifiers and wrong passwords, so login
/// responses never reveal whether an account exists.
const LOGIN_FAILED_MESSAGE: &str = "username or password does not exist";

/// Outcome of an operation that authenticates the caller on success.
#[derive(Debug)]
pub enum AuthAttempt {
    /// The account plus a fresh raw session token for the transport to set
    /// as the session cookie.
    Granted {
        account: Account,
        session_token: String,
    },
    /// Ordered, field-scoped errors for the caller to correct.
    Rejected(Vec<FieldError>),
}

impl AuthAttempt {
    fn rejected(field: &str, message: &str) -> Self {
        Self::Rejected(vec![FieldError::new(field, message)])
    }
}

/// Create an account and log it in.
///
/// Validation runs before any storage access. A uniqueness conflict on either
/// constraint is reported against the username field, matching the historical
/// contract of this endpoint.
pub async fn register(
    pool: &PgPool,
    state: &AuthState,
    username: &str,
    email: &str,
    password: &SecretString,
) -> Result<AuthAttempt> {
    let errors = validate_register(username, email, password.expose_secret());
    if !errors.is_empty() {
        return Ok(AuthAttempt::Rejected(errors));
    }

    let password_hash = hasher::hash_password(password.expose_secret())?;
    let record = match accounts::insert(pool, username, email, &password_hash).await? {
        InsertOutcome::Created(record) => record,
        InsertOutcome::Conflict => {
            return Ok(AuthAttempt::rejected("username", "username taken"));
        }
    };

    let session_token =
        session::create_session(pool, record.id, state.config().session_ttl_seconds()).await?;

    Ok(AuthAttempt::Granted {
        account: record.into_account(),
        session_token,
    })
}

/// Verify credentials and establish a session.
pub async fn login(
    pool: &PgPool,
    state: &AuthState,
    username_or_email: &str,
    password: &SecretString,
) -> Result<AuthAttempt> {
    let Some(record) = accounts::find_by_username_or_email(pool, username_or_email).await? else {
        return Ok(AuthAttempt::rejected("usernameOrEmail", LOGIN_FAILED_MESSAGE));
    };

    if !hasher::verify_password(&record.password_hash, password.expose_secret()) {
        return Ok(AuthAttempt::rejected("password", LOGIN_FAILED_MESSAGE));
    }

    let session_token =
        session::create_session(pool, record.id, state.config().session_ttl_seconds()).await?;

    Ok(AuthAttempt::Granted {
        account: record.into_account(),
        session_token,
    })
}

/// Resolve the caller's session to an account, if any.
///
/// Missing, expired, and dangling sessions (the account was deleted) all
/// resolve to `None`; none of them are errors.
pub async fn me(pool: &PgPool, session_token: Option<&str>) -> Result<Option<Account>> {
    let Some(token) = session_token else {
        return Ok(None);
    };

    let Some(account_id) = session::resolve_session(pool, &hash_session_token(token)).await? else {
        return Ok(None);
    };

    Ok(accounts::find_by_id(pool, account_id)
        .await?
        .map(accounts::AccountRecord::into_account))
}

/// Start a password reset.
///
/// Always reports success so responses never reveal whether the email is
/// registered. For known accounts, a single-use reset token is stored and the
/// reset link is handed to the notification dispatcher fire-and-forget;
/// delivery failure never surfaces here.
pub async fn forgot_password(pool: &PgPool, state: &AuthState, email_address: &str) -> Result<bool> {
    let Some(record) = accounts::find_by_email(pool, email_address).await? else {
        return Ok(true);
    };

    let token = generate_token()?;
    kv::kv_set(
        pool,
        &reset_token_key(&token),
        &record.id.to_string(),
        state.config().reset_token_ttl_seconds(),
    )
    .await?;

    let reset_url = build_reset_url(state.config().base_url(), &token);
    email::dispatch(
        state.email(),
        EmailMessage {
            to_email: record.email,
            subject: "reset password".to_string(),
            body_html: format!("<a href=\"{reset_url}\">reset password</a>"),
        },
    );

    Ok(true)
}

/// Redeem a reset token and set a new password.
///
/// The token is consumed atomically before anything else happens to it, so a
/// token can be redeemed at most once even under concurrent attempts, and a
/// token pointing at a deleted account is burned rather than left retryable.
pub async fn change_password(
    pool: &PgPool,
    state: &AuthState,
    token: &str,
    new_password: &SecretString,
) -> Result<AuthAttempt> {
    if new_password.expose_secret().chars().count() <= 6 {
        return Ok(AuthAttempt::rejected("newPassword", "password too short"));
    }

    let Some(value) = kv::kv_take(pool, &reset_token_key(token)).await? else {
        return Ok(AuthAttempt::rejected("token", "token expired"));
    };

    let Ok(account_id) = value.parse::<i64>() else {
        error!("reset token resolved to a non-numeric account id");
        return Ok(AuthAttempt::rejected("token", "token expired"));
    };

    let password_hash = hasher::hash_password(new_password.expose_secret())?;
    let Some(record) = accounts::update_password_hash(pool, account_id, &password_hash).await?
    else {
        return Ok(AuthAttempt::rejected("token", "user no longer exists"));
    };

    let session_token =
        session::create_session(pool, record.id, state.config().session_ttl_seconds()).await?;

    Ok(AuthAttempt::Granted {
        account: record.into_account(),
        session_token,
    })
}

/// Tear down the caller's session.
///
/// Returns whether a live session row was removed; the transport clears the
/// session cookie regardless of this result.
pub async fn logout(pool: &PgPool, session_token: Option<&str>) -> Result<bool> {
    let Some(token) = session_token else {
        return Ok(false);
    };

    session::destroy_session(pool, &hash_session_token(token)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_builds_single_field_error() {
        let attempt = AuthAttempt::rejected("token", "token expired");
        match attempt {
            AuthAttempt::Rejected(errors) => {
                assert_eq!(errors, vec![FieldError::new("token", "token expired")]);
            }
            AuthAttempt::Granted { .. } => panic!("expected rejection"),
        }
    }

    #[test]
    fn login_failure_message_is_neutral() {
        assert!(!LOGIN_FAILED_MESSAGE.contains("taken"));
        assert!(!LOGIN_FAILED_MESSAGE.contains("not found"));
    }
}
