//! Server-side sessions and the session cookie.
//!
//! Only the SHA-256 hash of a session token is stored; the raw token lives in
//! the `pordisto_session` cookie and nowhere else.

use anyhow::{anyhow, Context, Result};
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::state::AuthConfig;
use super::utils::{generate_token, hash_session_token, is_unique_violation};

/// Cookie carrying the session token; shared with the frontend.
pub(crate) const SESSION_COOKIE_NAME: &str = "pordisto_session";

/// Create a session row and return the raw token for the cookie.
pub(crate) async fn create_session(
    pool: &PgPool,
    account_id: i64,
    ttl_seconds: i64,
) -> Result<String> {
    let query = r"
        INSERT INTO sessions (account_id, session_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    // Retry on the astronomically unlikely token hash collision.
    for _ in 0..3 {
        let token = generate_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a session hash to its account id, if the session is still live.
/// Records activity without extending the session TTL.
pub(crate) async fn resolve_session(pool: &PgPool, token_hash: &[u8]) -> Result<Option<i64>> {
    let query = r"
        UPDATE sessions
        SET last_seen_at = NOW()
        WHERE session_hash = $1
          AND expires_at > NOW()
        RETURNING account_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to resolve session")?;

    Ok(row.map(|row| row.get("account_id")))
}

/// Remove a session row; returns whether a live row was removed.
pub(crate) async fn destroy_session(pool: &PgPool, token_hash: &[u8]) -> Result<bool> {
    let query = "DELETE FROM sessions WHERE session_hash = $1 AND expires_at > NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to destroy session")?;

    Ok(result.rows_affected() > 0)
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the cookie that instructs the client to drop its session token.
pub(super) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session token out of the request's cookie header, if present.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue as TestHeaderValue;

    fn https_config() -> AuthConfig {
        AuthConfig::new("https://pordisto.dev".to_string())
    }

    fn http_config() -> AuthConfig {
        AuthConfig::new("http://localhost:3000".to_string())
    }

    #[test]
    fn session_cookie_carries_token_and_ttl() {
        let config = http_config().with_session_ttl_seconds(3600);
        let cookie = session_cookie(&config, "raw-token").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("pordisto_session=raw-token;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn session_cookie_is_secure_over_https() {
        let cookie = session_cookie(&https_config(), "raw-token").unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&http_config()).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("pordisto_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn extract_session_token_finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            TestHeaderValue::from_static("other=1; pordisto_session=tok; theme=dark"),
        );
        assert_eq!(extract_session_token(&headers), Some("tok".to_string()));
    }

    #[test]
    fn extract_session_token_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, TestHeaderValue::from_static("other=1"));
        assert_eq!(extract_session_token(&headers), None);
    }
}
