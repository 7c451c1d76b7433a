//! Ephemeral TTL key-value store.
//!
//! Backs single-use password-reset tokens: key = a fixed namespace prefix plus
//! the raw token, value = the account id, expiry = a per-entry TTL. Entries
//! become unreadable the moment `expires_at` passes; a background sweeper
//! reclaims the dead rows (and expired sessions) later.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, Instrument};

/// Insert or overwrite an entry with a fresh TTL.
pub async fn kv_set(pool: &PgPool, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
    let query = r"
        INSERT INTO kv_store (key, value, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        ON CONFLICT (key) DO UPDATE
        SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(key)
        .bind(value)
        .bind(ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to set kv entry")?;
    Ok(())
}

/// Read an unexpired entry without consuming it.
pub async fn kv_get(pool: &PgPool, key: &str) -> Result<Option<String>> {
    let query = "SELECT value FROM kv_store WHERE key = $1 AND expires_at > NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(key)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to get kv entry")?;

    Ok(row.map(|row| row.get("value")))
}

/// Atomically remove and return an unexpired entry.
/// Two concurrent takes of the same key cannot both observe the value, which
/// is what enforces single use for reset tokens.
pub async fn kv_take(pool: &PgPool, key: &str) -> Result<Option<String>> {
    let query = "DELETE FROM kv_store WHERE key = $1 AND expires_at > NOW() RETURNING value";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(key)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to take kv entry")?;

    Ok(row.map(|row| row.get("value")))
}

/// Remove an entry. Removing a missing key is not an error.
pub async fn kv_delete(pool: &PgPool, key: &str) -> Result<()> {
    let query = "DELETE FROM kv_store WHERE key = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(key)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete kv entry")?;
    Ok(())
}

async fn purge_expired(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM kv_store WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let kv_purged = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge expired kv entries")?
        .rows_affected();

    let query = "DELETE FROM sessions WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let sessions_purged = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to purge expired sessions")?
        .rows_affected();

    Ok(kv_purged + sessions_purged)
}

/// Spawn a background task that reclaims expired kv entries and sessions.
pub fn spawn_expiry_sweeper(pool: PgPool, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = purge_expired(&pool).await {
                error!("expiry sweep failed: {err}");
            }

            sleep(interval).await;
        }
    })
}
