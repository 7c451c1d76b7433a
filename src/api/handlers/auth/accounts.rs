//! Durable account records (credential store).
//!
//! Uniqueness of username and email is enforced by database constraints; a
//! violation on insert surfaces as [`InsertOutcome::Conflict`], never as a
//! check-then-insert race in application code.

use anyhow::{Context, Result};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;

use super::types::Account;
use super::utils::is_unique_violation;

/// Row-level view of an account, including the password hash.
/// Only [`Account`] (without the hash) crosses the service boundary.
#[derive(Debug)]
pub(crate) struct AccountRecord {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AccountRecord {
    pub(crate) fn into_account(self) -> Account {
        Account {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(crate) enum InsertOutcome {
    Created(AccountRecord),
    Conflict,
}

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, \
     created_at::text AS created_at, updated_at::text AS updated_at";

fn record_from_row(row: &PgRow) -> AccountRecord {
    AccountRecord {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;

    Ok(row.map(|row| record_from_row(&row)))
}

async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by username")?;

    Ok(row.map(|row| record_from_row(&row)))
}

/// Dispatch on whether the identifier contains an "@".
///
/// This is a deliberate heuristic, not email validation: identifiers with an
/// "@" are looked up as emails, everything else as usernames.
pub(crate) async fn find_by_username_or_email(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<AccountRecord>> {
    if identifier.contains('@') {
        find_by_email(pool, identifier).await
    } else {
        find_by_username(pool, identifier).await
    }
}

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<AccountRecord>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    Ok(row.map(|row| record_from_row(&row)))
}

pub(crate) async fn insert(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<InsertOutcome> {
    let query = format!(
        "INSERT INTO accounts (username, email, password_hash) \
         VALUES ($1, $2, $3) \
         RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(record_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Replace the password hash; returns the updated record, or `None` when the
/// account no longer exists.
pub(crate) async fn update_password_hash(
    pool: &PgPool,
    id: i64,
    password_hash: &str,
) -> Result<Option<AccountRecord>> {
    let query = format!(
        "UPDATE accounts \
         SET password_hash = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .bind(password_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update password hash")?;

    Ok(row.map(|row| record_from_row(&row)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_outcome_debug_names() {
        assert_eq!(format!("{:?}", InsertOutcome::Conflict), "Conflict");
    }

    #[test]
    fn record_into_account_drops_password_hash() {
        let record = AccountRecord {
            id: 7,
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            created_at: "2024-01-01 00:00:00+00".to_string(),
            updated_at: "2024-01-01 00:00:00+00".to_string(),
        };
        let account = record.into_account();
        assert_eq!(account.id, 7);
        assert_eq!(account.username, "alice");
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
