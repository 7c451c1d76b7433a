//! # Pordisto (Credential & Session Lifecycle)
//!
//! `pordisto` authenticates end users and manages the lifecycle of their
//! credentials and sessions: registration with uniqueness enforcement,
//! password verification, server-side cookie sessions, and a single-use,
//! time-limited password-reset flow.
//!
//! ## Anti-Enumeration
//!
//! Responses never reveal whether an account exists: failed logins use one
//! neutral message for unknown identifiers and wrong passwords, and
//! forgot-password always reports success.
//!
//! ## Storage
//!
//! Accounts live in Postgres behind unique constraints on username and email;
//! conflicts are detected at the storage layer, never via check-then-insert.
//! Sessions and reset tokens are ephemeral rows with a TTL, referencing
//! accounts by id only.

pub mod api;
pub mod cli;
