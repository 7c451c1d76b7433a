//! Account, session, and password-reset lifecycle.
//!
//! The six operations (`register`, `login`, `me`, `forgot_password`,
//! `change_password`, `logout`) live in [`service`]; everything else here is
//! storage and plumbing for them.
//!
//! ## Sessions
//!
//! A session is a random 256-bit token delivered through the
//! `pordisto_session` cookie. The database stores only the SHA-256 hash of
//! the token; logout always instructs the client to clear the cookie, even
//! when no server-side session was found.
//!
//! ## Password Resets
//!
//! Forgot-password mints a random single-use token mapped to the account id
//! in the TTL key-value store (24 h). Redemption removes the entry
//! atomically, so a token can never reset a password twice, even under
//! concurrent redemption. Issuing a new token does not invalidate earlier
//! ones; each expires on its own.
//!
//! ## Anti-Enumeration
//!
//! Failed logins return one neutral message whether the identifier is unknown
//! or the password is wrong, and forgot-password reports success for unknown
//! emails.

pub(crate) mod accounts;
pub mod endpoints;
mod hasher;
pub mod kv;
pub mod service;
pub(crate) mod session;
mod state;
pub mod types;
mod utils;
mod validate;

pub use kv::spawn_expiry_sweeper;
pub use state::{AuthConfig, AuthState};
