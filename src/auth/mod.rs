//! Accounts, sessions and request authorization.
//!
//! Two realms share the same machinery but never each other's storage:
//! students (`users` / `user_sessions`) and back-office admins
//! (`admin_users` / `admin_sessions`). A token minted in one realm is
//! unknown to the other realm's ledger, so gates cannot cross-accept.

pub mod authenticator;
pub mod bootstrap;
pub mod credentials;
mod error;
pub mod gate;
pub mod ledger;
pub mod password;
pub mod sweeper;
pub mod token;

pub use authenticator::{AdminAuthenticator, LoginOutcome, UserAuthenticator};
pub use credentials::CredentialStore;
pub use error::AuthError;
pub(crate) use error::unique_violation_column;
pub use gate::{DenyReason, GateDecision, SessionAuthority};
pub use ledger::{IssuedSession, SessionLedger};

use std::fmt;

/// An independent authentication domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Realm {
    User,
    Admin,
}

impl Realm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Realm::User => "user",
            Realm::Admin => "admin",
        }
    }

    pub(crate) fn session_table(&self) -> &'static str {
        match self {
            Realm::User => "user_sessions",
            Realm::Admin => "admin_sessions",
        }
    }

    pub(crate) fn owner_column(&self) -> &'static str {
        match self {
            Realm::User => "user_id",
            Realm::Admin => "admin_id",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
