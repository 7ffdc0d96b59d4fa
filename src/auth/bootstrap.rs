//! First admin account.
//!
//! There is no built-in credential. Startup creates a `super_admin` only when
//! the admin table is empty and an operator supplied a password; otherwise
//! the setup endpoint is the only way in.

use tracing::{info, warn};

use super::password::validate_password_length;
use super::{AdminAuthenticator, AuthError};
use crate::config::BootstrapAdminConfig;
use crate::db::{AdminRole, RegisterAdminRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(i64),
    AlreadyPresent,
    /// Table empty but no password configured; first-run setup required
    AwaitingSetup,
}

/// Create the first admin from `config` if none exists. Safe to run on
/// every startup.
pub async fn ensure_bootstrap_admin(
    admins: &AdminAuthenticator,
    config: &BootstrapAdminConfig,
) -> Result<BootstrapOutcome, AuthError> {
    if admins.credentials().admin_count().await? > 0 {
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let password = match config.password.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => {
            warn!("No admin account exists and no bootstrap password is configured; use POST /api/admin/setup");
            return Ok(BootstrapOutcome::AwaitingSetup);
        }
    };

    let req = RegisterAdminRequest {
        username: config.username.clone(),
        email: config.email.clone(),
        password: password.to_string(),
        full_name: config.full_name.clone(),
        role: AdminRole::SuperAdmin,
    };
    match create_first_admin(admins, &req).await? {
        Some(id) => {
            info!(admin_id = id, username = %req.username, "Created bootstrap admin");
            Ok(BootstrapOutcome::Created(id))
        }
        // Lost a race with the setup endpoint
        None => Ok(BootstrapOutcome::AlreadyPresent),
    }
}

/// Insert `req` as the first `super_admin`. `None` if any admin already exists.
pub async fn create_first_admin(
    admins: &AdminAuthenticator,
    req: &RegisterAdminRequest,
) -> Result<Option<i64>, AuthError> {
    validate_password_length(&req.password, admins.min_password_length())?;
    admins.credentials().insert_first_admin(req).await
}
