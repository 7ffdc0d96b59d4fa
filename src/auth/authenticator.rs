//! Per-realm authenticators: register, login, logout and session lookup.
//!
//! `UserAuthenticator` keys logins by email, `AdminAuthenticator` by
//! username. Each owns a ledger bound to its own session table.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info};

use super::credentials::CredentialStore;
use super::gate::SessionAuthority;
use super::ledger::SessionLedger;
use super::password::validate_password_length;
use super::{AuthError, Realm};
use crate::db::{
    format_timestamp, AdminIdentity, RegisterAdminRequest, RegisterUserRequest, UserIdentity,
};
use crate::DbPool;

/// Result of a successful login; `token` is the bearer credential
#[derive(Debug, Clone)]
pub struct LoginOutcome<I> {
    pub token: String,
    pub expires_at: String,
    pub identity: I,
}

#[derive(Debug, Clone)]
pub struct UserAuthenticator {
    db: DbPool,
    credentials: CredentialStore,
    ledger: SessionLedger,
    min_password_length: usize,
}

impl UserAuthenticator {
    pub fn new(db: DbPool, session_ttl: Duration, min_password_length: usize) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            ledger: SessionLedger::new(db.clone(), Realm::User, session_ttl),
            db,
            min_password_length,
        }
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub async fn register(&self, req: &RegisterUserRequest) -> Result<i64, AuthError> {
        validate_password_length(&req.password, self.min_password_length)?;
        let id = self.credentials.register_user(req).await?;
        info!(user_id = id, "Student registered");
        Ok(id)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome<UserIdentity>, AuthError> {
        let user = self
            .credentials
            .verify_user(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let issued = self.ledger.issue_in(&mut tx, user.id, now).await?;
        self.credentials.touch_user_login_in(&mut tx, user.id, now).await?;
        tx.commit().await?;

        info!(user_id = user.id, "Student logged in");
        Ok(LoginOutcome {
            token: issued.token,
            expires_at: format_timestamp(issued.expires_at),
            identity: UserIdentity::from(user),
        })
    }

    /// Always succeeds from the caller's side unless the store itself fails
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.ledger.revoke(token).await
    }

    pub async fn verify_session(&self, token: &str) -> Result<Option<UserIdentity>, AuthError> {
        match self.ledger.resolve(token).await? {
            Some(session) => self.credentials.active_user(session.owner_id).await,
            None => Ok(None),
        }
    }

    /// Activate or deactivate a student. Deactivation revokes every session
    /// of that student in the same transaction. Returns false for an unknown id.
    pub async fn set_active(&self, user_id: i64, is_active: bool) -> Result<bool, AuthError> {
        let mut tx = self.db.begin().await?;
        if !self.credentials.set_user_active_in(&mut tx, user_id, is_active).await? {
            return Ok(false);
        }
        let revoked = if is_active {
            0
        } else {
            self.ledger.revoke_all_in(&mut tx, user_id).await?
        };
        tx.commit().await?;

        info!(user_id, is_active, revoked_sessions = revoked, "Student status updated");
        Ok(true)
    }
}

#[async_trait]
impl SessionAuthority for UserAuthenticator {
    type Identity = UserIdentity;

    fn realm(&self) -> Realm {
        Realm::User
    }

    async fn resolve_identity(&self, token: &str) -> Result<Option<UserIdentity>, AuthError> {
        self.verify_session(token).await
    }
}

#[derive(Debug, Clone)]
pub struct AdminAuthenticator {
    db: DbPool,
    credentials: CredentialStore,
    ledger: SessionLedger,
    min_password_length: usize,
}

impl AdminAuthenticator {
    pub fn new(db: DbPool, session_ttl: Duration, min_password_length: usize) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            ledger: SessionLedger::new(db.clone(), Realm::Admin, session_ttl),
            db,
            min_password_length,
        }
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    pub async fn register(&self, req: &RegisterAdminRequest) -> Result<i64, AuthError> {
        validate_password_length(&req.password, self.min_password_length)?;
        let id = self.credentials.register_admin(req).await?;
        info!(admin_id = id, role = %req.role, "Admin registered");
        Ok(id)
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome<AdminIdentity>, AuthError> {
        let admin = self
            .credentials
            .verify_admin(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let issued = self.ledger.issue_in(&mut tx, admin.id, now).await?;
        self.credentials.touch_admin_login_in(&mut tx, admin.id, now).await?;
        tx.commit().await?;

        info!(admin_id = admin.id, "Admin logged in");
        Ok(LoginOutcome {
            token: issued.token,
            expires_at: format_timestamp(issued.expires_at),
            identity: AdminIdentity::from(admin),
        })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.ledger.revoke(token).await
    }

    pub async fn verify_session(&self, token: &str) -> Result<Option<AdminIdentity>, AuthError> {
        match self.ledger.resolve(token).await? {
            Some(session) => self.credentials.active_admin(session.owner_id).await,
            None => Ok(None),
        }
    }

    pub async fn change_password(
        &self,
        admin_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password_length(new_password, self.min_password_length)?;
        self.credentials
            .change_admin_password(admin_id, current_password, new_password)
            .await?;
        debug!(admin_id, "Admin password changed");
        Ok(())
    }
}

#[async_trait]
impl SessionAuthority for AdminAuthenticator {
    type Identity = AdminIdentity;

    fn realm(&self) -> Realm {
        Realm::Admin
    }

    async fn resolve_identity(&self, token: &str) -> Result<Option<AdminIdentity>, AuthError> {
        self.verify_session(token).await
    }
}
