//! Credential store: identity rows and the password check.
//!
//! Uniqueness of email/mobile (students) and username/email (admins) is
//! enforced by unique indexes; a failed insert is translated into a
//! `Conflict` naming the clashing field. There is no check-then-insert.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use sqlx::SqliteConnection;

use super::password::{hash_password, verify_password};
use super::{unique_violation_column, AuthError};
use crate::db::{
    format_timestamp, now_timestamp, Admin, AdminIdentity, AdminRole, RegisterAdminRequest,
    RegisterUserRequest, User, UserIdentity,
};
use crate::DbPool;

lazy_static! {
    /// Verified against when the lookup key matches no row, so unknown and
    /// known accounts cost the same Argon2 work
    static ref DUMMY_HASH: Option<String> = hash_password("portal-unknown-account").ok();
}

fn burn_verify(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        verify_password(password, hash);
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    db: DbPool,
}

impl CredentialStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // -------------------------------------------------------------------------
    // Students
    // -------------------------------------------------------------------------

    /// Insert a student; fails with `Conflict` on a taken email or mobile
    pub async fn register_user(&self, req: &RegisterUserRequest) -> Result<i64, AuthError> {
        let password_hash = hash_password(&req.password)?;

        let email = normalize_email(&req.email);

        let result = sqlx::query(
            "INSERT INTO users (name, email, mobile, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(req.name.trim())
        .bind(&email)
        .bind(req.mobile.trim())
        .bind(&password_hash)
        .bind(now_timestamp())
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if unique_violation_column(&e).is_some() => {
                Err(self.user_conflict(&email).await?)
            }
            Err(e) => Err(AuthError::Database(e)),
        }
    }

    /// SQLite names whichever index tripped first; a taken email always wins
    async fn user_conflict(&self, email: &str) -> Result<AuthError, AuthError> {
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;

        let message = if email_taken {
            "Email already registered"
        } else {
            "Mobile number already registered"
        };
        Ok(AuthError::Conflict(message.to_string()))
    }

    /// The student behind `email` if the account is active and `password` matches
    pub async fn verify_user(&self, email: &str, password: &str) -> Result<Option<User>, AuthError> {
        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE email = ? AND is_active = 1")
                .bind(normalize_email(email))
                .fetch_optional(&self.db)
                .await?;

        match user {
            Some(u) if verify_password(password, &u.password_hash) => Ok(Some(u)),
            Some(_) => Ok(None),
            None => {
                burn_verify(password);
                Ok(None)
            }
        }
    }

    pub async fn active_user(&self, id: i64) -> Result<Option<UserIdentity>, AuthError> {
        let identity = sqlx::query_as::<_, UserIdentity>(
            "SELECT id, name, email, mobile FROM users WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(identity)
    }

    pub(crate) async fn touch_user_login_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(format_timestamp(now))
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Returns false when no student has this id
    pub(crate) async fn set_user_active_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        is_active: bool,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Admins
    // -------------------------------------------------------------------------

    /// Insert an admin; fails with `Conflict` on a taken username or email
    pub async fn register_admin(&self, req: &RegisterAdminRequest) -> Result<i64, AuthError> {
        let password_hash = hash_password(&req.password)?;

        let result = sqlx::query(
            "INSERT INTO admin_users (username, email, password_hash, full_name, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(req.username.trim())
        .bind(normalize_email(&req.email))
        .bind(&password_hash)
        .bind(req.full_name.trim())
        .bind(req.role)
        .bind(now_timestamp())
        .execute(&self.db)
        .await
        .map_err(admin_conflict)?;

        Ok(result.last_insert_rowid())
    }

    /// Insert `req` as a super admin only if the admin table is empty.
    ///
    /// A single `INSERT ... WHERE NOT EXISTS` statement, so two racing
    /// bootstraps cannot both succeed. Returns the new id, or `None` when an
    /// admin already existed.
    pub async fn insert_first_admin(
        &self,
        req: &RegisterAdminRequest,
    ) -> Result<Option<i64>, AuthError> {
        let password_hash = hash_password(&req.password)?;

        let result = sqlx::query(
            r#"
            INSERT INTO admin_users (username, email, password_hash, full_name, role, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM admin_users)
            "#,
        )
        .bind(req.username.trim())
        .bind(normalize_email(&req.email))
        .bind(&password_hash)
        .bind(req.full_name.trim())
        .bind(AdminRole::SuperAdmin)
        .bind(now_timestamp())
        .execute(&self.db)
        .await
        .map_err(admin_conflict)?;

        if result.rows_affected() == 0 {
            Ok(None)
        } else {
            Ok(Some(result.last_insert_rowid()))
        }
    }

    pub async fn admin_count(&self) -> Result<i64, AuthError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// The admin behind `username` if the account is active and `password` matches
    pub async fn verify_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>, AuthError> {
        let admin: Option<Admin> =
            sqlx::query_as("SELECT * FROM admin_users WHERE username = ? AND is_active = 1")
                .bind(username.trim())
                .fetch_optional(&self.db)
                .await?;

        match admin {
            Some(a) if verify_password(password, &a.password_hash) => Ok(Some(a)),
            Some(_) => Ok(None),
            None => {
                burn_verify(password);
                Ok(None)
            }
        }
    }

    pub async fn active_admin(&self, id: i64) -> Result<Option<AdminIdentity>, AuthError> {
        let identity = sqlx::query_as::<_, AdminIdentity>(
            "SELECT id, username, email, full_name, role FROM admin_users WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(identity)
    }

    pub(crate) async fn touch_admin_login_in(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
            .bind(format_timestamp(now))
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Replace an admin's password after checking the current one
    pub async fn change_admin_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM admin_users WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        match stored {
            Some(hash) if verify_password(current_password, &hash) => {}
            _ => return Err(AuthError::InvalidCredentials),
        }

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE admin_users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

fn admin_conflict(err: sqlx::Error) -> AuthError {
    match unique_violation_column(&err) {
        Some(_) => AuthError::Conflict("Username or email already exists".to_string()),
        None => AuthError::Database(err),
    }
}
