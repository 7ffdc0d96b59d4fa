//! Session ledger rows and login payloads.

use serde::Serialize;
use sqlx::FromRow;

use super::admin::AdminIdentity;
use super::user::UserIdentity;

/// One row of either session table; `owner_id` is aliased from
/// `user_id` / `admin_id` by the ledger queries.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub owner_id: i64,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub session_token: String,
    pub expires_at: String,
    pub user: UserIdentity,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub session_token: String,
    pub expires_at: String,
    pub admin: AdminIdentity,
}
