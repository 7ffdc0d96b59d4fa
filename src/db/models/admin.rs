//! Back-office account models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super_admin",
        }
    }

    /// Whether this role carries every privilege of `required`
    pub fn satisfies(&self, required: AdminRole) -> bool {
        match required {
            AdminRole::Admin => true,
            AdminRole::SuperAdmin => *self == AdminRole::SuperAdmin,
        }
    }
}

impl Default for AdminRole {
    fn default() -> Self {
        AdminRole::Admin
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: AdminRole,
}

impl From<Admin> for AdminIdentity {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            email: admin.email,
            full_name: admin.full_name,
            role: admin.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: AdminRole,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// First-run setup; always creates a super admin
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}
