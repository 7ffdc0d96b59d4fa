//! Degree program models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Program {
    pub id: i64,
    pub program_code: String,
    pub program_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProgramRequest {
    pub program_code: String,
    pub program_name: String,
    pub description: Option<String>,
}
