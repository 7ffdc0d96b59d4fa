//! Degree program endpoints.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::unique_violation_column;
use crate::db::{now_timestamp, CreateProgramRequest, Program};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, CurrentAdmin};
use super::validation::validate_create_program;

#[derive(Debug, Serialize)]
pub struct ProgramListResponse {
    pub success: bool,
    pub programs: Vec<Program>,
}

/// Active programs for the public course picker
pub async fn public_programs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProgramListResponse>, ApiError> {
    let programs = sqlx::query_as::<_, Program>(
        "SELECT * FROM programs WHERE is_active = 1 ORDER BY program_code",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ProgramListResponse {
        success: true,
        programs,
    }))
}

pub async fn list_programs(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> Result<Json<ProgramListResponse>, ApiError> {
    let programs = sqlx::query_as::<_, Program>("SELECT * FROM programs ORDER BY program_code")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(ProgramListResponse {
        success: true,
        programs,
    }))
}

pub async fn create_program(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    WithRejection(Json(req), _): ApiJson<CreateProgramRequest>,
) -> Result<(StatusCode, Json<Program>), ApiError> {
    validate_create_program(&req)?;

    let id = sqlx::query(
        "INSERT INTO programs (program_code, program_name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(req.program_code.trim())
    .bind(req.program_name.trim())
    .bind(&req.description)
    .bind(now_timestamp())
    .execute(&state.db)
    .await
    .map_err(|e| match unique_violation_column(&e).as_deref() {
        Some("program_code") => ApiError::conflict("Program code already exists"),
        _ => ApiError::from(e),
    })?
    .last_insert_rowid();

    tracing::info!(program_id = id, admin_id = admin.identity.id, "Program created");

    let program = sqlx::query_as::<_, Program>("SELECT * FROM programs WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    Ok((StatusCode::CREATED, Json(program)))
}
