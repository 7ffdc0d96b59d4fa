//! Study center endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::unique_violation_column;
use crate::db::{
    now_timestamp, CreateStudyCenterRequest, Page, PageQuery, StudyCenter, UpdateStudyCenterRequest,
};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, CurrentAdmin};
use super::validation::{validate_create_study_center, validate_update_study_center};

#[derive(Debug, Serialize)]
pub struct StudyCenterListResponse {
    pub success: bool,
    pub centers: Vec<StudyCenter>,
}

fn center_conflict(err: sqlx::Error) -> ApiError {
    match unique_violation_column(&err).as_deref() {
        Some("center_code") => ApiError::conflict("Center code already exists"),
        _ => ApiError::from(err),
    }
}

/// Active centers for the student order form
pub async fn public_study_centers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StudyCenterListResponse>, ApiError> {
    let centers = sqlx::query_as::<_, StudyCenter>(
        "SELECT * FROM study_centers WHERE is_active = 1 ORDER BY center_code",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(StudyCenterListResponse {
        success: true,
        centers,
    }))
}

pub async fn list_study_centers(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<StudyCenter>>, ApiError> {
    let centers = sqlx::query_as::<_, StudyCenter>(
        "SELECT * FROM study_centers ORDER BY center_code LIMIT ? OFFSET ?",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM study_centers")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(Page::new(centers, total)))
}

pub async fn create_study_center(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    WithRejection(Json(req), _): ApiJson<CreateStudyCenterRequest>,
) -> Result<(StatusCode, Json<StudyCenter>), ApiError> {
    validate_create_study_center(&req)?;

    let now = now_timestamp();
    let id = sqlx::query(
        r#"
        INSERT INTO study_centers (center_code, name, address, city, state, pincode, phone, email, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.center_code.trim())
    .bind(req.name.trim())
    .bind(req.address.trim())
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.pincode)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(center_conflict)?
    .last_insert_rowid();

    tracing::info!(center_id = id, admin_id = admin.identity.id, "Study center created");

    let center = sqlx::query_as::<_, StudyCenter>("SELECT * FROM study_centers WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn update_study_center(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): ApiJson<UpdateStudyCenterRequest>,
) -> Result<Json<StudyCenter>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    validate_update_study_center(&req)?;

    let result = sqlx::query(
        r#"
        UPDATE study_centers SET
            center_code = COALESCE(?, center_code),
            name = COALESCE(?, name),
            address = COALESCE(?, address),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            pincode = COALESCE(?, pincode),
            phone = COALESCE(?, phone),
            email = COALESCE(?, email),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.center_code.as_deref().map(str::trim))
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.address.as_deref().map(str::trim))
    .bind(&req.city)
    .bind(&req.state)
    .bind(&req.pincode)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(req.is_active)
    .bind(now_timestamp())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(center_conflict)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Study center not found"));
    }

    let center = sqlx::query_as::<_, StudyCenter>("SELECT * FROM study_centers WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(center))
}

pub async fn delete_study_center(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let result = sqlx::query("DELETE FROM study_centers WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Study center not found"));
    }

    tracing::info!(center_id = id, admin_id = admin.identity.id, "Study center deleted");
    Ok(Json(json!({ "success": true, "message": "Study center deleted successfully" })))
}
