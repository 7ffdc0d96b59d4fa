//! Back-office student management.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::{Page, PageQuery, UpdateUserStatusRequest, UserSummary};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, CurrentAdmin};

/// Paginated student list, newest first; never includes password hashes
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<UserSummary>>, ApiError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, name, email, mobile, created_at, last_login, is_active
        FROM users
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(Page::new(users, total)))
}

/// Activate or deactivate a student; deactivation ends their sessions
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): ApiJson<UpdateUserStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.users.set_active(id, req.is_active).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(
        user_id = id,
        is_active = req.is_active,
        admin_id = admin.identity.id,
        "Admin changed student status"
    );
    Ok(Json(json!({
        "success": true,
        "message": "User status updated successfully",
    })))
}
