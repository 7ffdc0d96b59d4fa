//! Assignment orders.
//!
//! Students place orders for one or more active courses; the order starts
//! `pending` and a payment collaborator outside this service settles it.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::db::{
    now_timestamp, order_status, AssignmentOrder, AssignmentOrderWithUser, CreateOrderRequest,
};
use crate::AppState;

use super::error::ApiError;
use super::extract::{ApiJson, CurrentAdmin, CurrentUser};

const MAX_COURSES_PER_ORDER: usize = 50;

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub assignment: AssignmentOrder,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub success: bool,
    pub assignments: Vec<AssignmentOrder>,
}

#[derive(Debug, Serialize)]
pub struct AdminOrderListResponse {
    pub success: bool,
    pub assignments: Vec<AssignmentOrderWithUser>,
}

/// Trimmed, de-duplicated, order-preserving course codes
fn normalize_codes(codes: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    codes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_string()))
        .map(str::to_string)
        .collect()
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    WithRejection(Json(req), _): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let codes = normalize_codes(&req.course_codes);
    if codes.is_empty() {
        return Err(ApiError::validation_field(
            "course_codes",
            "Select at least one course",
        ));
    }
    if codes.len() > MAX_COURSES_PER_ORDER {
        return Err(ApiError::validation_field(
            "course_codes",
            format!("At most {} courses per order", MAX_COURSES_PER_ORDER),
        ));
    }

    let mut unknown = Vec::new();
    for code in &codes {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM courses WHERE course_code = ? AND is_active = 1")
                .bind(code)
                .fetch_optional(&state.db)
                .await?;
        if exists.is_none() {
            unknown.push(code.as_str());
        }
    }
    if !unknown.is_empty() {
        return Err(ApiError::validation_field(
            "course_codes",
            format!("Unknown or inactive courses: {}", unknown.join(", ")),
        ));
    }

    let amount = state.config.catalog.fee_per_course * codes.len() as f64;
    let transaction_id = format!("TXN{}", uuid::Uuid::new_v4().simple());

    let id = sqlx::query(
        r#"
        INSERT INTO user_assignments (user_id, courses, transaction_id, amount, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.identity.id)
    .bind(codes.join(","))
    .bind(&transaction_id)
    .bind(amount)
    .bind(order_status::PENDING)
    .bind(now_timestamp())
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    tracing::info!(
        order_id = id,
        user_id = user.identity.id,
        courses = codes.len(),
        "Assignment order recorded"
    );

    let assignment =
        sqlx::query_as::<_, AssignmentOrder>("SELECT * FROM user_assignments WHERE id = ?")
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            assignment,
        }),
    ))
}

/// The calling student's orders, newest first
pub async fn list_my_orders(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<OrderListResponse>, ApiError> {
    let assignments = sqlx::query_as::<_, AssignmentOrder>(
        "SELECT * FROM user_assignments WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user.identity.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(OrderListResponse {
        success: true,
        assignments,
    }))
}

/// Latest 100 orders across all students
pub async fn admin_list_orders(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> Result<Json<AdminOrderListResponse>, ApiError> {
    let assignments = sqlx::query_as::<_, AssignmentOrderWithUser>(
        r#"
        SELECT ua.id, u.name AS user_name, u.email AS user_email,
               ua.courses, ua.amount, ua.status, ua.created_at
        FROM user_assignments ua
        JOIN users u ON ua.user_id = u.id
        ORDER BY ua.created_at DESC, ua.id DESC
        LIMIT 100
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(AdminOrderListResponse {
        success: true,
        assignments,
    }))
}
