//! Student authentication endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::{AssignmentOrder, LoginRequest, LoginResponse, RegisterUserRequest, UserIdentity};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{
    clear_session_cookie, session_cookie, session_token, ApiJson, CurrentUser,
};
use super::validation::{validate_email, validate_password_present, validate_register_user};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserIdentity,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub message: String,
    pub user: UserIdentity,
    pub assignments: Vec<AssignmentOrder>,
}

/// Register a new student account
pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(req), _): ApiJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    validate_register_user(&req)?;

    let user_id = state.users.register(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration successful".to_string(),
            user_id,
        }),
    ))
}

/// Log in with email and password; sets the student session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("email", validate_email(&req.email))
        .check("password", validate_password_present(&req.password));
    errors.finish()?;

    let outcome = state.users.login(&req.email, &req.password).await?;

    let auth = &state.config.auth;
    let jar = jar.add(session_cookie(
        &auth.user_cookie_name,
        outcome.token.clone(),
        auth.secure_cookies,
    ));

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            session_token: outcome.token,
            expires_at: outcome.expires_at,
            user: outcome.identity,
        }),
    ))
}

/// Revoke the presented session, if any. Succeeds without a session too.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let cookie_name = &state.config.auth.user_cookie_name;
    if let Some(token) = session_token(&headers, cookie_name) {
        state.users.logout(&token).await?;
    }

    Ok((
        clear_session_cookie(cookie_name),
        Json(json!({ "success": true, "message": "Logged out successfully" })),
    ))
}

pub async fn profile(user: CurrentUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: user.identity,
    })
}

/// The student's own identity and order history
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let assignments = sqlx::query_as::<_, AssignmentOrder>(
        "SELECT * FROM user_assignments WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user.identity.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DashboardResponse {
        success: true,
        message: "Welcome to your dashboard".to_string(),
        user: user.identity,
        assignments,
    }))
}
