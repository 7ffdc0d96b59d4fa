//! Admin authentication, first-run setup and admin account management.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::{CookieJar, WithRejection};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::bootstrap::create_first_admin;
use crate::db::{
    AdminIdentity, AdminLoginRequest, AdminLoginResponse, AdminRole, ChangePasswordRequest,
    RegisterAdminRequest, SetupRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{
    clear_session_cookie, session_cookie, session_token, ApiJson, CurrentAdmin,
};
use super::validation::{validate_password_present, validate_register_admin, validate_setup};

#[derive(Debug, Serialize)]
pub struct SetupStatusResponse {
    pub success: bool,
    pub needs_setup: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub admin: AdminIdentity,
}

#[derive(Debug, Serialize)]
pub struct AdminListResponse {
    pub success: bool,
    pub admins: Vec<AdminIdentity>,
}

#[derive(Debug, Serialize)]
pub struct CreateAdminResponse {
    pub success: bool,
    pub admin_id: i64,
}

/// Whether the admin table is still empty
pub async fn setup_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SetupStatusResponse>, ApiError> {
    let count = state.admins.credentials().admin_count().await?;
    Ok(Json(SetupStatusResponse {
        success: true,
        needs_setup: count == 0,
    }))
}

/// Create the first `super_admin` and log it in. Refused once any admin exists.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): ApiJson<SetupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AdminLoginResponse>), ApiError> {
    validate_setup(&req)?;

    let register = RegisterAdminRequest {
        username: req.username,
        email: req.email,
        password: req.password,
        full_name: req.full_name,
        role: AdminRole::SuperAdmin,
    };
    let admin_id = create_first_admin(&state.admins, &register)
        .await?
        .ok_or_else(|| ApiError::forbidden("Setup has already been completed"))?;
    tracing::info!(admin_id, "Created first admin during setup");

    let (jar, response) = start_admin_session(&state, jar, &register.username, &register.password).await?;
    Ok((StatusCode::CREATED, jar, response))
}

/// Log in with username and password; sets the admin session cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): ApiJson<AdminLoginRequest>,
) -> Result<(CookieJar, Json<AdminLoginResponse>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if req.username.trim().is_empty() {
        errors.add("username", "Username is required");
    }
    errors.check("password", validate_password_present(&req.password));
    errors.finish()?;

    start_admin_session(&state, jar, &req.username, &req.password).await
}

async fn start_admin_session(
    state: &AppState,
    jar: CookieJar,
    username: &str,
    password: &str,
) -> Result<(CookieJar, Json<AdminLoginResponse>), ApiError> {
    let outcome = state.admins.login(username, password).await?;

    let auth = &state.config.auth;
    let jar = jar.add(session_cookie(
        &auth.admin_cookie_name,
        outcome.token.clone(),
        auth.secure_cookies,
    ));

    Ok((
        jar,
        Json(AdminLoginResponse {
            success: true,
            session_token: outcome.token,
            expires_at: outcome.expires_at,
            admin: outcome.identity,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let cookie_name = &state.config.auth.admin_cookie_name;
    if let Some(token) = session_token(&headers, cookie_name) {
        state.admins.logout(&token).await?;
    }

    Ok((
        clear_session_cookie(cookie_name),
        Json(json!({ "success": true, "message": "Logged out successfully" })),
    ))
}

pub async fn verify(admin: CurrentAdmin) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        success: true,
        admin: admin.identity,
    })
}

/// Change the calling admin's own password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    WithRejection(Json(req), _): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("current_password", validate_password_present(&req.current_password))
        .check("new_password", validate_password_present(&req.new_password));
    errors.finish()?;

    state
        .admins
        .change_password(admin.identity.id, &req.current_password, &req.new_password)
        .await?;

    tracing::info!(admin_id = admin.identity.id, "Admin changed password");
    Ok(Json(json!({ "success": true, "message": "Password updated" })))
}

pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
) -> Result<Json<AdminListResponse>, ApiError> {
    admin.require_role(AdminRole::SuperAdmin)?;

    let admins = sqlx::query_as::<_, AdminIdentity>(
        "SELECT id, username, email, full_name, role FROM admin_users ORDER BY id",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(AdminListResponse {
        success: true,
        admins,
    }))
}

/// Register another admin; super admins only
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    WithRejection(Json(req), _): ApiJson<RegisterAdminRequest>,
) -> Result<(StatusCode, Json<CreateAdminResponse>), ApiError> {
    admin.require_role(AdminRole::SuperAdmin)?;
    validate_register_admin(&req)?;

    let admin_id = state.admins.register(&req).await?;
    tracing::info!(
        admin_id,
        created_by = admin.identity.id,
        role = %req.role,
        "Admin account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateAdminResponse {
            success: true,
            admin_id,
        }),
    ))
}
