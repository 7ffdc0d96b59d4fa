//! Course catalog endpoints.
//!
//! Admins manage the full table; students only ever see active courses
//! through the public filter.

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
    now_timestamp, Course, CourseFilter, CreateCourseRequest, Page, PageQuery, UpdateCourseRequest,
};
use crate::{AppState, DbPool};

use super::error::ApiError;
use super::extract::{ApiJson, CurrentAdmin};
use super::validation::{validate_create_course, validate_update_course};

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub success: bool,
    pub courses: Vec<Course>,
}

fn course_conflict(err: sqlx::Error) -> ApiError {
    match unique_violation_column(&err).as_deref() {
        Some("course_code") => ApiError::conflict("Course code already exists"),
        _ => ApiError::from(err),
    }
}

/// Empty query parameters mean "no constraint"
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) async fn filter_courses(
    db: &DbPool,
    filter: &CourseFilter,
    active_only: bool,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT * FROM courses
        WHERE (?1 IS NULL OR program = ?1)
          AND (?2 IS NULL OR year = ?2)
          AND (?3 IS NULL OR semester = ?3)
          AND (?4 = 0 OR is_active = 1)
        ORDER BY course_code
        "#,
    )
    .bind(non_empty(&filter.program))
    .bind(non_empty(&filter.year))
    .bind(non_empty(&filter.semester))
    .bind(active_only)
    .fetch_all(db)
    .await
}

/// Public course picker: active courses only, whatever the query says
pub async fn public_filter(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<CourseListResponse>, ApiError> {
    let courses = filter_courses(&state.db, &filter, true).await?;
    Ok(Json(CourseListResponse {
        success: true,
        courses,
    }))
}

pub async fn admin_filter(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(filter): Query<CourseFilter>,
) -> Result<Json<CourseListResponse>, ApiError> {
    let courses = filter_courses(&state.db, &filter, !filter.include_inactive).await?;
    Ok(Json(CourseListResponse {
        success: true,
        courses,
    }))
}

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<Course>>, ApiError> {
    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(Page::new(courses, total)))
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    WithRejection(Json(req), _): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    validate_create_course(&req)?;

    let now = now_timestamp();
    let id = sqlx::query(
        r#"
        INSERT INTO courses (course_code, course_name, program, year, semester, pdf_filename, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.course_code.trim())
    .bind(req.course_name.trim())
    .bind(req.program.trim())
    .bind(req.year.trim())
    .bind(req.semester.trim())
    .bind(&req.pdf_filename)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(course_conflict)?
    .last_insert_rowid();

    tracing::info!(course_id = id, admin_id = admin.identity.id, "Course created");

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Partial update; absent fields keep their value
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): ApiJson<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    validate_update_course(&req)?;

    let result = sqlx::query(
        r#"
        UPDATE courses SET
            course_code = COALESCE(?, course_code),
            course_name = COALESCE(?, course_name),
            program = COALESCE(?, program),
            year = COALESCE(?, year),
            semester = COALESCE(?, semester),
            pdf_filename = COALESCE(?, pdf_filename),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(req.course_code.as_deref().map(str::trim))
    .bind(req.course_name.as_deref().map(str::trim))
    .bind(req.program.as_deref().map(str::trim))
    .bind(req.year.as_deref().map(str::trim))
    .bind(req.semester.as_deref().map(str::trim))
    .bind(&req.pdf_filename)
    .bind(req.is_active)
    .bind(now_timestamp())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(course_conflict)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Course not found"));
    }

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    admin: CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Course not found"));
    }

    tracing::info!(course_id = id, admin_id = admin.identity.id, "Course deleted");
    Ok(Json(json!({ "success": true, "message": "Course deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    async fn seed(db: &DbPool, code: &str, program: &str, year: &str, active: bool) {
        let now = now_timestamp();
        sqlx::query(
            "INSERT INTO courses (course_code, course_name, program, year, semester, is_active, created_at, updated_at) VALUES (?, 'Course', ?, ?, '', ?, ?, ?)",
        )
        .bind(code)
        .bind(program)
        .bind(year)
        .bind(active)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await
        .unwrap();
    }

    fn filter(program: Option<&str>, year: Option<&str>) -> CourseFilter {
        CourseFilter {
            program: program.map(str::to_string),
            year: year.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_filter_matches_supplied_fields_only() {
        let db = init_in_memory().await.unwrap();
        seed(&db, "MMPC-002", "MBA", "1", true).await;
        seed(&db, "MMPC-001", "MBA", "1", true).await;
        seed(&db, "MMPC-010", "MBA", "2", true).await;
        seed(&db, "MCS-011", "MCA", "1", true).await;

        let all = filter_courses(&db, &filter(None, None), true).await.unwrap();
        assert_eq!(all.len(), 4);

        let mba_first_year = filter_courses(&db, &filter(Some("MBA"), Some("1")), true)
            .await
            .unwrap();
        let codes: Vec<_> = mba_first_year.iter().map(|c| c.course_code.as_str()).collect();
        assert_eq!(codes, vec!["MMPC-001", "MMPC-002"]);

        // Empty strings are treated as absent
        let blank = filter_courses(&db, &filter(Some(""), Some(" ")), true).await.unwrap();
        assert_eq!(blank.len(), 4);
    }

    #[tokio::test]
    async fn test_filter_hides_inactive_unless_asked() {
        let db = init_in_memory().await.unwrap();
        seed(&db, "MMPC-001", "MBA", "1", true).await;
        seed(&db, "MMPC-099", "MBA", "1", false).await;

        let active = filter_courses(&db, &filter(Some("MBA"), None), true).await.unwrap();
        assert_eq!(active.len(), 1);

        let everything = filter_courses(&db, &filter(Some("MBA"), None), false).await.unwrap();
        assert_eq!(everything.len(), 2);
    }
}
