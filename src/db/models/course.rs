//! Course catalog models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub course_code: String,
    pub course_name: String,
    pub program: String,
    pub year: String,
    pub semester: String,
    pub pdf_filename: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub course_code: String,
    pub course_name: String,
    pub program: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub semester: String,
    pub pdf_filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub program: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    pub pdf_filename: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateCourseRequest {
    pub fn is_empty(&self) -> bool {
        self.course_code.is_none()
            && self.course_name.is_none()
            && self.program.is_none()
            && self.year.is_none()
            && self.semester.is_none()
            && self.pdf_filename.is_none()
            && self.is_active.is_none()
    }
}

/// `GET /courses/filter` parameters; empty strings count as absent
#[derive(Debug, Default, Deserialize)]
pub struct CourseFilter {
    pub program: Option<String>,
    pub year: Option<String>,
    pub semester: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}
