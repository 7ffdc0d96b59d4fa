//! Input validation for API requests.
//!
//! Each function checks one field and returns a client-facing message on
//! failure. Request-level validators feed them into a
//! `ValidationErrorBuilder` so one response reports every bad field.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::db::{
    CreateCourseRequest, CreateProgramRequest, CreateStudyCenterRequest, RegisterAdminRequest,
    RegisterUserRequest, SetupRequest, UpdateCourseRequest, UpdateStudyCenterRequest,
};

lazy_static! {
    /// Pragmatic email shape: local@domain.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$"
    ).unwrap();

    /// 10 to 15 digits with an optional leading '+'
    static ref MOBILE_REGEX: Regex = Regex::new(r"^\+?[0-9]{10,15}$").unwrap();

    /// Admin usernames: letters, digits, '.', '_' and '-'
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{2,49}$").unwrap();

    /// Catalog codes such as MMPC-001, MCA or SC-0712
    static ref CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,31}$").unwrap();

    static ref PINCODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

/// Validate a required free-text field (trimmed, 1..=max characters)
pub fn validate_required(value: &str, label: &str, max: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", label));
    }
    if trimmed.chars().count() > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate an optional email (empty string treated as absent)
pub fn validate_optional_email(email: &Option<String>) -> Result<(), String> {
    match email.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => validate_email(e),
        _ => Ok(()),
    }
}

pub fn validate_mobile(mobile: &str) -> Result<(), String> {
    let mobile = mobile.trim();
    if mobile.is_empty() {
        return Err("Mobile number is required".to_string());
    }
    if !MOBILE_REGEX.is_match(mobile) {
        return Err("Mobile number must be 10 to 15 digits".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 3 to 50 characters of letters, digits, '.', '_' or '-'".to_string(),
        );
    }
    Ok(())
}

/// Validate a catalog code (course, program or study center)
pub fn validate_code(code: &str, label: &str) -> Result<(), String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("{} is required", label));
    }
    if !CODE_REGEX.is_match(code) {
        return Err(format!(
            "{} must be up to 32 letters, digits, '-' or '_'",
            label
        ));
    }
    Ok(())
}

pub fn validate_pincode(pincode: &Option<String>) -> Result<(), String> {
    match pincode.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() && !PINCODE_REGEX.is_match(p) => {
            Err("Pincode must be 6 digits".to_string())
        }
        _ => Ok(()),
    }
}

/// Password presence only; the length policy lives with the authenticator
pub fn validate_password_present(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(())
}

// -------------------------------------------------------------------------
// Request validators
// -------------------------------------------------------------------------

pub fn validate_register_user(req: &RegisterUserRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("name", validate_required(&req.name, "Name", 100))
        .check("email", validate_email(&req.email))
        .check("mobile", validate_mobile(&req.mobile))
        .check("password", validate_password_present(&req.password));
    errors.finish()
}

pub fn validate_register_admin(req: &RegisterAdminRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("username", validate_username(&req.username))
        .check("email", validate_email(&req.email))
        .check("full_name", validate_required(&req.full_name, "Full name", 100))
        .check("password", validate_password_present(&req.password));
    errors.finish()
}

pub fn validate_setup(req: &SetupRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("username", validate_username(&req.username))
        .check("email", validate_email(&req.email))
        .check("full_name", validate_required(&req.full_name, "Full name", 100))
        .check("password", validate_password_present(&req.password));
    errors.finish()
}

pub fn validate_create_course(req: &CreateCourseRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("course_code", validate_code(&req.course_code, "Course code"))
        .check("course_name", validate_required(&req.course_name, "Course name", 200))
        .check("program", validate_code(&req.program, "Program"));
    errors.finish()
}

pub fn validate_update_course(req: &UpdateCourseRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(code) = &req.course_code {
        errors.check("course_code", validate_code(code, "Course code"));
    }
    if let Some(name) = &req.course_name {
        errors.check("course_name", validate_required(name, "Course name", 200));
    }
    if let Some(program) = &req.program {
        errors.check("program", validate_code(program, "Program"));
    }
    errors.finish()
}

pub fn validate_create_program(req: &CreateProgramRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("program_code", validate_code(&req.program_code, "Program code"))
        .check("program_name", validate_required(&req.program_name, "Program name", 200));
    errors.finish()
}

pub fn validate_create_study_center(req: &CreateStudyCenterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("center_code", validate_code(&req.center_code, "Center code"))
        .check("name", validate_required(&req.name, "Name", 200))
        .check("address", validate_required(&req.address, "Address", 500))
        .check("pincode", validate_pincode(&req.pincode))
        .check("email", validate_optional_email(&req.email));
    errors.finish()
}

pub fn validate_update_study_center(req: &UpdateStudyCenterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(code) = &req.center_code {
        errors.check("center_code", validate_code(code, "Center code"));
    }
    if let Some(name) = &req.name {
        errors.check("name", validate_required(name, "Name", 200));
    }
    if let Some(address) = &req.address {
        errors.check("address", validate_required(address, "Address", 500));
    }
    errors
        .check("pincode", validate_pincode(&req.pincode))
        .check("email", validate_optional_email(&req.email));
    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("  Asha.K+portal@mail.example.in ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("asha@example").is_err());
        assert!(validate_email("asha @example.com").is_err());
    }

    #[test]
    fn test_validate_mobile() {
        assert!(validate_mobile("9999999999").is_ok());
        assert!(validate_mobile("+919999999999").is_ok());
        assert!(validate_mobile("99999").is_err());
        assert!(validate_mobile("99999-99999").is_err());
        assert!(validate_mobile("").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("ops.team_1").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("-leading").is_err());
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("MMPC-001", "Course code").is_ok());
        assert!(validate_code("MCA", "Program").is_ok());
        assert!(validate_code("", "Program").unwrap_err().contains("required"));
        assert!(validate_code("MMPC 001", "Course code").is_err());
    }

    #[test]
    fn test_validate_pincode() {
        assert!(validate_pincode(&None).is_ok());
        assert!(validate_pincode(&Some(String::new())).is_ok());
        assert!(validate_pincode(&Some("110068".to_string())).is_ok());
        assert!(validate_pincode(&Some("1100".to_string())).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Asha", "Name", 100).is_ok());
        assert!(validate_required("   ", "Name", 100).is_err());
        assert!(validate_required(&"x".repeat(101), "Name", 100)
            .unwrap_err()
            .contains("too long"));
    }

    #[test]
    fn test_register_user_reports_every_field() {
        let req = RegisterUserRequest {
            name: String::new(),
            email: "nope".to_string(),
            mobile: "12".to_string(),
            password: "secret1".to_string(),
        };
        let err = validate_register_user(&req).unwrap_err();
        assert!(err.message().contains("3 fields"));

        let ok = RegisterUserRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9999999999".to_string(),
            password: "secret1".to_string(),
        };
        assert!(validate_register_user(&ok).is_ok());
    }

    #[test]
    fn test_update_course_checks_only_present_fields() {
        let req = UpdateCourseRequest {
            course_name: Some("Management Functions".to_string()),
            ..Default::default()
        };
        assert!(validate_update_course(&req).is_ok());

        let req = UpdateCourseRequest {
            course_code: Some("bad code".to_string()),
            ..Default::default()
        };
        assert!(validate_update_course(&req).is_err());
    }
}
