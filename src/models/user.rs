// src/models/user.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, FieldErrors};

/// Account role; decides which views a session may enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => {
                let mut errors = FieldErrors::new();
                errors.add("role", format!("Unknown role '{}'", other));
                Err(AppError::Validation(errors))
            }
        }
    }
}

/// Minimal identity record persisted next to the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: Role,

    /// Not every API echoes the username back; kept when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 100, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

/// Body returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    #[serde(default)]
    pub username: Option<String>,
}

/// DTO for creating a new account (Registration).
#[derive(Debug, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name length must be between 2 and 100 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    pub role: Role,
}

/// Registration form as typed by the user, including the confirmation field
/// that never leaves the client.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl RegisterForm {
    /// Checks the form and produces the request body.
    pub fn into_request(self) -> Result<RegisterRequest, AppError> {
        let request = RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
            role: self.role,
        };

        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if request.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match.");
        }
        errors.into_result()?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegisterForm {
        RegisterForm {
            name: "Lan Nguyen".to_string(),
            email: "lan@example.com".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(" student ".parse::<Role>().unwrap(), Role::Student);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Identity {
            role: Role::Teacher,
            username: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"teacher"}"#);
    }

    #[test]
    fn register_form_accepts_valid_input() {
        let request = form().into_request().unwrap();
        assert_eq!(request.email, "lan@example.com");
    }

    #[test]
    fn register_form_reports_every_bad_field() {
        let mut bad = form();
        bad.email = "not-an-email".to_string();
        bad.confirm_password = "different".to_string();

        let err = bad.into_request().unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("email"));
        assert_eq!(fields.get("confirm_password"), Some("Passwords do not match."));
    }
}
