// src/routes.rs

//! Endpoint table of the external exam API, plus the client-side views a
//! controller can send the user to.

use std::borrow::Cow;
use std::fmt;

use crate::error::{AppError, FieldErrors};
use crate::models::user::Role;

pub const LOGIN: &str = "/api/auth/login";
pub const REGISTER: &str = "/api/auth/register";

pub const EXAMS: &str = "/api/exams";
pub const TEACHER_EXAMS: &str = "/api/exams/teacher";
pub const AVAILABLE_EXAMS: &str = "/api/exams/available";
pub const TEACHER_STATS: &str = "/api/exams/stats";

pub const MEDIA: &str = "/api/media";

pub const SUBMISSIONS: &str = "/api/submissions";
pub const STUDENT_SUBMISSIONS: &str = "/api/submissions/student";
pub const STUDENT_STATS: &str = "/api/submissions/stats";

/// Escapes a caller-supplied id so it stays one path segment. Empty and dot
/// ids are refused since they would resolve to another endpoint.
fn segment(id: &str) -> Result<Cow<'_, str>, AppError> {
    match id {
        "" | "." | ".." => {
            let mut errors = FieldErrors::new();
            errors.add("id", format!("'{}' is not a valid id", id));
            Err(AppError::Validation(errors))
        }
        _ => Ok(urlencoding::encode(id)),
    }
}

pub fn exam(id: &str) -> Result<String, AppError> {
    Ok(format!("{}/{}", EXAMS, segment(id)?))
}

pub fn submission(id: &str) -> Result<String, AppError> {
    Ok(format!("{}/{}", SUBMISSIONS, segment(id)?))
}

pub fn exam_submissions(exam_id: &str) -> Result<String, AppError> {
    Ok(format!("{}/exam/{}", SUBMISSIONS, segment(exam_id)?))
}

/// Where the user goes next after an operation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Home,
    Login,
    StudentDashboard,
    TeacherDashboard,
    TakeExam(String),
    CreateExam,
    ManageExam(String),
    Result(String),
}

impl Navigation {
    /// Landing view for a freshly authenticated user.
    pub fn dashboard_for(role: Role) -> Self {
        match role {
            Role::Student => Navigation::StudentDashboard,
            Role::Teacher => Navigation::TeacherDashboard,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Navigation::Home => "/".to_string(),
            Navigation::Login => "/login".to_string(),
            Navigation::StudentDashboard => "/student".to_string(),
            Navigation::TeacherDashboard => "/teacher".to_string(),
            Navigation::TakeExam(id) => format!("/exam/{}", id),
            Navigation::CreateExam => "/create-exam".to_string(),
            Navigation::ManageExam(id) => format!("/exams/{}/manage", id),
            Navigation::Result(id) => format!("/result/{}", id),
        }
    }

    /// Role a view is restricted to, if any.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Navigation::StudentDashboard | Navigation::TakeExam(_) => Some(Role::Student),
            Navigation::TeacherDashboard | Navigation::CreateExam | Navigation::ManageExam(_) => {
                Some(Role::Teacher)
            }
            Navigation::Home | Navigation::Login | Navigation::Result(_) => None,
        }
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
