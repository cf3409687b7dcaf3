// src/error.rs

use std::collections::BTreeMap;
use std::fmt;

/// Field name -> user-facing message, one message per field.
///
/// Mirrors the inline error slots of a form: the first problem found for a
/// field wins, later ones for the same field are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise a `Validation` error carrying `self`.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            if let Some(first) = errs.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Global Application Error Enum.
/// Every controller and the HTTP client report failures through this type.
#[derive(Debug)]
pub enum AppError {
    // Fetch failed; terminal for the current view
    LoadFailure(String),

    // Local form/state invariant violated, never sent to the network
    Validation(FieldErrors),

    // A write was rejected; user input is kept for a retry
    SubmissionFailure(String),

    // Credentials rejected or token expired
    AuthFailure(String),

    // Logged in, but with the wrong role for this view
    Forbidden(String),

    // Session storage could not be read or written
    Storage(String),

    // Bad configuration (e.g. unparsable API base URL)
    Config(String),

    // Operation not accepted in the controller's current state
    InvalidState(String),
}

impl AppError {
    /// Whether the user can retry from the same view without losing input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::SubmissionFailure(_) | AppError::Validation(_) | AppError::InvalidState(_)
        )
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::LoadFailure(msg) => write!(f, "failed to load: {}", msg),
            AppError::Validation(errors) => write!(f, "invalid input: {}", errors),
            AppError::SubmissionFailure(msg) => write!(f, "submission failed: {}", msg),
            AppError::AuthFailure(msg) => write!(f, "authentication required: {}", msg),
            AppError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            AppError::Storage(msg) => write!(f, "session storage error: {}", msg),
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
            AppError::InvalidState(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.into())
    }
}
