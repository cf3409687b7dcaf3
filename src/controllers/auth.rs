// src/controllers/auth.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    api::ExamApi,
    error::{AppError, FieldErrors},
    models::user::{Identity, LoginRequest, RegisterForm},
    routes::Navigation,
    session::SessionContext,
};

/// Login, registration and logout against the exam API.
pub struct AuthService {
    api: Arc<dyn ExamApi>,
    session: Arc<SessionContext>,
}

impl AuthService {
    pub fn new(api: Arc<dyn ExamApi>, session: Arc<SessionContext>) -> Self {
        Self { api, session }
    }

    /// Authenticates and stores the session.
    ///
    /// Returns the dashboard matching the role the API reported.
    pub async fn login(&self, username: &str, password: &str) -> Result<Navigation, AppError> {
        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        if let Err(validation_errors) = request.validate() {
            return Err(AppError::Validation(FieldErrors::from(validation_errors)));
        }

        let response = self.api.login(&request).await.map_err(|e| match e {
            // Bad credentials are reported as 401 or 400 depending on the server
            AppError::SubmissionFailure(message) | AppError::AuthFailure(message) => {
                tracing::warn!("Login rejected for {}: {}", request.username, message);
                AppError::AuthFailure(message)
            }
            other => other,
        })?;

        let identity = Identity {
            role: response.role,
            username: response.username.or(Some(request.username)),
        };
        self.session.establish(response.token, identity)?;

        tracing::info!("Logged in as {}", response.role);
        Ok(Navigation::dashboard_for(response.role))
    }

    /// Creates an account. The user still has to log in afterwards.
    pub async fn register(&self, form: RegisterForm) -> Result<Navigation, AppError> {
        let request = form.into_request()?;
        self.api.register(&request).await?;

        tracing::info!("Registered new {} account", request.role);
        Ok(Navigation::Login)
    }

    pub fn logout(&self) -> Result<Navigation, AppError> {
        self.session.clear()?;
        tracing::info!("Logged out");
        Ok(Navigation::Home)
    }

    /// Checks the session against the role a view requires.
    pub fn guard(&self, target: &Navigation) -> Result<(), AppError> {
        match target.required_role() {
            Some(role) => self.session.require_role(role).map(|_| ()),
            None => Ok(()),
        }
    }
}
