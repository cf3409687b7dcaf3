// src/api/http.rs

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    api::ExamApi,
    config::Config,
    error::AppError,
    models::{
        exam::{CreateExamRequest, CreatedExam, Exam, ExamSettingsPatch, ExamSummary, MediaRef},
        submission::{StudentStats, Submission, SubmissionReceipt, SubmitExamRequest, TeacherStats},
        user::{LoginRequest, LoginResponse, RegisterRequest},
    },
    routes,
    session::SessionContext,
};

/// How a failed call is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

impl Access {
    fn failure(self, message: String) -> AppError {
        match self {
            Access::Read => AppError::LoadFailure(message),
            Access::Write => AppError::SubmissionFailure(message),
        }
    }
}

/// `reqwest` implementation of [`ExamApi`].
///
/// The bearer token is read from the [`SessionContext`] on every request, so
/// a login or logout takes effect for the next call without rebuilding the
/// client.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: Url,
    session: Arc<SessionContext>,
}

impl HttpApi {
    pub fn new(config: &Config, session: Arc<SessionContext>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: base_url(&config.api_url)?,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path under the API base.
    pub fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Resolves a media reference (absolute or relative to the API host).
    pub fn media_url(&self, reference: &str) -> Result<Url, AppError> {
        match Url::parse(reference) {
            Ok(url) => Ok(url),
            Err(_) => self.endpoint(reference),
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AppError> {
        let builder = self.client.request(method, self.endpoint(path)?);
        Ok(match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = send(self.request(Method::GET, path)?, Access::Read).await?;
        parse_json(response, Access::Read).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = send(self.request(method, path)?.json(body), Access::Write).await?;
        parse_json(response, Access::Write).await
    }

    async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), AppError> {
        send(self.request(method, path)?.json(body), Access::Write).await?;
        Ok(())
    }
}

fn base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Sends the request and turns non-success statuses into `AppError`s.
async fn send(builder: RequestBuilder, access: Access) -> Result<Response, AppError> {
    let response = builder.send().await.map_err(|e| {
        tracing::error!("Request to exam API failed: {}", e);
        access.failure(format!("Could not reach the exam service: {}", e))
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(response).await;
    tracing::warn!("Exam API answered {}: {}", status, message);

    Err(match status {
        StatusCode::UNAUTHORIZED => AppError::AuthFailure(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        _ => access.failure(message),
    })
}

/// Best-effort extraction of the server's error text.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

async fn parse_json<T: DeserializeOwned>(response: Response, access: Access) -> Result<T, AppError> {
    response.json::<T>().await.map_err(|e| {
        tracing::error!("Unexpected response body from exam API: {}", e);
        access.failure(format!("Unexpected response from the exam service: {}", e))
    })
}

#[async_trait]
impl ExamApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError> {
        let response = send(
            self.request(Method::POST, routes::LOGIN)?.json(request),
            Access::Write,
        )
        .await?;
        parse_json(response, Access::Write).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), AppError> {
        self.send_unit(Method::POST, routes::REGISTER, request).await
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        self.get_json(&routes::exam(exam_id)?).await
    }

    async fn list_teacher_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        self.get_json(routes::TEACHER_EXAMS).await
    }

    async fn list_available_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        self.get_json(routes::AVAILABLE_EXAMS).await
    }

    async fn teacher_stats(&self) -> Result<TeacherStats, AppError> {
        self.get_json(routes::TEACHER_STATS).await
    }

    async fn create_exam(&self, request: &CreateExamRequest) -> Result<CreatedExam, AppError> {
        self.send_json(Method::POST, routes::EXAMS, request).await
    }

    async fn update_exam_settings(
        &self,
        exam_id: &str,
        patch: &ExamSettingsPatch,
    ) -> Result<(), AppError> {
        self.send_unit(Method::PATCH, &routes::exam(exam_id)?, patch)
            .await
    }

    async fn upload_media(&self, path: &Path) -> Result<MediaRef, AppError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::SubmissionFailure(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media")
            .to_string();

        let form = multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));
        let response = send(
            self.request(Method::POST, routes::MEDIA)?.multipart(form),
            Access::Write,
        )
        .await?;
        parse_json(response, Access::Write).await
    }

    async fn submit_answers(
        &self,
        request: &SubmitExamRequest,
    ) -> Result<SubmissionReceipt, AppError> {
        self.send_json(Method::POST, routes::SUBMISSIONS, request)
            .await
    }

    async fn fetch_submission(&self, submission_id: &str) -> Result<Submission, AppError> {
        self.get_json(&routes::submission(submission_id)?).await
    }

    async fn list_student_submissions(&self) -> Result<Vec<Submission>, AppError> {
        self.get_json(routes::STUDENT_SUBMISSIONS).await
    }

    async fn list_exam_submissions(&self, exam_id: &str) -> Result<Vec<Submission>, AppError> {
        self.get_json(&routes::exam_submissions(exam_id)?).await
    }

    async fn student_stats(&self) -> Result<StudentStats, AppError> {
        self.get_json(routes::STUDENT_STATS).await
    }
}
