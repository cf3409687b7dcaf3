// src/api/mod.rs

//! Seam between controllers and the external exam API.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, CreatedExam, Exam, ExamSettingsPatch, ExamSummary, MediaRef},
        submission::{StudentStats, Submission, SubmissionReceipt, SubmitExamRequest, TeacherStats},
        user::{LoginRequest, LoginResponse, RegisterRequest},
    },
};

pub mod http;

pub use http::HttpApi;

/// Every call the presentation layer makes to the exam service.
///
/// Read operations fail with `LoadFailure`, writes with `SubmissionFailure`;
/// a rejected or missing token is always `AuthFailure`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExamApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AppError>;

    async fn register(&self, request: &RegisterRequest) -> Result<(), AppError>;

    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, AppError>;

    async fn list_teacher_exams(&self) -> Result<Vec<ExamSummary>, AppError>;

    async fn list_available_exams(&self) -> Result<Vec<ExamSummary>, AppError>;

    async fn teacher_stats(&self) -> Result<TeacherStats, AppError>;

    async fn create_exam(&self, request: &CreateExamRequest) -> Result<CreatedExam, AppError>;

    async fn update_exam_settings(
        &self,
        exam_id: &str,
        patch: &ExamSettingsPatch,
    ) -> Result<(), AppError>;

    async fn upload_media(&self, path: &Path) -> Result<MediaRef, AppError>;

    async fn submit_answers(
        &self,
        request: &SubmitExamRequest,
    ) -> Result<SubmissionReceipt, AppError>;

    async fn fetch_submission(&self, submission_id: &str) -> Result<Submission, AppError>;

    async fn list_student_submissions(&self) -> Result<Vec<Submission>, AppError>;

    async fn list_exam_submissions(&self, exam_id: &str) -> Result<Vec<Submission>, AppError>;

    async fn student_stats(&self) -> Result<StudentStats, AppError>;
}
