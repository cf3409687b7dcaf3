// src/test_support.rs

//! Hand-rolled fakes for controller tests that need to control timing.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    api::ExamApi,
    controllers::exam_taking::ConfirmPrompt,
    error::AppError,
    models::{
        exam::{
            AnswerType, CreateExamRequest, CreatedExam, Exam, ExamOption, ExamSettingsPatch,
            ExamSummary, MediaRef, Question,
        },
        submission::{StudentStats, Submission, SubmissionReceipt, SubmitExamRequest, TeacherStats},
        user::{LoginRequest, LoginResponse, RegisterRequest},
    },
};

/// Exam `id` with questions `q1..=qN`, three options each, the first correct.
pub(crate) fn sample_exam(id: &str, questions: usize, time_limit: u32) -> Exam {
    Exam {
        id: id.to_string(),
        title: format!("Exam {}", id),
        description: "Sample".to_string(),
        time_limit,
        questions: (1..=questions)
            .map(|n| Question {
                id: format!("q{}", n),
                content: format!("Question {}", n),
                media: None,
                answer_type: AnswerType::Single,
                options: ["A", "B", "C"]
                    .iter()
                    .map(|label| ExamOption {
                        content: format!("{}{}", label, n),
                        is_correct: None,
                        media: None,
                    })
                    .collect(),
                points: 1,
            })
            .collect(),
        total_points: questions as u32,
        published: true,
        start_date: None,
        end_date: None,
        shuffle_questions: false,
        shuffle_answers: false,
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub(crate) struct FakeApi {
    exam: Option<Exam>,
    submit_delay: Duration,
    failing_submissions: AtomicUsize,
    failing_creates: AtomicUsize,
    submit_calls: AtomicUsize,
    submissions: Mutex<Vec<SubmitExamRequest>>,
    created: Mutex<Vec<CreateExamRequest>>,
    uploads: Mutex<Vec<String>>,
}

impl FakeApi {
    pub(crate) fn with_exam(exam: Exam) -> Self {
        Self {
            exam: Some(exam),
            ..Default::default()
        }
    }

    pub(crate) fn submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub(crate) fn fail_submissions(self, count: usize) -> Self {
        self.failing_submissions.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn fail_creates(self, count: usize) -> Self {
        self.failing_creates.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_submission(&self) -> Option<SubmitExamRequest> {
        lock(&self.submissions).last().cloned()
    }

    pub(crate) fn created(&self) -> Vec<CreateExamRequest> {
        lock(&self.created).clone()
    }

    pub(crate) fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn not_stubbed(what: &str) -> AppError {
    AppError::LoadFailure(format!("{} is not stubbed", what))
}

#[async_trait]
impl ExamApi for FakeApi {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, AppError> {
        Err(AppError::AuthFailure("not stubbed".to_string()))
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        match &self.exam {
            Some(exam) if exam.id == exam_id => Ok(exam.clone()),
            _ => Err(AppError::LoadFailure(format!("Exam {} not found", exam_id))),
        }
    }

    async fn list_teacher_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        Err(not_stubbed("list_teacher_exams"))
    }

    async fn list_available_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        Err(not_stubbed("list_available_exams"))
    }

    async fn teacher_stats(&self) -> Result<TeacherStats, AppError> {
        Err(not_stubbed("teacher_stats"))
    }

    async fn create_exam(&self, request: &CreateExamRequest) -> Result<CreatedExam, AppError> {
        if take_failure(&self.failing_creates) {
            return Err(AppError::SubmissionFailure("create rejected".to_string()));
        }
        let mut created = lock(&self.created);
        created.push(request.clone());
        Ok(CreatedExam {
            id: format!("exam-{}", created.len()),
        })
    }

    async fn update_exam_settings(
        &self,
        _exam_id: &str,
        _patch: &ExamSettingsPatch,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn upload_media(&self, path: &Path) -> Result<MediaRef, AppError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media")
            .to_string();
        lock(&self.uploads).push(name.clone());
        Ok(MediaRef {
            url: format!("/uploads/{}", name),
        })
    }

    async fn submit_answers(
        &self,
        request: &SubmitExamRequest,
    ) -> Result<SubmissionReceipt, AppError> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        if take_failure(&self.failing_submissions) {
            return Err(AppError::SubmissionFailure("Service unavailable".to_string()));
        }
        lock(&self.submissions).push(request.clone());
        Ok(SubmissionReceipt {
            id: format!("sub-{}", call),
            score: Some(request.answered_count() as f64),
        })
    }

    async fn fetch_submission(&self, _submission_id: &str) -> Result<Submission, AppError> {
        Err(not_stubbed("fetch_submission"))
    }

    async fn list_student_submissions(&self) -> Result<Vec<Submission>, AppError> {
        Err(not_stubbed("list_student_submissions"))
    }

    async fn list_exam_submissions(&self, _exam_id: &str) -> Result<Vec<Submission>, AppError> {
        Err(not_stubbed("list_exam_submissions"))
    }

    async fn student_stats(&self) -> Result<StudentStats, AppError> {
        Err(not_stubbed("student_stats"))
    }
}

/// Confirmation prompt with a fixed answer that counts how often it was shown.
pub(crate) struct ScriptedPrompt {
    answer: bool,
    calls: AtomicUsize,
}

impl ScriptedPrompt {
    pub(crate) fn answering(answer: bool) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmPrompt for ScriptedPrompt {
    async fn confirm_partial(&self, _answered: usize, _total: usize) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
