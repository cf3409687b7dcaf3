// src/controllers/dashboard.rs

use crate::{
    api::ExamApi,
    error::AppError,
    models::{
        exam::ExamSummary,
        submission::{StudentStats, Submission, TeacherStats},
    },
    routes::Navigation,
};

/// Keeps a failed panel at its default. Authentication problems still bubble
/// up so the caller can send the user back to the login screen.
fn panel<T: Default>(result: Result<T, AppError>, name: &str) -> Result<T, AppError> {
    match result {
        Ok(value) => Ok(value),
        Err(err @ (AppError::AuthFailure(_) | AppError::Forbidden(_))) => Err(err),
        Err(err) => {
            tracing::error!("Failed to load {}: {}", name, err);
            Ok(T::default())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentDashboard {
    pub available: Vec<ExamSummary>,
    pub submissions: Vec<Submission>,
    pub stats: StudentStats,
}

impl StudentDashboard {
    /// Fetches the three panels concurrently.
    pub async fn load(api: &dyn ExamApi) -> Result<Self, AppError> {
        let (available, submissions, stats) = tokio::join!(
            api.list_available_exams(),
            api.list_student_submissions(),
            api.student_stats()
        );

        Ok(Self {
            available: panel(available, "available exams")?,
            submissions: panel(submissions, "submissions")?,
            stats: panel(stats, "student stats")?,
        })
    }

    /// Whether the student already has a submission for the exam.
    pub fn has_taken(&self, exam_id: &str) -> bool {
        self.submissions.iter().any(|s| s.exam.id() == exam_id)
    }

    pub fn open_exam(&self, exam_id: &str) -> Result<Navigation, AppError> {
        if !self.available.iter().any(|e| e.id == exam_id) {
            return Err(AppError::InvalidState(format!(
                "Exam {} is not available to you",
                exam_id
            )));
        }
        if self.has_taken(exam_id) {
            return Err(AppError::InvalidState(
                "You have already submitted this exam".to_string(),
            ));
        }
        Ok(Navigation::TakeExam(exam_id.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeacherDashboard {
    pub exams: Vec<ExamSummary>,
    pub stats: TeacherStats,
}

impl TeacherDashboard {
    pub async fn load(api: &dyn ExamApi) -> Result<Self, AppError> {
        let (exams, stats) = tokio::join!(api.list_teacher_exams(), api.teacher_stats());

        Ok(Self {
            exams: panel(exams, "teacher exams")?,
            stats: panel(stats, "teacher stats")?,
        })
    }

    pub fn published_count(&self) -> usize {
        self.exams.iter().filter(|e| e.published).count()
    }
}

/// A single graded submission as shown after finishing an exam.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub submission: Submission,
}

impl ResultView {
    pub async fn load(api: &dyn ExamApi, submission_id: &str) -> Result<Self, AppError> {
        let submission = api.fetch_submission(submission_id).await?;
        Ok(Self { submission })
    }

    pub fn exam_title(&self) -> &str {
        self.submission.exam.title().unwrap_or("Exam")
    }

    /// Score as a percentage of the exam total, when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        match self.submission.exam.total_points() {
            Some(total) if total > 0 => Some(self.submission.score / total as f64 * 100.0),
            _ => None,
        }
    }
}
