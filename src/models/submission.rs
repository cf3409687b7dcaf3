// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One (question, selected option) pair of a submission.
/// `selected_answer` is `None` for questions left unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: String,
    pub selected_answer: Option<usize>,
    /// Set by the server once the submission is graded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// DTO for `POST /api/submissions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExamRequest {
    pub exam_id: String,
    pub answers: Vec<AnswerEntry>,
    /// Seconds between loading the exam and submitting.
    pub time_spent: u64,
}

impl SubmitExamRequest {
    pub fn answered_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.selected_answer.is_some())
            .count()
    }
}

/// What the API hands back after accepting a submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(alias = "_id", alias = "submissionId")]
    pub id: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Exam reference inside a submission; either a bare id or a populated row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExamRef {
    Id(String),
    Populated {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, rename = "totalPoints")]
        total_points: Option<u32>,
    },
}

impl ExamRef {
    pub fn id(&self) -> &str {
        match self {
            ExamRef::Id(id) => id,
            ExamRef::Populated { id, .. } => id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            ExamRef::Id(_) => None,
            ExamRef::Populated { title, .. } => title.as_deref(),
        }
    }

    pub fn total_points(&self) -> Option<u32> {
        match self {
            ExamRef::Id(_) => None,
            ExamRef::Populated { total_points, .. } => *total_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRef {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub username: String,
}

/// Durable, scored record of one attempt. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "_id")]
    pub id: String,
    pub exam: ExamRef,
    #[serde(default)]
    pub student: Option<StudentRef>,
    #[serde(default)]
    pub answers: Vec<AnswerEntry>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub time_spent: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregates for the student dashboard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentStats {
    pub completed_exams: u32,
    pub upcoming_exams: u32,
    pub average_score: f64,
    pub highest_score: f64,
}

/// Aggregates for the teacher dashboard.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherStats {
    pub total_exams: u32,
    pub total_students: u32,
    pub total_submissions: u32,
    pub average_score: f64,
}
