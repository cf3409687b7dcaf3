// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a question accepts one or several correct options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    #[default]
    Single,
    Multiple,
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamOption {
    pub content: String,

    /// Only present on the authoring side; students never receive it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(alias = "_id")]
    pub id: String,

    pub content: String,

    /// Reference to an image or audio file, relative to the API host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    #[serde(default)]
    pub answer_type: AnswerType,

    /// Ordered options; the position is what a student selects.
    #[serde(alias = "answers")]
    pub options: Vec<ExamOption>,

    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

/// Full exam definition as returned by `GET /api/exams/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    #[serde(alias = "_id")]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Minutes allowed for one attempt.
    #[serde(default)]
    pub time_limit: u32,

    #[serde(default)]
    pub questions: Vec<Question>,

    #[serde(default)]
    pub total_points: u32,

    #[serde(default, alias = "isPublished")]
    pub published: bool,

    #[serde(default, alias = "startTime")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, alias = "endTime")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub shuffle_questions: bool,

    #[serde(default)]
    pub shuffle_answers: bool,
}

impl Exam {
    /// Countdown seed for an attempt.
    pub fn time_limit_secs(&self) -> u64 {
        u64::from(self.time_limit) * 60
    }

    pub fn has_question(&self, question_id: &str) -> bool {
        self.questions.iter().any(|q| q.id == question_id)
    }
}

/// Lightweight exam row for dashboard lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub time_limit: u32,
    #[serde(default)]
    pub question_count: Option<u32>,
    #[serde(default, alias = "isPublished")]
    pub published: bool,
    #[serde(default, alias = "startTime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, alias = "endTime")]
    pub end_date: Option<DateTime<Utc>>,
}

/// DTO for one option of a newly authored question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOption {
    pub content: String,
    pub is_correct: bool,
}

/// DTO for one newly authored question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    pub answer_type: AnswerType,
    pub options: Vec<NewOption>,
    pub points: u32,
}

/// DTO for `POST /api/exams`: the whole exam in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    pub title: String,
    pub description: String,
    pub time_limit: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
    pub total_points: u32,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedExam {
    #[serde(alias = "_id")]
    pub id: String,
}

/// DTO for `PATCH /api/exams/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_questions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_answers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl ExamSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.shuffle_questions.is_none() && self.shuffle_answers.is_none() && self.published.is_none()
    }
}

/// Reference returned after uploading a media file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaRef {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_accepts_mongo_style_ids_and_answer_arrays() {
        let json = serde_json::json!({
            "_id": "e1",
            "title": "Midterm",
            "timeLimit": 30,
            "shuffleAnswers": true,
            "questions": [{
                "_id": "q1",
                "content": "2 + 2?",
                "answers": [{"content": "3"}, {"content": "4"}]
            }]
        });

        let exam: Exam = serde_json::from_value(json).unwrap();
        assert_eq!(exam.id, "e1");
        assert_eq!(exam.time_limit_secs(), 1800);
        assert!(exam.shuffle_answers);
        assert_eq!(exam.questions[0].options.len(), 2);
        assert_eq!(exam.questions[0].options[1].is_correct, None);
        assert_eq!(exam.questions[0].points, 1);
        assert!(exam.has_question("q1"));
    }

    #[test]
    fn settings_patch_skips_absent_fields() {
        let patch = ExamSettingsPatch {
            shuffle_questions: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"shuffleQuestions": true}));
        assert!(ExamSettingsPatch::default().is_empty());
    }
}
