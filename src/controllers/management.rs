// src/controllers/management.rs

//! Teacher's view of a single exam: schedule status, score statistics,
//! CSV export and the shuffle / publish switches.

use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};

use crate::{
    api::ExamApi,
    error::AppError,
    models::{
        exam::{AnswerType, Exam, ExamSettingsPatch},
        submission::Submission,
    },
};

pub const CSV_HEADER: &str = "Student,Score,Time spent,Submitted at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    Upcoming,
    Ongoing,
    Ended,
}

impl ExamStatus {
    /// Both window bounds are inclusive. A missing bound is open-ended.
    pub fn at(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match (start, end) {
            (Some(start), _) if now < start => ExamStatus::Upcoming,
            (_, Some(end)) if now > end => ExamStatus::Ended,
            _ => ExamStatus::Ongoing,
        }
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExamStatus::Upcoming => "Upcoming",
            ExamStatus::Ongoing => "Ongoing",
            ExamStatus::Ended => "Ended",
        };
        f.write_str(label)
    }
}

/// Countdown split the way the management page shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeRemaining {
    fn from_duration(d: Duration) -> Self {
        let total = d.num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// `m:ss`
pub fn format_time_spent(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Number of submissions per score band (0-20%, 21-40%, ... 81-100%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreDistribution(pub [usize; 5]);

impl ScoreDistribution {
    pub const LABELS: [&'static str; 5] = ["0-20%", "21-40%", "41-60%", "61-80%", "81-100%"];

    fn bucket(ratio: f64) -> usize {
        match ratio {
            r if r <= 0.2 => 0,
            r if r <= 0.4 => 1,
            r if r <= 0.6 => 2,
            r if r <= 0.8 => 3,
            _ => 4,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        Self::LABELS.iter().copied().zip(self.0.iter().copied())
    }
}

/// How one question fared across all submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStats {
    pub question_id: String,
    pub content: String,
    pub answer_type: AnswerType,
    pub points: u32,
    pub correct: usize,
    pub total: usize,
}

impl QuestionStats {
    /// Percentage of submissions that got it right, one decimal; 0 when
    /// nobody has submitted.
    pub fn correct_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.correct as f64 / self.total as f64 * 1000.0).round() / 10.0
    }
}

#[derive(Debug, Clone)]
pub struct ExamManagement {
    exam: Exam,
    submissions: Vec<Submission>,
}

impl ExamManagement {
    /// Fetches the exam and its submissions; either failing is terminal.
    pub async fn load(api: &dyn ExamApi, exam_id: &str) -> Result<Self, AppError> {
        let (exam, submissions) = tokio::try_join!(
            api.fetch_exam(exam_id),
            api.list_exam_submissions(exam_id)
        )
        .map_err(|err| {
            tracing::error!("Failed to load exam {} for management: {}", exam_id, err);
            err
        })?;

        tracing::info!(
            "Loaded exam {} with {} submissions",
            exam.id,
            submissions.len()
        );
        Ok(Self { exam, submissions })
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn status(&self, now: DateTime<Utc>) -> ExamStatus {
        ExamStatus::at(self.exam.start_date, self.exam.end_date, now)
    }

    /// Time until the exam opens, or until it closes once it is running.
    /// `None` once it has ended or when the relevant bound is unset.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<TimeRemaining> {
        let target = match self.status(now) {
            ExamStatus::Upcoming => self.exam.start_date?,
            ExamStatus::Ongoing => self.exam.end_date?,
            ExamStatus::Ended => return None,
        };
        Some(TimeRemaining::from_duration(target - now))
    }

    /// Mean score rounded to two decimals; 0 without submissions.
    pub fn average_score(&self) -> f64 {
        if self.submissions.is_empty() {
            return 0.0;
        }
        let total: f64 = self.submissions.iter().map(|s| s.score).sum();
        (total / self.submissions.len() as f64 * 100.0).round() / 100.0
    }

    pub fn highest_score(&self) -> Option<f64> {
        self.submissions.iter().map(|s| s.score).reduce(f64::max)
    }

    pub fn lowest_score(&self) -> Option<f64> {
        self.submissions.iter().map(|s| s.score).reduce(f64::min)
    }

    pub fn score_distribution(&self) -> ScoreDistribution {
        let mut distribution = ScoreDistribution::default();
        if self.exam.total_points == 0 {
            return distribution;
        }
        let total = self.exam.total_points as f64;
        for submission in &self.submissions {
            distribution.0[ScoreDistribution::bucket(submission.score / total)] += 1;
        }
        distribution
    }

    /// Per-question breakdown in exam order. An answer counts as correct
    /// only when the server graded it so.
    pub fn question_stats(&self) -> Vec<QuestionStats> {
        self.exam
            .questions
            .iter()
            .map(|question| {
                let correct = self
                    .submissions
                    .iter()
                    .filter(|submission| {
                        submission
                            .answers
                            .iter()
                            .any(|a| a.question_id == question.id && a.is_correct == Some(true))
                    })
                    .count();
                QuestionStats {
                    question_id: question.id.clone(),
                    content: question.content.clone(),
                    answer_type: question.answer_type,
                    points: question.points,
                    correct,
                    total: self.submissions.len(),
                }
            })
            .collect()
    }

    /// One row per submission under [`CSV_HEADER`].
    pub fn export_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        for submission in &self.submissions {
            let student = submission
                .student
                .as_ref()
                .map(|s| s.username.as_str())
                .unwrap_or("Unknown");
            // Writing to a String cannot fail.
            let _ = write!(
                out,
                "\n{},{}/{},{},{}",
                csv_field(student),
                submission.score,
                self.exam.total_points,
                format_time_spent(submission.time_spent),
                submission.submitted_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        out
    }

    /// Suggested download name for the export.
    pub fn export_file_name(&self) -> String {
        let stem: String = self
            .exam
            .title
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_results.csv", stem)
    }

    /// Sends a settings patch and mirrors it locally once accepted.
    pub async fn update_settings(
        &mut self,
        api: &dyn ExamApi,
        patch: ExamSettingsPatch,
    ) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }
        api.update_exam_settings(&self.exam.id, &patch).await?;

        if let Some(value) = patch.shuffle_questions {
            self.exam.shuffle_questions = value;
        }
        if let Some(value) = patch.shuffle_answers {
            self.exam.shuffle_answers = value;
        }
        if let Some(value) = patch.published {
            self.exam.published = value;
        }
        tracing::info!("Updated settings of exam {}", self.exam.id);
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
