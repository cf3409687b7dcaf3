// src/controllers/exam_taking.rs

//! Timed question/answer/submit flow for a single exam attempt.
//!
//! [`ExamAttempt`] is the synchronous state machine; [`ExamSession`] drives it
//! with network calls and the one-second countdown. The attempt sits behind a
//! `std::sync::Mutex` that is never held across an `.await`: in-flight flags
//! are checked and claimed under the lock, the network call happens after it
//! is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{
    api::ExamApi,
    config::COUNTDOWN_TICK,
    error::{AppError, FieldErrors},
    models::{
        exam::Exam,
        submission::{AnswerEntry, SubmissionReceipt, SubmitExamRequest},
    },
    routes::Navigation,
    utils::shuffle::{PresentedQuestion, present},
};

#[derive(Debug, Clone, PartialEq)]
pub enum TakingState {
    Loading,
    InProgress,
    Submitting,
    Done(SubmissionReceipt),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// The student pressed submit.
    Manual,
    /// The countdown reached zero.
    TimerExpired,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    /// The student declined to submit a partial attempt.
    Declined,
    /// Not accepted in the current state, e.g. a submission is already in flight.
    Ignored,
}

/// Result of one countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running(u64),
    Expired,
    Stopped,
}

/// Asks the student whether an incomplete attempt should be sent anyway.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    async fn confirm_partial(&self, answered: usize, total: usize) -> bool;
}

/// State of one attempt. Pure: no I/O, no clock reads except the timestamps
/// handed in by the caller.
#[derive(Debug)]
pub struct ExamAttempt {
    state: TakingState,
    exam: Option<Exam>,
    questions: Vec<PresentedQuestion>,
    current: usize,
    // question id -> displayed option index
    answers: HashMap<String, usize>,
    remaining_secs: u64,
    started_at: Option<Instant>,
    load_in_flight: bool,
    submit_in_flight: bool,
    last_error: Option<String>,
}

impl Default for ExamAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl ExamAttempt {
    pub fn new() -> Self {
        Self {
            state: TakingState::Loading,
            exam: None,
            questions: Vec::new(),
            current: 0,
            answers: HashMap::new(),
            remaining_secs: 0,
            started_at: None,
            load_in_flight: false,
            submit_in_flight: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> &TakingState {
        &self.state
    }

    pub fn exam(&self) -> Option<&Exam> {
        self.exam.as_ref()
    }

    pub fn questions(&self) -> &[PresentedQuestion] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&PresentedQuestion> {
        self.questions.get(self.current)
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// The clock ran out while the attempt is still open, e.g. after a
    /// failed automatic submission.
    pub fn time_up(&self) -> bool {
        self.state == TakingState::InProgress && self.remaining_secs == 0
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Displayed option index chosen for a question.
    pub fn answer_for(&self, question_id: &str) -> Option<usize> {
        self.answers.get(question_id).copied()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Claims the load flag. Only an attempt that has not loaded yet may load.
    pub fn begin_load(&mut self) -> bool {
        if self.state != TakingState::Loading || self.load_in_flight {
            return false;
        }
        self.load_in_flight = true;
        true
    }

    /// Applies the fetch result: seeds the countdown and an empty answer map,
    /// or moves to `Error`.
    pub fn finish_load<R: Rng + ?Sized>(
        &mut self,
        result: Result<Exam, AppError>,
        now: Instant,
        rng: &mut R,
    ) -> Result<(), AppError> {
        self.load_in_flight = false;
        match result {
            Ok(exam) => {
                self.questions = present(
                    &exam.questions,
                    exam.shuffle_questions,
                    exam.shuffle_answers,
                    rng,
                );
                self.remaining_secs = exam.time_limit_secs();
                self.answers.clear();
                self.current = 0;
                self.started_at = Some(now);
                self.exam = Some(exam);
                self.state = TakingState::InProgress;
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    AppError::LoadFailure(msg) => msg.clone(),
                    other => other.to_string(),
                };
                self.state = TakingState::Error(message.clone());
                self.last_error = Some(message);
                Err(err)
            }
        }
    }

    /// Records the chosen option for a question, replacing any earlier choice.
    pub fn select_answer(&mut self, question_id: &str, option_index: usize) -> Result<(), AppError> {
        if self.state != TakingState::InProgress {
            return Err(AppError::InvalidState(
                "Answers can only be changed while the exam is in progress".to_string(),
            ));
        }
        if self.time_up() {
            return Err(AppError::InvalidState(
                "Time is up, answers can no longer be changed".to_string(),
            ));
        }

        let question = self
            .questions
            .iter()
            .find(|q| q.question.id == question_id)
            .ok_or_else(|| {
                let mut errors = FieldErrors::new();
                errors.add("question", format!("Unknown question '{}'", question_id));
                AppError::Validation(errors)
            })?;

        if option_index >= question.question.options.len() {
            let mut errors = FieldErrors::new();
            errors.add("option", format!("Option {} does not exist", option_index + 1));
            return Err(AppError::Validation(errors));
        }

        self.answers.insert(question_id.to_string(), option_index);
        Ok(())
    }

    /// Answers the question currently shown.
    pub fn select_current(&mut self, option_index: usize) -> Result<(), AppError> {
        let question_id = self
            .current_question()
            .map(|q| q.question.id.clone())
            .ok_or_else(|| AppError::InvalidState("No question to answer".to_string()))?;
        self.select_answer(&question_id, option_index)
    }

    /// Moves to `index`, clamped to the question range. Returns the new index.
    pub fn go_to_question(&mut self, index: usize) -> usize {
        let last = self.questions.len().saturating_sub(1);
        self.current = index.min(last);
        self.current
    }

    pub fn next_question(&mut self) -> usize {
        self.go_to_question(self.current.saturating_add(1))
    }

    pub fn previous_question(&mut self) -> usize {
        self.go_to_question(self.current.saturating_sub(1))
    }

    /// Whether a submission would currently be accepted.
    pub fn accepts_submission(&self) -> bool {
        self.state == TakingState::InProgress && !self.submit_in_flight
    }

    /// Claims the submit flag and builds the payload. `None` when a
    /// submission is already in flight or the attempt is not in progress.
    pub fn claim_submission(&mut self, now: Instant) -> Option<SubmitExamRequest> {
        if !self.accepts_submission() {
            return None;
        }
        let exam_id = self.exam.as_ref()?.id.clone();

        self.submit_in_flight = true;
        self.state = TakingState::Submitting;
        self.last_error = None;

        let time_spent = self
            .started_at
            .map(|started| now.saturating_duration_since(started).as_secs())
            .unwrap_or(0);

        Some(SubmitExamRequest {
            exam_id,
            answers: self.answer_entries(),
            time_spent,
        })
    }

    /// One entry per question in displayed order, with the selected option
    /// mapped back to its original position.
    pub fn answer_entries(&self) -> Vec<AnswerEntry> {
        self.questions
            .iter()
            .map(|q| AnswerEntry {
                question_id: q.question.id.clone(),
                selected_answer: self
                    .answers
                    .get(&q.question.id)
                    .and_then(|shown| q.original_index(*shown)),
                is_correct: None,
            })
            .collect()
    }

    /// Applies the API's answer to a claimed submission.
    pub fn finish_submission(&mut self, result: &Result<SubmissionReceipt, AppError>) {
        self.submit_in_flight = false;
        match result {
            Ok(receipt) => {
                self.state = TakingState::Done(receipt.clone());
            }
            Err(err) => {
                self.state = TakingState::InProgress;
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        match self.state {
            TakingState::InProgress | TakingState::Submitting => {}
            _ => return Tick::Stopped,
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            Tick::Expired
        } else {
            Tick::Running(self.remaining_secs)
        }
    }

    pub fn navigation(&self) -> Option<Navigation> {
        match &self.state {
            TakingState::Done(receipt) => Some(Navigation::Result(receipt.id.clone())),
            _ => None,
        }
    }
}

struct Shared {
    api: Arc<dyn ExamApi>,
    prompt: Arc<dyn ConfirmPrompt>,
    attempt: Mutex<ExamAttempt>,
}

impl Shared {
    fn attempt(&self) -> MutexGuard<'_, ExamAttempt> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn submit(&self, trigger: SubmitTrigger) -> Result<SubmitOutcome, AppError> {
        if trigger == SubmitTrigger::Manual {
            let (accepts, time_up, answered, total) = {
                let attempt = self.attempt();
                (
                    attempt.accepts_submission(),
                    attempt.time_up(),
                    attempt.answered_count(),
                    attempt.question_count(),
                )
            };
            if !accepts {
                return Ok(SubmitOutcome::Ignored);
            }
            // Once time is up the answers are final, nothing left to confirm.
            if answered < total && !time_up && !self.prompt.confirm_partial(answered, total).await {
                tracing::info!("Partial submission declined ({}/{} answered)", answered, total);
                return Ok(SubmitOutcome::Declined);
            }
        }

        // Re-checked under the lock: the countdown may have fired while the
        // prompt was open.
        let claimed = {
            let mut attempt = self.attempt();
            attempt.claim_submission(Instant::now())
        };
        let Some(request) = claimed else {
            return Ok(SubmitOutcome::Ignored);
        };

        tracing::info!(
            "Submitting exam {} ({:?}, {}/{} answered)",
            request.exam_id,
            trigger,
            request.answered_count(),
            request.answers.len()
        );

        let result = self.api.submit_answers(&request).await;
        {
            let mut attempt = self.attempt();
            attempt.finish_submission(&result);
        }

        match result {
            Ok(receipt) => {
                tracing::info!("Exam {} submitted as {}", request.exam_id, receipt.id);
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(err) => {
                tracing::error!("Submission of exam {} failed: {}", request.exam_id, err);
                Err(err)
            }
        }
    }
}

/// Drives an [`ExamAttempt`] against the API. Dropping the session cancels
/// the countdown.
pub struct ExamSession {
    shared: Arc<Shared>,
    tick_interval: Duration,
    countdown: Mutex<Option<JoinHandle<()>>>,
}

impl ExamSession {
    pub fn new(api: Arc<dyn ExamApi>, prompt: Arc<dyn ConfirmPrompt>) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                prompt,
                attempt: Mutex::new(ExamAttempt::new()),
            }),
            tick_interval: COUNTDOWN_TICK,
            countdown: Mutex::new(None),
        }
    }

    /// Overrides the countdown period (one "second" of exam time).
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Runs `f` against the current attempt state.
    pub fn inspect<T>(&self, f: impl FnOnce(&ExamAttempt) -> T) -> T {
        f(&self.shared.attempt())
    }

    pub fn state(&self) -> TakingState {
        self.shared.attempt().state().clone()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.shared.attempt().remaining_secs()
    }

    pub fn navigation(&self) -> Option<Navigation> {
        self.shared.attempt().navigation()
    }

    /// Fetches the exam and starts the countdown.
    pub async fn load_exam(&self, exam_id: &str) -> Result<(), AppError> {
        let claimed = self.shared.attempt().begin_load();
        if !claimed {
            return Err(AppError::InvalidState(
                "This session has already loaded an exam".to_string(),
            ));
        }

        tracing::info!("Loading exam {}", exam_id);
        let result = self.shared.api.fetch_exam(exam_id).await;

        let loaded = {
            let mut attempt = self.shared.attempt();
            let mut rng = rand::thread_rng();
            attempt.finish_load(result, Instant::now(), &mut rng)
        };

        match loaded {
            Ok(()) => {
                tracing::info!(
                    "Exam {} loaded, {}s on the clock",
                    exam_id,
                    self.remaining_secs()
                );
                self.start_countdown();
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to load exam {}: {}", exam_id, err);
                Err(err)
            }
        }
    }

    pub fn select_answer(&self, question_id: &str, option_index: usize) -> Result<(), AppError> {
        self.shared.attempt().select_answer(question_id, option_index)
    }

    pub fn select_current(&self, option_index: usize) -> Result<(), AppError> {
        self.shared.attempt().select_current(option_index)
    }

    pub fn go_to_question(&self, index: usize) -> usize {
        self.shared.attempt().go_to_question(index)
    }

    pub fn next_question(&self) -> usize {
        self.shared.attempt().next_question()
    }

    pub fn previous_question(&self) -> usize {
        self.shared.attempt().previous_question()
    }

    /// Manual submit. Asks for confirmation when answers are missing; a call
    /// while another submission is in flight is a no-op.
    pub async fn submit(&self) -> Result<SubmitOutcome, AppError> {
        self.shared.submit(SubmitTrigger::Manual).await
    }

    fn start_countdown(&self) {
        let shared = Arc::clone(&self.shared);
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let tick = shared.attempt().tick();
                match tick {
                    Tick::Running(_) => continue,
                    Tick::Stopped => break,
                    Tick::Expired => {
                        tracing::info!("Time is up, submitting");
                        if let Err(e) = shared.submit(SubmitTrigger::TimerExpired).await {
                            tracing::warn!("Automatic submission failed: {}", e);
                        }
                        break;
                    }
                }
            }
        });

        let mut slot = self.countdown.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for ExamSession {
    fn drop(&mut self) {
        let slot = self.countdown.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeApi, ScriptedPrompt, sample_exam};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn loaded(questions: usize) -> ExamAttempt {
        let mut attempt = ExamAttempt::new();
        assert!(attempt.begin_load());
        attempt
            .finish_load(
                Ok(sample_exam("e1", questions, 1)),
                Instant::now(),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        attempt
    }

    fn receipt(id: &str) -> SubmissionReceipt {
        SubmissionReceipt {
            id: id.to_string(),
            score: Some(1.0),
        }
    }

    #[test]
    fn load_seeds_countdown_in_seconds() {
        let attempt = loaded(3);
        assert_eq!(attempt.state(), &TakingState::InProgress);
        assert_eq!(attempt.remaining_secs(), 60);
        assert_eq!(attempt.answered_count(), 0);
    }

    #[test]
    fn load_failure_is_terminal() {
        let mut attempt = ExamAttempt::new();
        assert!(attempt.begin_load());
        let result = attempt.finish_load(
            Err(AppError::LoadFailure("Exam not found".to_string())),
            Instant::now(),
            &mut StdRng::seed_from_u64(1),
        );

        assert!(result.is_err());
        assert_eq!(attempt.state(), &TakingState::Error("Exam not found".to_string()));
        assert!(!attempt.begin_load());
    }

    #[test]
    fn navigation_stays_within_bounds() {
        let mut attempt = loaded(3);
        let moves: [i8; 12] = [-1, -1, 1, 1, 1, 1, 1, -1, 1, 1, -1, -1];
        for step in moves {
            let index = if step > 0 {
                attempt.next_question()
            } else {
                attempt.previous_question()
            };
            assert!(index <= 2);
        }
        assert_eq!(attempt.go_to_question(usize::MAX), 2);
        assert_eq!(attempt.go_to_question(0), 0);
    }

    #[test]
    fn navigation_on_empty_exam_stays_at_zero() {
        let mut attempt = loaded(0);
        assert_eq!(attempt.next_question(), 0);
        assert_eq!(attempt.go_to_question(10), 0);
        assert!(attempt.current_question().is_none());
    }

    #[test]
    fn selecting_overwrites_previous_choice() {
        let mut attempt = loaded(2);
        attempt.select_answer("q1", 0).unwrap();
        attempt.select_answer("q1", 2).unwrap();
        assert_eq!(attempt.answer_for("q1"), Some(2));
        assert_eq!(attempt.answered_count(), 1);
    }

    #[test]
    fn answers_only_reference_known_questions_and_options() {
        let mut attempt = loaded(2);
        assert!(matches!(
            attempt.select_answer("nope", 0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            attempt.select_answer("q1", 99),
            Err(AppError::Validation(_))
        ));
        assert_eq!(attempt.answered_count(), 0);
    }

    #[test]
    fn selecting_outside_in_progress_is_rejected() {
        let mut attempt = ExamAttempt::new();
        assert!(matches!(
            attempt.select_answer("q1", 0),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn second_claim_while_in_flight_is_refused() {
        let mut attempt = loaded(2);
        let now = Instant::now();
        assert!(attempt.claim_submission(now).is_some());
        assert!(attempt.claim_submission(now).is_none());
        assert_eq!(attempt.state(), &TakingState::Submitting);
    }

    #[test]
    fn failed_submission_keeps_answers_and_allows_retry() {
        let mut attempt = loaded(2);
        attempt.select_answer("q2", 1).unwrap();
        attempt.claim_submission(Instant::now()).unwrap();

        attempt.finish_submission(&Err(AppError::SubmissionFailure("503".to_string())));

        assert_eq!(attempt.state(), &TakingState::InProgress);
        assert_eq!(attempt.answer_for("q2"), Some(1));
        assert!(attempt.last_error().is_some());
        assert!(attempt.claim_submission(Instant::now()).is_some());
    }

    #[test]
    fn payload_lists_every_question() {
        let mut attempt = loaded(3);
        attempt.select_answer("q1", 2).unwrap();
        let request = attempt.claim_submission(Instant::now()).unwrap();

        assert_eq!(request.exam_id, "e1");
        assert_eq!(request.answers.len(), 3);
        assert_eq!(request.answered_count(), 1);
        assert_eq!(request.answers[0].selected_answer, Some(2));
        assert_eq!(request.answers[1].selected_answer, None);
    }

    #[test]
    fn shuffled_answers_are_mapped_back() {
        let mut exam = sample_exam("e1", 1, 1);
        exam.shuffle_answers = true;
        let mut attempt = ExamAttempt::new();
        attempt.begin_load();
        attempt
            .finish_load(Ok(exam.clone()), Instant::now(), &mut StdRng::seed_from_u64(5))
            .unwrap();

        let shown = &attempt.questions()[0];
        let picked = shown.question.options[0].content.clone();
        attempt.select_answer("q1", 0).unwrap();

        let request = attempt.claim_submission(Instant::now()).unwrap();
        let original = request.answers[0].selected_answer.unwrap();
        assert_eq!(exam.questions[0].options[original].content, picked);
    }

    #[test]
    fn countdown_expires_once_and_stops_when_done() {
        let mut attempt = loaded(1);
        for _ in 0..59 {
            assert!(matches!(attempt.tick(), Tick::Running(_)));
        }
        assert_eq!(attempt.tick(), Tick::Expired);

        attempt.claim_submission(Instant::now()).unwrap();
        attempt.finish_submission(&Ok(receipt("s1")));
        assert_eq!(attempt.tick(), Tick::Stopped);
        assert_eq!(attempt.navigation(), Some(Navigation::Result("s1".to_string())));
    }

    #[test]
    fn answers_lock_when_time_runs_out_mid_submission() {
        let mut attempt = loaded(2);
        attempt.select_answer("q1", 0).unwrap();
        attempt.claim_submission(Instant::now()).unwrap();
        for _ in 0..59 {
            attempt.tick();
        }
        assert_eq!(attempt.tick(), Tick::Expired);

        attempt.finish_submission(&Err(AppError::SubmissionFailure("503".to_string())));

        assert!(attempt.time_up());
        assert!(matches!(
            attempt.select_answer("q2", 1),
            Err(AppError::InvalidState(_))
        ));
        assert_eq!(attempt.answer_for("q2"), None);
        assert!(attempt.claim_submission(Instant::now()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_submits_partial_attempt_without_prompt() {
        let api = Arc::new(FakeApi::with_exam(sample_exam("e1", 3, 1)));
        let prompt = Arc::new(ScriptedPrompt::answering(false));
        let session = ExamSession::new(api.clone(), prompt.clone());

        session.load_exam("e1").await.unwrap();
        session.select_answer("q1", 0).unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(api.submit_calls(), 1);
        assert_eq!(prompt.calls(), 0);
        let payload = api.last_submission().unwrap();
        assert_eq!(payload.answers.len(), 3);
        assert_eq!(payload.answered_count(), 1);
        assert!(payload.answers[1].selected_answer.is_none());
        assert!(payload.answers[2].selected_answer.is_none());
        assert!(matches!(session.state(), TakingState::Done(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn double_click_posts_once() {
        let api = Arc::new(
            FakeApi::with_exam(sample_exam("e1", 2, 5)).submit_delay(Duration::from_secs(2)),
        );
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = ExamSession::new(api.clone(), prompt);
        session.load_exam("e1").await.unwrap();
        session.select_answer("q1", 0).unwrap();
        session.select_answer("q2", 0).unwrap();

        let (first, second) = tokio::join!(session.submit(), session.submit());

        assert!(matches!(first.unwrap(), SubmitOutcome::Submitted(_)));
        assert_eq!(second.unwrap(), SubmitOutcome::Ignored);
        assert_eq!(api.submit_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_click_racing_timer_expiry_posts_once() {
        let api = Arc::new(
            FakeApi::with_exam(sample_exam("e1", 2, 1)).submit_delay(Duration::from_secs(5)),
        );
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = Arc::new(ExamSession::new(api.clone(), prompt));
        session.load_exam("e1").await.unwrap();

        tokio::time::sleep(Duration::from_millis(59_500)).await;
        let clicker = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit().await })
        };

        tokio::time::sleep(Duration::from_secs(10)).await;
        let outcome = clicker.await.unwrap().unwrap();

        assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
        assert_eq!(api.submit_calls(), 1);
        assert!(matches!(session.state(), TakingState::Done(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn declined_partial_submission_stays_in_progress() {
        let api = Arc::new(FakeApi::with_exam(sample_exam("e1", 2, 5)));
        let prompt = Arc::new(ScriptedPrompt::answering(false));
        let session = ExamSession::new(api.clone(), prompt.clone());
        session.load_exam("e1").await.unwrap();
        session.select_answer("q1", 1).unwrap();

        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Declined);
        assert_eq!(prompt.calls(), 1);
        assert_eq!(api.submit_calls(), 0);
        assert_eq!(session.state(), TakingState::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_can_be_retried() {
        let api = Arc::new(FakeApi::with_exam(sample_exam("e1", 1, 5)).fail_submissions(1));
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = ExamSession::new(api.clone(), prompt);
        session.load_exam("e1").await.unwrap();
        session.select_answer("q1", 1).unwrap();

        let first = session.submit().await;
        assert!(matches!(first, Err(AppError::SubmissionFailure(_))));
        assert_eq!(session.state(), TakingState::InProgress);
        assert_eq!(session.inspect(|a| a.answer_for("q1")), Some(1));

        let second = session.submit().await.unwrap();
        assert!(matches!(second, SubmitOutcome::Submitted(_)));
        assert_eq!(api.submit_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_failing_across_expiry_is_retried_once() {
        let api = Arc::new(
            FakeApi::with_exam(sample_exam("e1", 2, 1))
                .submit_delay(Duration::from_secs(5))
                .fail_submissions(1),
        );
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = Arc::new(ExamSession::new(api.clone(), prompt.clone()));
        session.load_exam("e1").await.unwrap();
        session.select_answer("q1", 2).unwrap();

        tokio::time::sleep(Duration::from_secs(58)).await;
        let clicker = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.submit().await })
        };
        // expiry lands while the manual request is still in flight
        tokio::time::sleep(Duration::from_secs(10)).await;
        let first = clicker.await.unwrap();

        assert!(matches!(first, Err(AppError::SubmissionFailure(_))));
        assert_eq!(api.submit_calls(), 1);
        assert_eq!(session.state(), TakingState::InProgress);
        assert_eq!(session.remaining_secs(), 0);
        assert!(matches!(
            session.select_answer("q2", 0),
            Err(AppError::InvalidState(_))
        ));

        // no countdown is left to submit on its own
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(api.submit_calls(), 1);

        let retry = session.submit().await.unwrap();
        assert!(matches!(retry, SubmitOutcome::Submitted(_)));
        assert_eq!(api.submit_calls(), 2);
        assert_eq!(prompt.calls(), 1);
        let payload = api.last_submission().unwrap();
        assert_eq!(payload.answers[0].selected_answer, Some(2));
        assert_eq!(payload.answers[1].selected_answer, None);
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_moves_to_error() {
        let api = Arc::new(FakeApi::default());
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = ExamSession::new(api, prompt);

        let result = session.load_exam("missing").await;

        assert!(matches!(result, Err(AppError::LoadFailure(_))));
        assert!(matches!(session.state(), TakingState::Error(_)));
        assert!(session.load_exam("missing").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_stops_the_countdown() {
        let api = Arc::new(FakeApi::with_exam(sample_exam("e1", 1, 1)));
        let prompt = Arc::new(ScriptedPrompt::answering(true));
        let session = ExamSession::new(api.clone(), prompt);
        session.load_exam("e1").await.unwrap();

        drop(session);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(api.submit_calls(), 0);
    }
}
