// src/controllers/authoring.rs

//! Three-step exam authoring wizard: basic info, question list, review.
//!
//! Each position of the question list is a tagged slot. Editing a slot
//! keeps its committed version in place while a working copy sits in the
//! draft, so abandoning the edit never loses the question and committing
//! writes it back to the same position.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};

use crate::{
    api::ExamApi,
    error::{AppError, FieldErrors},
    media::{MediaAttachment, PreviewRegistry},
    models::exam::{AnswerType, CreateExamRequest, CreatedExam, NewOption, NewQuestion},
    routes::Navigation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    BasicInfo,
    Questions,
    Review,
}

impl WizardStep {
    fn next(self) -> Option<Self> {
        match self {
            WizardStep::BasicInfo => Some(WizardStep::Questions),
            WizardStep::Questions => Some(WizardStep::Review),
            WizardStep::Review => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            WizardStep::BasicInfo => None,
            WizardStep::Questions => Some(WizardStep::BasicInfo),
            WizardStep::Review => Some(WizardStep::Questions),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Exam metadata entered on the first step.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct BasicInfo {
    #[validate(custom(function = not_blank), length(max = 200))]
    pub title: String,
    #[validate(custom(function = not_blank), length(max = 2000))]
    pub description: String,
    /// Minutes.
    #[validate(range(min = 1, max = 600, message = "Time limit must be between 1 and 600 minutes."))]
    pub time_limit: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub shuffle_questions: bool,
    pub shuffle_answers: bool,
}

impl BasicInfo {
    /// All field-level problems at once.
    pub fn check(&self) -> FieldErrors {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if self.start_date.is_none() {
            errors.add("start_date", "Start date is required.");
        }
        match (self.start_date, self.end_date) {
            (_, None) => errors.add("end_date", "End date is required."),
            (Some(start), Some(end)) if start >= end => {
                errors.add("end_date", "End date must be after the start date.")
            }
            _ => {}
        }
        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionDraft {
    pub content: String,
    pub is_correct: bool,
}

impl OptionDraft {
    pub fn new(content: impl Into<String>, is_correct: bool) -> Self {
        Self {
            content: content.into(),
            is_correct,
        }
    }
}

/// The question currently being authored.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub content: String,
    answer_type: AnswerType,
    options: Vec<OptionDraft>,
    pub points: u32,
    media: Option<Arc<MediaAttachment>>,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            content: String::new(),
            answer_type: AnswerType::Single,
            options: vec![OptionDraft::default(), OptionDraft::default()],
            points: 1,
            media: None,
        }
    }
}

impl QuestionDraft {
    pub fn answer_type(&self) -> AnswerType {
        self.answer_type
    }

    pub fn options(&self) -> &[OptionDraft] {
        &self.options
    }

    pub fn media(&self) -> Option<&MediaAttachment> {
        self.media.as_deref()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Switching to single-answer keeps only the first correct option.
    pub fn set_answer_type(&mut self, answer_type: AnswerType) {
        self.answer_type = answer_type;
        if answer_type == AnswerType::Single {
            let mut seen = false;
            for option in &mut self.options {
                if option.is_correct {
                    option.is_correct = !seen;
                    seen = true;
                }
            }
        }
    }

    pub fn add_option(&mut self) -> usize {
        self.options.push(OptionDraft::default());
        self.options.len() - 1
    }

    pub fn remove_option(&mut self, index: usize) -> Result<(), AppError> {
        self.option_at(index)?;
        if self.options.len() <= 1 {
            let mut errors = FieldErrors::new();
            errors.add("options", "At least one option is required.");
            return Err(AppError::Validation(errors));
        }
        self.options.remove(index);
        Ok(())
    }

    pub fn set_option_text(&mut self, index: usize, content: impl Into<String>) -> Result<(), AppError> {
        self.option_at(index)?;
        self.options[index].content = content.into();
        Ok(())
    }

    /// Marks an option (in)correct. For single-answer questions marking one
    /// correct clears every other option on the spot.
    pub fn set_option_correct(&mut self, index: usize, is_correct: bool) -> Result<(), AppError> {
        self.option_at(index)?;
        if is_correct && self.answer_type == AnswerType::Single {
            for option in &mut self.options {
                option.is_correct = false;
            }
        }
        self.options[index].is_correct = is_correct;
        Ok(())
    }

    /// Replaces the attachment; the superseded preview is released.
    pub fn set_media(&mut self, media: Option<MediaAttachment>) {
        self.media = media.map(Arc::new);
    }

    fn option_at(&self, index: usize) -> Result<&OptionDraft, AppError> {
        self.options.get(index).ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.add("options", format!("Option {} does not exist.", index + 1));
            AppError::Validation(errors)
        })
    }

    fn filled_options(&self) -> impl Iterator<Item = &OptionDraft> {
        self.options.iter().filter(|o| !o.content.trim().is_empty())
    }

    pub fn check(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.content.trim().is_empty() {
            errors.add("content", "Question text is required.");
        }
        if self.filled_options().count() < 2 {
            errors.add("options", "At least two non-empty options are required.");
        }
        if !self.filled_options().any(|o| o.is_correct) {
            errors.add("correct", "Mark at least one option as correct.");
        }
        if self.points == 0 {
            errors.add("points", "A question must be worth at least one point.");
        }
        errors
    }

    /// The version stored in the list: blank options dropped.
    fn committed(&self) -> QuestionDraft {
        let mut committed = self.clone();
        committed.options.retain(|o| !o.content.trim().is_empty());
        committed
    }

    fn is_pristine(&self) -> bool {
        *self == QuestionDraft::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum QuestionSlot {
    Committed(QuestionDraft),
    /// Being edited in the draft; holds the last committed version.
    Editing(QuestionDraft),
}

impl QuestionSlot {
    fn question(&self) -> &QuestionDraft {
        match self {
            QuestionSlot::Committed(q) | QuestionSlot::Editing(q) => q,
        }
    }

    fn is_editing(&self) -> bool {
        matches!(self, QuestionSlot::Editing(_))
    }
}

/// Drives the wizard. Owned by a single view; `submit` takes `&mut self`, so
/// two submissions of the same draft can never overlap.
#[derive(Debug)]
pub struct ExamWizard {
    step: WizardStep,
    pub basic: BasicInfo,
    slots: Vec<QuestionSlot>,
    draft: QuestionDraft,
    errors: FieldErrors,
    previews: Arc<PreviewRegistry>,
}

impl ExamWizard {
    pub fn new(previews: Arc<PreviewRegistry>) -> Self {
        Self {
            step: WizardStep::BasicInfo,
            basic: BasicInfo::default(),
            slots: Vec::new(),
            draft: QuestionDraft::default(),
            errors: FieldErrors::new(),
            previews,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Errors from the last failed step change, add, or submit.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn draft(&self) -> &QuestionDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut QuestionDraft {
        &mut self.draft
    }

    /// Attaches a file to the draft question, releasing any previous preview.
    pub fn attach_media(&mut self, path: impl Into<std::path::PathBuf>) -> Result<(), AppError> {
        let attachment = self.previews.attach(path)?;
        self.draft.set_media(Some(attachment));
        Ok(())
    }

    pub fn question_count(&self) -> usize {
        self.slots.len()
    }

    /// Committed questions in order; `true` marks the one being edited.
    pub fn questions(&self) -> impl Iterator<Item = (&QuestionDraft, bool)> {
        self.slots.iter().map(|s| (s.question(), s.is_editing()))
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.slots.iter().position(QuestionSlot::is_editing)
    }

    pub fn total_points(&self) -> u32 {
        self.slots.iter().map(|s| s.question().points).sum()
    }

    /// Commits the draft if it is valid: back into its slot when editing,
    /// appended otherwise. The draft is reset afterwards.
    pub fn add_question(&mut self) -> Result<usize, AppError> {
        let errors = self.draft.check();
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(AppError::Validation(errors));
        }

        let committed = QuestionSlot::Committed(self.draft.committed());
        let index = match self.editing_index() {
            Some(i) => {
                self.slots[i] = committed;
                i
            }
            None => {
                self.slots.push(committed);
                self.slots.len() - 1
            }
        };

        self.draft = QuestionDraft::default();
        self.errors = FieldErrors::new();
        tracing::debug!("Question {} committed", index + 1);
        Ok(index)
    }

    /// Loads question `index` into the draft for editing.
    pub fn edit_question(&mut self, index: usize) -> Result<(), AppError> {
        if index >= self.slots.len() {
            return Err(AppError::InvalidState(format!("There is no question {}", index + 1)));
        }
        if let Some(current) = self.editing_index() {
            return Err(AppError::InvalidState(format!(
                "Finish editing question {} first",
                current + 1
            )));
        }
        if !self.draft.is_pristine() {
            return Err(AppError::InvalidState(
                "Add or discard the current draft before editing another question".to_string(),
            ));
        }

        let original = self.slots[index].question().clone();
        self.draft = original.clone();
        self.slots[index] = QuestionSlot::Editing(original);
        self.errors = FieldErrors::new();
        Ok(())
    }

    /// Abandons the current edit, keeping the committed version.
    pub fn cancel_edit(&mut self) {
        if let Some(i) = self.editing_index() {
            let original = self.slots[i].question().clone();
            self.slots[i] = QuestionSlot::Committed(original);
        }
        self.draft = QuestionDraft::default();
        self.errors = FieldErrors::new();
    }

    /// Throws the draft away without touching the list.
    pub fn discard_draft(&mut self) {
        if self.editing_index().is_some() {
            self.cancel_edit();
        } else {
            self.draft = QuestionDraft::default();
            self.errors = FieldErrors::new();
        }
    }

    /// Deletes question `index`. If it was being edited, the draft goes too.
    pub fn remove_question(&mut self, index: usize) -> Result<(), AppError> {
        if index >= self.slots.len() {
            return Err(AppError::InvalidState(format!("There is no question {}", index + 1)));
        }
        let removed = self.slots.remove(index);
        if removed.is_editing() {
            self.draft = QuestionDraft::default();
        }
        Ok(())
    }

    pub fn next_step(&mut self) -> Result<WizardStep, AppError> {
        match self.step.next() {
            Some(next) => self.go_to_step(next),
            None => Ok(self.step),
        }
    }

    pub fn previous_step(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Backward moves are free; forward moves validate every step left.
    pub fn go_to_step(&mut self, target: WizardStep) -> Result<WizardStep, AppError> {
        while self.step < target {
            self.check_leaving(self.step)?;
            match self.step.next() {
                Some(next) => self.step = next,
                None => break,
            }
        }
        if target < self.step {
            self.step = target;
        }
        self.errors = FieldErrors::new();
        Ok(self.step)
    }

    fn check_leaving(&mut self, step: WizardStep) -> Result<(), AppError> {
        let errors = match step {
            WizardStep::BasicInfo => self.basic.check(),
            WizardStep::Questions if self.slots.is_empty() => {
                let mut errors = FieldErrors::new();
                errors.add("questions", "Add at least one question.");
                errors
            }
            _ => FieldErrors::new(),
        };
        if errors.is_empty() {
            return Ok(());
        }
        self.errors = errors.clone();
        Err(AppError::Validation(errors))
    }

    /// Payload for the API, with media references already resolved.
    fn build_request(&self, media_refs: &[Option<String>]) -> Result<CreateExamRequest, AppError> {
        let (Some(start_date), Some(end_date)) = (self.basic.start_date, self.basic.end_date) else {
            return Err(AppError::InvalidState("Exam dates are missing".to_string()));
        };

        let questions = self
            .slots
            .iter()
            .zip(media_refs)
            .map(|(slot, media)| {
                let q = slot.question();
                NewQuestion {
                    content: q.content.trim().to_string(),
                    media: media.clone(),
                    answer_type: q.answer_type,
                    options: q
                        .options
                        .iter()
                        .map(|o| NewOption {
                            content: o.content.trim().to_string(),
                            is_correct: o.is_correct,
                        })
                        .collect(),
                    points: q.points,
                }
            })
            .collect();

        Ok(CreateExamRequest {
            title: self.basic.title.trim().to_string(),
            description: self.basic.description.trim().to_string(),
            time_limit: self.basic.time_limit,
            start_date,
            end_date,
            shuffle_questions: self.basic.shuffle_questions,
            shuffle_answers: self.basic.shuffle_answers,
            total_points: self.total_points(),
            questions,
        })
    }

    /// Re-validates and posts the whole exam once.
    ///
    /// On validation failure the wizard jumps to the first failing step. On
    /// API failure the draft is left intact for a retry. On success the
    /// wizard resets and the caller should navigate to the dashboard.
    pub async fn submit(&mut self, api: &dyn ExamApi) -> Result<(CreatedExam, Navigation), AppError> {
        if let Err(err) = self.check_leaving(WizardStep::BasicInfo) {
            self.step = WizardStep::BasicInfo;
            return Err(err);
        }
        if let Err(err) = self.check_leaving(WizardStep::Questions) {
            self.step = WizardStep::Questions;
            return Err(err);
        }

        let mut media_refs = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let reference = match slot.question().media() {
                Some(media) => Some(api.upload_media(media.path()).await?.url),
                None => None,
            };
            media_refs.push(reference);
        }

        let request = self.build_request(&media_refs)?;
        tracing::info!(
            "Creating exam '{}' with {} questions",
            request.title,
            request.questions.len()
        );

        match api.create_exam(&request).await {
            Ok(created) => {
                tracing::info!("Exam created with id {}", created.id);
                *self = ExamWizard::new(Arc::clone(&self.previews));
                Ok((created, Navigation::TeacherDashboard))
            }
            Err(err) => {
                tracing::error!("Failed to create exam: {}", err);
                Err(err)
            }
        }
    }
}
