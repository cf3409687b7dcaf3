// src/cli.rs

//! Terminal front end. Each subcommand maps onto one view of the app.

use std::fmt::Write as _;
use std::io::{BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc};

use crate::{
    controllers::{
        authoring::{BasicInfo, ExamWizard, WizardStep},
        dashboard::{ResultView, StudentDashboard, TeacherDashboard},
        exam_taking::{ConfirmPrompt, ExamAttempt, ExamSession, SubmitOutcome, TakingState},
        management::{ExamManagement, format_time_spent},
    },
    error::{AppError, FieldErrors},
    media::{MediaKind, PreviewRegistry},
    models::{
        exam::{AnswerType, ExamSettingsPatch},
        user::{RegisterForm, Role},
    },
    routes::Navigation,
    state::AppState,
};

pub const USAGE: &str = "\
Usage: quizdesk <command>

  login <username> <password>
  register <name> <email> <password> <confirm-password> <teacher|student>
  logout
  whoami
  dashboard
  take <exam-id>
  create <draft.json>
  manage <exam-id> [export [file] | set <key>=<on|off>...]
  result <submission-id>";

#[derive(Debug, Clone, PartialEq)]
pub enum ManageAction {
    Show,
    Export(Option<PathBuf>),
    Settings(ExamSettingsPatch),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: String },
    Register(Box<RegisterArgs>),
    Logout,
    WhoAmI,
    Dashboard,
    Take { exam_id: String },
    Create { draft: PathBuf },
    Manage { exam_id: String, action: ManageAction },
    Result { submission_id: String },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterArgs {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

fn usage_error(message: impl Into<String>) -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("command", message);
    AppError::Validation(errors)
}

fn parse_switch(value: &str) -> Result<bool, AppError> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => Err(usage_error(format!("Expected on/off, got '{}'", other))),
    }
}

impl Command {
    /// Parses the arguments after the program name.
    pub fn parse(args: &[String]) -> Result<Self, AppError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Ok(Command::Help),
            ["login", username, password] => Ok(Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ["register", name, email, password, confirm, role] => {
                Ok(Command::Register(Box::new(RegisterArgs {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    confirm_password: confirm.to_string(),
                    role: role.parse()?,
                })))
            }
            ["logout"] => Ok(Command::Logout),
            ["whoami"] => Ok(Command::WhoAmI),
            ["dashboard"] => Ok(Command::Dashboard),
            ["take", exam_id] => Ok(Command::Take {
                exam_id: exam_id.to_string(),
            }),
            ["create", draft] => Ok(Command::Create {
                draft: PathBuf::from(draft),
            }),
            ["manage", exam_id, rest @ ..] => Ok(Command::Manage {
                exam_id: exam_id.to_string(),
                action: parse_manage(rest)?,
            }),
            ["result", submission_id] => Ok(Command::Result {
                submission_id: submission_id.to_string(),
            }),
            [name, ..] => Err(usage_error(format!("Unknown or incomplete command '{}'", name))),
        }
    }
}

fn parse_manage(rest: &[&str]) -> Result<ManageAction, AppError> {
    match rest {
        [] => Ok(ManageAction::Show),
        ["export"] => Ok(ManageAction::Export(None)),
        ["export", file] => Ok(ManageAction::Export(Some(PathBuf::from(file)))),
        ["set", pairs @ ..] if !pairs.is_empty() => {
            let mut patch = ExamSettingsPatch::default();
            for pair in pairs {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| usage_error(format!("Expected key=value, got '{}'", pair)))?;
                let value = parse_switch(value)?;
                match key {
                    "shuffle-questions" => patch.shuffle_questions = Some(value),
                    "shuffle-answers" => patch.shuffle_answers = Some(value),
                    "published" => patch.published = Some(value),
                    other => return Err(usage_error(format!("Unknown setting '{}'", other))),
                }
            }
            Ok(ManageAction::Settings(patch))
        }
        _ => Err(usage_error("Expected 'export [file]' or 'set key=value...'")),
    }
}

/// Lines typed by the user, read on a dedicated thread so that the exam
/// countdown keeps running while we wait.
pub struct Input {
    lines: Mutex<mpsc::Receiver<String>>,
}

impl Input {
    pub fn stdin() -> Arc<Self> {
        let (tx, rx) = mpsc::channel(16);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Arc::new(Self {
            lines: Mutex::new(rx),
        })
    }

    /// `None` once input is closed.
    pub async fn next_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }

    pub async fn ask(&self, question: &str) -> Option<String> {
        print!("{} ", question);
        std::io::stdout().flush().ok();
        self.next_line().await
    }
}

#[async_trait]
impl ConfirmPrompt for Input {
    async fn confirm_partial(&self, answered: usize, total: usize) -> bool {
        let question = format!(
            "You answered {} of {} questions. Submit anyway? [y/N]",
            answered, total
        );
        matches!(
            self.ask(&question).await.as_deref().map(str::trim),
            Some("y") | Some("Y") | Some("yes")
        )
    }
}

/// Exam draft as written by a teacher in a JSON file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub time_limit: u32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_answers: bool,
    pub questions: Vec<DraftQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuestion {
    pub content: String,
    #[serde(default)]
    pub answer_type: AnswerType,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub media: Option<PathBuf>,
    pub options: Vec<DraftOption>,
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct DraftOption {
    pub content: String,
    #[serde(default)]
    pub correct: bool,
}

impl DraftFile {
    /// Replays the file through the wizard so it gets the same checks as an
    /// interactively built exam. Relative media paths resolve against `base`.
    pub fn into_wizard(
        self,
        previews: Arc<PreviewRegistry>,
        base: &std::path::Path,
    ) -> Result<ExamWizard, AppError> {
        let mut wizard = ExamWizard::new(previews);
        wizard.basic = BasicInfo {
            title: self.title,
            description: self.description,
            time_limit: self.time_limit,
            start_date: self.start_date,
            end_date: self.end_date,
            shuffle_questions: self.shuffle_questions,
            shuffle_answers: self.shuffle_answers,
        };
        wizard.go_to_step(WizardStep::Questions)?;

        for (n, question) in self.questions.into_iter().enumerate() {
            if let Some(media) = &question.media {
                wizard.attach_media(base.join(media))?;
            }
            let draft = wizard.draft_mut();
            draft.set_content(question.content);
            draft.set_answer_type(question.answer_type);
            draft.points = question.points;
            for (i, option) in question.options.into_iter().enumerate() {
                if i >= draft.options().len() {
                    draft.add_option();
                }
                draft.set_option_text(i, option.content)?;
                if option.correct {
                    draft.set_option_correct(i, true)?;
                }
            }
            wizard.add_question().map_err(|err| match err {
                AppError::Validation(fields) => {
                    let mut errors = FieldErrors::new();
                    for (field, message) in fields.iter() {
                        errors.add(format!("questions[{}].{}", n, field), message);
                    }
                    AppError::Validation(errors)
                }
                other => other,
            })?;
        }

        wizard.go_to_step(WizardStep::Review)?;
        Ok(wizard)
    }
}

/// Text shown for the question currently on screen.
pub fn render_question(attempt: &ExamAttempt) -> String {
    let mut out = String::new();
    let Some(presented) = attempt.current_question() else {
        return out;
    };
    let question = &presented.question;
    let chosen = attempt.answer_for(&question.id);

    let _ = writeln!(
        out,
        "Question {}/{} ({} pt) [{} left]",
        attempt.current_index() + 1,
        attempt.question_count(),
        question.points,
        format_time_spent(attempt.remaining_secs())
    );
    let _ = writeln!(out, "{}", question.content);
    if let Some(media) = &question.media {
        let kind = match MediaKind::from_reference(media) {
            Some(MediaKind::Image) => "image",
            Some(MediaKind::Audio) => "audio",
            None => "media",
        };
        let _ = writeln!(out, "  [{}: {}]", kind, media);
    }
    // options are already in display order
    for (shown, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(shown) { '*' } else { ' ' };
        let _ = writeln!(out, " {}{}. {}", marker, shown + 1, option.content);
    }
    out
}

fn print_navigation(next: &Navigation) {
    println!("-> {}", next);
}

/// Executes one command against the app state.
pub async fn run(state: &AppState, command: Command, input: Arc<Input>) -> Result<(), AppError> {
    match command {
        Command::Help => println!("{}", USAGE),
        Command::Login { username, password } => {
            let next = state.auth().login(&username, &password).await?;
            println!("Logged in.");
            print_navigation(&next);
        }
        Command::Register(args) => {
            let form = RegisterForm {
                name: args.name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
                role: args.role,
            };
            let next = state.auth().register(form).await?;
            println!("Account created, please log in.");
            print_navigation(&next);
        }
        Command::Logout => {
            let next = state.auth().logout()?;
            println!("Logged out.");
            print_navigation(&next);
        }
        Command::WhoAmI => match state.session.current().identity() {
            Some(identity) => println!(
                "{} ({})",
                identity.username.as_deref().unwrap_or("unknown user"),
                identity.role
            ),
            None => println!("Not logged in."),
        },
        Command::Dashboard => dashboard(state).await?,
        Command::Take { exam_id } => take_exam(state, &exam_id, input).await?,
        Command::Create { draft } => create_exam(state, &draft).await?,
        Command::Manage { exam_id, action } => manage_exam(state, &exam_id, action).await?,
        Command::Result { submission_id } => {
            state.auth().guard(&Navigation::Result(submission_id.clone()))?;
            let view = ResultView::load(state.api.as_ref(), &submission_id).await?;
            let total = view
                .submission
                .exam
                .total_points()
                .map(|t| format!("/{}", t))
                .unwrap_or_default();
            println!("{}", view.exam_title());
            println!("Score: {}{}", view.submission.score, total);
            if let Some(pct) = view.percentage() {
                println!("Percentage: {:.1}%", pct);
            }
            println!("Time spent: {}", format_time_spent(view.submission.time_spent));
            println!("Submitted at: {}", view.submission.submitted_at.format("%Y-%m-%d %H:%M"));
        }
    }
    Ok(())
}

async fn dashboard(state: &AppState) -> Result<(), AppError> {
    let role = state
        .session
        .current()
        .role()
        .ok_or_else(|| AppError::AuthFailure("Please log in first".to_string()))?;

    match role {
        Role::Student => {
            state.auth().guard(&Navigation::StudentDashboard)?;
            let board = StudentDashboard::load(state.api.as_ref()).await?;
            println!(
                "Completed: {}  Upcoming: {}  Average: {:.2}  Best: {:.2}",
                board.stats.completed_exams,
                board.stats.upcoming_exams,
                board.stats.average_score,
                board.stats.highest_score
            );
            println!("\nAvailable exams:");
            for exam in &board.available {
                let taken = if board.has_taken(&exam.id) { " (done)" } else { "" };
                println!("  {}  {} [{} min]{}", exam.id, exam.title, exam.time_limit, taken);
            }
            println!("\nYour submissions:");
            for submission in &board.submissions {
                println!(
                    "  {}  {}  score {}",
                    submission.id,
                    submission.exam.title().unwrap_or(submission.exam.id()),
                    submission.score
                );
            }
        }
        Role::Teacher => {
            state.auth().guard(&Navigation::TeacherDashboard)?;
            let board = TeacherDashboard::load(state.api.as_ref()).await?;
            println!(
                "Exams: {}  Students: {}  Submissions: {}  Average: {:.2}",
                board.stats.total_exams,
                board.stats.total_students,
                board.stats.total_submissions,
                board.stats.average_score
            );
            println!("\nYour exams ({} published):", board.published_count());
            for exam in &board.exams {
                let flag = if exam.published { "" } else { " (draft)" };
                println!("  {}  {}{}", exam.id, exam.title, flag);
            }
        }
    }
    Ok(())
}

/// What to tell the student after pressing submit. `None` once the attempt
/// is finished; the countdown may have submitted while the prompt was open.
fn submit_feedback(outcome: &Result<SubmitOutcome, AppError>, finished: bool) -> Option<String> {
    if finished {
        return None;
    }
    match outcome {
        Ok(SubmitOutcome::Submitted(_)) => None,
        Ok(SubmitOutcome::Declined) => Some("Keep going.".to_string()),
        Ok(SubmitOutcome::Ignored) => Some("A submission is already in progress.".to_string()),
        Err(err) => Some(format!("Submission failed: {}. Press s to retry.", err)),
    }
}

async fn take_exam(state: &AppState, exam_id: &str, input: Arc<Input>) -> Result<(), AppError> {
    state.auth().guard(&Navigation::TakeExam(exam_id.to_string()))?;

    let session = ExamSession::new(Arc::clone(&state.api), input.clone());
    session.load_exam(exam_id).await?;

    if let Some(title) = session.inspect(|a| a.exam().map(|e| e.title.clone())) {
        println!("== {} ==", title);
    }
    println!("Type an option number to answer, n/p to move, g <n> to jump, s to submit, q to quit.\n");
    print!("{}", session.inspect(render_question));

    let mut poll = tokio::time::interval(Duration::from_millis(250));
    let mut reported_failure = false;
    loop {
        if let Some(next) = session.navigation() {
            println!("Submitted.");
            print_navigation(&next);
            return Ok(());
        }

        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line else {
                    println!("Input closed, leaving the exam without submitting.");
                    return Ok(());
                };
                match line.trim() {
                    "q" => {
                        println!("Left the exam. Nothing was submitted.");
                        return Ok(());
                    }
                    "n" => { session.next_question(); }
                    "p" => { session.previous_question(); }
                    "s" => {
                        let outcome = session.submit().await;
                        match submit_feedback(&outcome, session.navigation().is_some()) {
                            Some(message) => println!("{}", message),
                            None => continue,
                        }
                    }
                    cmd if cmd.starts_with("g ") => {
                        match cmd[2..].trim().parse::<usize>() {
                            Ok(n) if n > 0 => { session.go_to_question(n - 1); }
                            _ => println!("Usage: g <question number>"),
                        }
                    }
                    cmd => match cmd.parse::<usize>() {
                        Ok(n) if n > 0 => {
                            if let Err(err) = session.select_current(n - 1) {
                                println!("{}", err);
                            }
                        }
                        _ => println!("Unrecognised input '{}'", cmd),
                    },
                }
                if session.state() == TakingState::InProgress {
                    print!("{}", session.inspect(render_question));
                }
            }
            _ = poll.tick(), if !reported_failure => {
                if let Some(error) = session.inspect(|a| {
                    (a.remaining_secs() == 0 && *a.state() == TakingState::InProgress)
                        .then(|| a.last_error().map(str::to_string))
                        .flatten()
                }) {
                    println!("Automatic submission failed: {}. Press s to retry.", error);
                    reported_failure = true;
                }
            }
        }
    }
}

async fn create_exam(state: &AppState, path: &std::path::Path) -> Result<(), AppError> {
    state.auth().guard(&Navigation::CreateExam)?;

    let raw = tokio::fs::read_to_string(path).await?;
    let draft: DraftFile = serde_json::from_str(&raw).map_err(|e| {
        usage_error(format!("{} is not a valid exam draft: {}", path.display(), e))
    })?;
    let base = path.parent().unwrap_or(std::path::Path::new("."));

    let mut wizard = draft.into_wizard(Arc::clone(&state.previews), base)?;
    println!(
        "Creating '{}' with {} questions ({} points)",
        wizard.basic.title,
        wizard.question_count(),
        wizard.total_points()
    );

    let (created, next) = wizard.submit(state.api.as_ref()).await?;
    println!("Exam created with id {}", created.id);
    print_navigation(&next);
    Ok(())
}

async fn manage_exam(state: &AppState, exam_id: &str, action: ManageAction) -> Result<(), AppError> {
    state.auth().guard(&Navigation::ManageExam(exam_id.to_string()))?;

    let mut view = ExamManagement::load(state.api.as_ref(), exam_id).await?;
    match action {
        ManageAction::Show => {
            let now = Utc::now();
            let exam = view.exam();
            println!("{} [{}]", exam.title, view.status(now));
            if let Some(remaining) = view.time_remaining(now) {
                println!("Time remaining: {}", remaining);
            }
            println!(
                "Shuffle questions: {}  Shuffle answers: {}  Published: {}",
                exam.shuffle_questions, exam.shuffle_answers, exam.published
            );
            println!("Submissions: {}", view.submissions().len());
            println!("Average score: {:.2}", view.average_score());
            if let (Some(high), Some(low)) = (view.highest_score(), view.lowest_score()) {
                println!("Highest: {}  Lowest: {}", high, low);
            }
            for (label, count) in view.score_distribution().rows() {
                println!("  {:>8}  {}", label, count);
            }
            println!("\nPer question:");
            for (n, stats) in view.question_stats().iter().enumerate() {
                let kind = match stats.answer_type {
                    AnswerType::Single => "single",
                    AnswerType::Multiple => "multiple",
                };
                println!(
                    "  {:>3}. {} [{}, {} pt] {}/{} correct ({:.1}%)",
                    n + 1,
                    stats.content,
                    kind,
                    stats.points,
                    stats.correct,
                    stats.total,
                    stats.correct_rate()
                );
            }
        }
        ManageAction::Export(file) => {
            let file = file.unwrap_or_else(|| PathBuf::from(view.export_file_name()));
            tokio::fs::write(&file, view.export_csv()).await?;
            println!("Wrote {} rows to {}", view.submissions().len(), file.display());
        }
        ManageAction::Settings(patch) => {
            view.update_settings(state.api.as_ref(), patch).await?;
            println!("Settings saved.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args("take e42")).unwrap(),
            Command::Take {
                exam_id: "e42".to_string()
            }
        );
        assert_eq!(
            Command::parse(&args("manage e1 export out.csv")).unwrap(),
            Command::Manage {
                exam_id: "e1".to_string(),
                action: ManageAction::Export(Some(PathBuf::from("out.csv")))
            }
        );
        assert!(matches!(
            Command::parse(&args("register Lan lan@x.io pw pw student")).unwrap(),
            Command::Register(a) if a.role == Role::Student
        ));
    }

    #[test]
    fn parses_settings_patch() {
        let command = Command::parse(&args("manage e1 set shuffle-answers=on published=off")).unwrap();
        assert_eq!(
            command,
            Command::Manage {
                exam_id: "e1".to_string(),
                action: ManageAction::Settings(ExamSettingsPatch {
                    shuffle_questions: None,
                    shuffle_answers: Some(true),
                    published: Some(false),
                })
            }
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(Command::parse(&args("take")).is_err());
        assert!(Command::parse(&args("manage e1 set")).is_err());
        assert!(Command::parse(&args("manage e1 set colour=on")).is_err());
        assert!(Command::parse(&args("register a b c d admin")).is_err());
    }

    #[test]
    fn renders_current_question_with_choice_marker() {
        let mut exam = crate::test_support::sample_exam("e1", 2, 5);
        exam.questions[0].media = Some("/uploads/cell.png".to_string());
        let mut attempt = ExamAttempt::new();
        attempt.begin_load();
        attempt
            .finish_load(Ok(exam), tokio::time::Instant::now(), &mut rand::thread_rng())
            .unwrap();
        attempt.select_current(1).unwrap();

        let text = render_question(&attempt);

        assert!(text.starts_with("Question 1/2 (1 pt) [5:00 left]"));
        assert!(text.contains("[image: /uploads/cell.png]"));
        assert!(text.contains("  1. A1"));
        assert!(text.contains(" *2. B1"));
    }

    #[test]
    fn shuffled_options_render_what_gets_submitted() {
        use rand::SeedableRng;
        use rand::rngs::StdRng;

        let mut exam = crate::test_support::sample_exam("e1", 1, 5);
        exam.shuffle_answers = true;
        exam.questions[0].options.extend(
            ["D1", "E1"].iter().map(|label| crate::models::exam::ExamOption {
                content: label.to_string(),
                is_correct: None,
                media: None,
            }),
        );
        let mut reordered = false;

        for seed in 0..8 {
            let mut attempt = ExamAttempt::new();
            attempt.begin_load();
            attempt
                .finish_load(
                    Ok(exam.clone()),
                    tokio::time::Instant::now(),
                    &mut StdRng::seed_from_u64(seed),
                )
                .unwrap();
            reordered |= attempt.questions()[0].option_order != [0, 1, 2, 3, 4];
            attempt.select_current(0).unwrap();

            let text = render_question(&attempt);
            let shown = text
                .lines()
                .find_map(|line| line.strip_prefix(" *1. "))
                .unwrap();
            let submitted = attempt.answer_entries()[0].selected_answer.unwrap();

            assert_eq!(shown, exam.questions[0].options[submitted].content, "seed {}", seed);
        }
        assert!(reordered);
    }

    #[test]
    fn submit_feedback_stays_quiet_once_the_timer_finished() {
        assert_eq!(submit_feedback(&Ok(SubmitOutcome::Ignored), true), None);
        assert_eq!(submit_feedback(&Ok(SubmitOutcome::Declined), true), None);
        assert_eq!(
            submit_feedback(&Ok(SubmitOutcome::Ignored), false).as_deref(),
            Some("A submission is already in progress.")
        );
        let failed = Err(AppError::SubmissionFailure("offline".to_string()));
        assert!(submit_feedback(&failed, false).unwrap().starts_with("Submission failed"));
    }

    const DRAFT: &str = r#"{
        "title": "Geography",
        "description": "Capitals",
        "timeLimit": 15,
        "startDate": "2026-09-01T08:00:00Z",
        "endDate": "2026-09-01T10:00:00Z",
        "shuffleAnswers": true,
        "questions": [
            {
                "content": "Capital of Vietnam?",
                "options": [
                    {"content": "Hanoi", "correct": true},
                    {"content": "Hue"},
                    {"content": "Da Nang"}
                ]
            },
            {
                "content": "Pick the rivers",
                "answerType": "multiple",
                "points": 2,
                "options": [
                    {"content": "Mekong", "correct": true},
                    {"content": "Red River", "correct": true}
                ]
            }
        ]
    }"#;

    #[test]
    fn draft_file_goes_through_the_wizard() {
        let draft: DraftFile = serde_json::from_str(DRAFT).unwrap();
        let wizard = draft
            .into_wizard(PreviewRegistry::new(), std::path::Path::new("."))
            .unwrap();

        assert_eq!(wizard.step(), WizardStep::Review);
        assert_eq!(wizard.question_count(), 2);
        assert_eq!(wizard.total_points(), 3);
        let (first, _) = wizard.questions().next().unwrap();
        assert_eq!(first.options().len(), 3);
    }

    #[test]
    fn invalid_draft_question_names_its_position() {
        let draft: DraftFile = serde_json::from_str(
            r#"{"title": "T", "description": "D", "timeLimit": 5,
                "startDate": "2026-09-01T08:00:00Z", "endDate": "2026-09-01T10:00:00Z",
                "questions": [{"content": "No answer", "options": [{"content": "a"}, {"content": "b"}]}]}"#,
        )
        .unwrap();

        let err = draft
            .into_wizard(PreviewRegistry::new(), std::path::Path::new("."))
            .unwrap_err();
        assert!(err.field_errors().unwrap().contains("questions[0].correct"));
    }
}
