// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

/// Base URL of the exam API when `QUIZ_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

/// Countdown resolution of a running exam.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub rust_log: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_url = env::var("QUIZ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let session_file = env::var("QUIZ_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".quizdesk").join("session.json"));

        let http_timeout = env::var("QUIZ_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("QUIZ_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Self {
            api_url,
            session_file,
            http_timeout,
            rust_log,
            log_dir,
        }
    }

    /// Configuration pointing at an arbitrary API, used by tests and tooling.
    pub fn for_api(api_url: impl Into<String>, session_file: impl Into<PathBuf>) -> Self {
        Self {
            api_url: api_url.into(),
            session_file: session_file.into(),
            http_timeout: Duration::from_secs(5),
            rust_log: "error".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}
