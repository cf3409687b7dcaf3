// src/main.rs

use std::process::ExitCode;

use quizdesk::AppError;
use quizdesk::cli::{self, Command, Input};
use quizdesk::config::Config;
use quizdesk::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quizdesk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // Logs go to stderr so they never mix with the exam on stdout
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, cli::USAGE);
            return ExitCode::from(2);
        }
    };

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Using exam API at {}", state.config.api_url);

    match cli::run(&state, command, Input::stdin()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::AuthFailure(message)) => {
            // A rejected token is useless from here on
            if let Err(e) = state.session.clear() {
                tracing::warn!("Could not clear the stored session: {}", e);
            }
            eprintln!("{}. Please log in again with `quizdesk login`.", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
