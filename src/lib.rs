pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod feedback;
pub mod http;
pub mod live;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod stores;
pub mod timer;

use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tokio::sync::broadcast;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
pub use error::{ApiError, Result};
use feedback::{FeedbackEvent, Severity};
pub use state::AppState;

/// How long to wait for queued feedback to be printed before exiting.
const FEEDBACK_DRAIN: Duration = Duration::from_millis(200);

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(base_url) = cli.base_url.clone() {
        config.api.base_url = base_url;
    }
    config.validate()?;

    init_tracing(&config);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        return cli::cmd_init();
    }

    let state = AppState::new(config).context("Failed to set up the API client")?;
    let printer = tokio::spawn(print_feedback(state.feedback.subscribe()));

    let result = cli::dispatch(&state, command).await;

    drop(state);
    if tokio::time::timeout(FEEDBACK_DRAIN, printer).await.is_err() {
        debug!("Feedback printer still running at exit");
    }
    result
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Renders toasts and redirects on stderr until every sender is gone.
async fn print_feedback(mut events: broadcast::Receiver<FeedbackEvent>) {
    loop {
        match events.recv().await {
            Ok(FeedbackEvent::ToastPushed(toast)) => {
                let marker = match toast.severity {
                    Severity::Success => "✓",
                    Severity::Error => "✗",
                    Severity::Info => "•",
                };
                eprintln!("{marker} {}", toast.message);
            }
            Ok(FeedbackEvent::ErrorShown(message)) => eprintln!("✗ {message}"),
            Ok(FeedbackEvent::Redirect(path)) => {
                eprintln!("  Sign in again ({path}) and set [api].user_id in config.toml");
            }
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
