//! Operator CLI surface: a thin `clap`-derived front end over `Core`.
//! Not an API layer — just enough surface to drive the cognitive core
//! end to end.

use clap::{Parser, Subcommand};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " build ",
    env!("BUILD_NUMBER"),
    ")"
);

#[derive(Parser)]
#[command(name = "aria")]
#[command(about = "Cognitive runtime core for a long-running AI agent")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the heartbeat scheduler and an interactive message loop against stdin.
    Serve,
    /// Run the cognition pipeline once for a single message and print the reply.
    Message {
        text: String,
    },
    /// Inspect or toggle scheduled jobs.
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },
    /// Inspect or prune sessions.
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand)]
pub enum JobsAction {
    /// List every configured job with its schedule, enabled flag, and last run.
    List,
    /// Enable a job by id.
    Enable { job_id: String },
    /// Disable a job by id.
    Disable { job_id: String },
}

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List active sessions.
    List {
        /// Only sessions active within the last N minutes.
        #[arg(long)]
        active_within_minutes: Option<i64>,
    },
    /// Prune sessions inactive for longer than the given age.
    Prune {
        #[arg(long, default_value_t = 1440)]
        max_age_minutes: i64,
    },
}

