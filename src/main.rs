//! `aria` - operator CLI for the cognitive runtime core.
//!
//! Thin front end: resolve paths, boot `Core`, dispatch to a subcommand.
//! The actual cognition, scheduling, and storage logic all live in
//! `aria_core`.

use anyhow::{Context, Result};
use aria_core::core::{Core, CorePaths};
use clap::Parser;
use console::Style;
use std::io::{BufRead, Write};
use std::path::PathBuf;

mod cli;

use cli::{Cli, Commands, JobsAction, SessionsAction};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let paths = resolve_paths()?;
    let core = Core::bootstrap(paths).await.context("failed to start Aria core")?;

    match cli.command {
        Commands::Serve => run_serve(core).await,
        Commands::Message { text } => run_message(&core, &text).await,
        Commands::Jobs { action } => run_jobs(&core, action),
        Commands::Sessions { action } => run_sessions(&core, action),
    }
}

fn resolve_paths() -> Result<CorePaths> {
    let data_dir = std::env::var("ARIA_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aria")
    });
    let config_dir = std::env::var("ARIA_CONFIG_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aria")
    });
    Ok(CorePaths { data_dir, config_dir })
}

/// Run the heartbeat scheduler in the background and an interactive
/// message loop against stdin, exiting cleanly on Ctrl-C.
async fn run_serve(core: Core) -> Result<()> {
    let green = Style::new().green();
    println!("{} aria serving. Ctrl-C to stop.", green.apply_to("*"));

    let scheduler = core.scheduler.clone();
    let scheduler_task = tokio::spawn(async move { scheduler.run_forever().await });

    let session_id = core.sessions.main_session_id().to_string();
    let agent_model = core.router.catalog().primary.clone();
    let pipeline = core.pipeline.clone();

    tokio::select! {
        _ = message_loop(pipeline, session_id, agent_model) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nshutting down...");
        }
    }

    scheduler_task.abort();
    Ok(())
}

async fn message_loop(
    pipeline: std::sync::Arc<aria_core::cognition::CognitionPipeline>,
    session_id: String,
    agent_model: String,
) {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match pipeline.process_message(&session_id, &agent_model, text).await {
            Ok(outcome) => println!("[{:?}] {}", outcome.tone, outcome.reply),
            Err(e) => eprintln!("error: {}", e.user_message()),
        }
    }
}

async fn run_message(core: &Core, text: &str) -> Result<()> {
    let session_id = core.sessions.main_session_id();
    let agent_model = core.router.catalog().primary.clone();
    let outcome = core
        .pipeline
        .process_message(session_id, &agent_model, text)
        .await?;
    println!("{}", outcome.reply);
    Ok(())
}

fn run_jobs(core: &Core, action: JobsAction) -> Result<()> {
    match action {
        JobsAction::List => {
            let states = core.store.jobs().list();
            for job in core.jobs_config().jobs.iter() {
                let state = states.iter().find(|s| s.job_id == job.job_id);
                let last_run = state
                    .and_then(|s| s.last_run_at)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<24} enabled={:<5} schedule={:<16} last_run={}",
                    job.job_id, job.enabled, job.schedule, last_run
                );
            }
        }
        JobsAction::Enable { job_id } => set_job_enabled(core, &job_id, true)?,
        JobsAction::Disable { job_id } => set_job_enabled(core, &job_id, false)?,
    }
    Ok(())
}

fn set_job_enabled(core: &Core, job_id: &str, enabled: bool) -> Result<()> {
    let mut config = core.jobs_config().clone();
    let Some(job) = config.jobs.iter_mut().find(|j| j.job_id == job_id) else {
        anyhow::bail!("no such job: {job_id}");
    };
    job.enabled = enabled;
    let raw = serde_yml::to_string(&config).context("failed to serialize jobs config")?;
    std::fs::write(core.jobs_config_path(), raw).context("failed to write jobs.yaml")?;
    println!("{job_id}: enabled={enabled}");
    Ok(())
}

fn run_sessions(core: &Core, action: SessionsAction) -> Result<()> {
    match action {
        SessionsAction::List { active_within_minutes } => {
            for session in core.sessions.list_active(active_within_minutes) {
                println!(
                    "{:<24} kind={:?} state={:?} last_active={}",
                    session.session_id,
                    session.kind,
                    session.state,
                    session.last_active_at.to_rfc3339()
                );
            }
        }
        SessionsAction::Prune { max_age_minutes } => {
            let pruned = core.sessions.prune(max_age_minutes)?;
            println!("pruned {pruned} session(s)");
        }
    }
    Ok(())
}
