//! Scheduled job handlers

use anyhow::Context;
use serde_json::Value;

use crate::cli::JobCommands;
use crate::models::{JobCreate, JobUpdate, ScheduledJob, format_datetime};
use crate::state::AppState;

fn parse_parameters(raw: &str) -> anyhow::Result<Value> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("Parameters are not valid JSON: {raw}"))?;
    if !value.is_object() {
        anyhow::bail!("Parameters must be a JSON object");
    }
    Ok(value)
}

pub async fn cmd_jobs(state: &AppState, command: JobCommands) -> anyhow::Result<()> {
    let store = state.task_store();
    match command {
        JobCommands::List => {
            let jobs = store.fetch_jobs().await.context("Failed to list jobs")?;
            print_jobs(&jobs);
        }
        JobCommands::Create {
            job_id,
            name,
            cron,
            parameters,
            description,
            disabled,
        } => {
            let request = JobCreate {
                job_id,
                name,
                cron_expression: cron,
                parameters: parse_parameters(&parameters)?,
                enabled: Some(!disabled),
                description,
            };
            let job = store
                .create_job(&request)
                .await
                .context("Failed to create job")?;
            println!("Created job {} ({})", job.job_id, job.cron_expression);
        }
        JobCommands::Update {
            job_id,
            name,
            cron,
            parameters,
            description,
            enabled,
        } => {
            let update = JobUpdate {
                name,
                cron_expression: cron,
                parameters: parameters.as_deref().map(parse_parameters).transpose()?,
                enabled,
                description,
            };
            if update.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            let job = store
                .update_job(&job_id, &update)
                .await
                .with_context(|| format!("Failed to update job {job_id}"))?;
            println!("Updated job {}", job.job_id);
        }
        JobCommands::Delete { job_id } => {
            store
                .delete_job(&job_id)
                .await
                .with_context(|| format!("Failed to delete job {job_id}"))?;
            println!("Deleted job {job_id}");
        }
        JobCommands::Toggle { job_id } => {
            let job = store
                .toggle_job(&job_id)
                .await
                .with_context(|| format!("Failed to toggle job {job_id}"))?;
            let state = if job.enabled { "enabled" } else { "disabled" };
            println!("Job {} is now {state}", job.job_id);
        }
    }
    Ok(())
}

fn print_jobs(jobs: &[ScheduledJob]) {
    if jobs.is_empty() {
        println!("No scheduled jobs.");
        return;
    }

    println!("Scheduled Jobs ({} total)", jobs.len());
    println!("{:-<70}", "");
    for job in jobs {
        let indicator = if job.enabled { "🟢" } else { "⏸" };
        println!("{indicator} {} [{}]", job.name, job.job_id);
        println!("  Cron: {} | Parameters: {}", job.cron_expression, job.parameters);
        if let Some(description) = job.description.as_deref().filter(|d| !d.is_empty()) {
            println!("  {description}");
        }
        println!("  Updated: {}", format_datetime(job.updated_at.as_deref()));
    }
}
