//! Crawler task handlers

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::TaskCommands;
use crate::models::{Task, TaskCreate, TaskId, format_datetime};
use crate::state::AppState;
use crate::stores::{CloseReason, TaskEvent, TaskStore};

pub async fn cmd_tasks(state: &AppState, command: TaskCommands) -> anyhow::Result<()> {
    let store = state.task_store();
    match command {
        TaskCommands::List { page, page_size } => {
            store.set_page(page, page_size);
            let tasks = store.fetch_tasks().await.context("Failed to list tasks")?;
            print_tasks(&tasks);
        }
        TaskCommands::Show { id } => {
            let task = store
                .fetch_task(id)
                .await
                .with_context(|| format!("Failed to load task {id}"))?;
            print_task(&task);
        }
        TaskCommands::Create {
            mode,
            year,
            season,
            start_url,
            limit,
            watch,
        } => {
            let request = TaskCreate {
                mode,
                year,
                season,
                start_url,
                limit,
            };
            let task = store
                .create_task(&request)
                .await
                .context("Failed to create task")?;
            println!("Created task {} ({})", task.id, task.status);
            if watch {
                watch_task(&store, task.id).await?;
            }
        }
        TaskCommands::Cancel { id } => {
            let task = store
                .cancel_task(id)
                .await
                .with_context(|| format!("Failed to cancel task {id}"))?;
            println!("Task {} is now {}", task.id, task.status);
        }
        TaskCommands::Watch { id } => watch_task(&store, id).await?,
    }
    Ok(())
}

/// Prints live progress until the channel closes or Ctrl+C is pressed.
async fn watch_task(store: &TaskStore, id: TaskId) -> anyhow::Result<()> {
    let task = store
        .fetch_task(id)
        .await
        .with_context(|| format!("Failed to load task {id}"))?;
    if task.status.is_terminal() {
        println!("Task {id} already {}", task.status);
        return Ok(());
    }

    let mut events = store.subscribe();
    store
        .start_progress(id)
        .await
        .with_context(|| format!("Failed to follow task {id}"))?;
    println!("Following task {id}, Ctrl+C to stop");

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                store.stop_progress(id);
                println!();
                println!("Stopped following task {id}");
                break;
            }
            event = events.recv() => match event {
                Ok(TaskEvent::Updated(task)) if task.id == id => print_progress(&task),
                Ok(TaskEvent::ChannelClosed { task_id, reason }) if task_id == id => {
                    report_close(store, id, &reason);
                    break;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn report_close(store: &TaskStore, id: TaskId, reason: &CloseReason) {
    match reason {
        CloseReason::Finished(status) => println!("Task {id} {status}"),
        CloseReason::Failed(message) => {
            println!("Lost progress channel: {message}");
            if let Some(task) = store.task(id) {
                println!("Last known status: {}", task.status);
            }
        }
        CloseReason::Remote => println!("Server closed the progress channel"),
        CloseReason::Stopped => {}
    }
}

fn print_progress(task: &Task) {
    let items = match (task.processed_items, task.total_items) {
        (Some(done), Some(total)) => format!("{done}/{total} items"),
        (Some(done), None) => format!("{done} items"),
        _ => String::new(),
    };
    let speed = task
        .processing_speed
        .map(|s| format!("{s:.1}/s"))
        .unwrap_or_default();
    println!(
        "  {:>5.1}%  {items:<16} {speed:<8} eta {}",
        task.percentage.unwrap_or(0.0),
        task.eta()
    );
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No crawler tasks.");
        println!();
        println!("Start one with: ikuyo tasks create homepage");
        return;
    }

    println!("{:<6} {:<10} {:<10} {:<20} {:>7}  Created", "ID", "Type", "Status", "Mode", "Done");
    println!("{:-<80}", "");
    for task in tasks {
        let done = task
            .percentage
            .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
        println!(
            "{:<6} {:<10} {:<10} {:<20} {:>7}  {}",
            task.id,
            task.task_type,
            task.status,
            task.parameter("mode"),
            done,
            format_datetime(task.created_at.as_deref())
        );
    }
}

fn print_task(task: &Task) {
    println!("Task {} ({})", task.id, task.task_type);
    println!("{:-<70}", "");
    println!("  Status:    {}", task.status);
    println!("  Mode:      {}", task.parameter("mode"));
    println!("  Year:      {}", task.parameter("year"));
    println!("  Season:    {}", task.parameter("season"));
    println!("  Limit:     {}", task.parameter("limit"));
    println!("  Created:   {}", format_datetime(task.created_at.as_deref()));
    println!("  Started:   {}", format_datetime(task.started_at.as_deref()));
    println!("  Completed: {}", format_datetime(task.completed_at.as_deref()));
    if let Some(percentage) = task.percentage {
        println!("  Progress:  {percentage:.1}% (eta {})", task.eta());
    }
    if let Some(summary) = &task.result_summary {
        println!("  Result:    {summary}");
    }
    if let Some(error) = &task.error_message {
        println!("  Error:     {error}");
    }
}
