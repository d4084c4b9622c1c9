//! CLI module - Command-line front end for an IKuYo backend
//!
//! Each command drives the same services and page stores a graphical front
//! end would, and keeps their snapshots in the session file between runs.

mod commands;

use clap::{Args, Parser, Subcommand};

use crate::models::{SubjectId, TaskId};

/// IKuYo - Anime airing calendar, resource search and crawler control
#[derive(Parser)]
#[command(name = "ikuyo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend root, overriding config and environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Show this week's airing calendar
    #[command(alias = "cal")]
    Calendar {
        /// Ignore the cached calendar
        #[arg(long)]
        refresh: bool,

        /// Only show one weekday (1 = Monday)
        #[arg(long)]
        day: Option<u8>,
    },

    /// Show details, episodes and availability for a subject
    #[command(alias = "i")]
    Info {
        id: SubjectId,

        /// Page this detail view was opened from, e.g. /library
        #[arg(long)]
        from: Option<String>,
    },

    /// List episodes of a subject
    Episodes {
        id: SubjectId,

        /// Episode type code (0 = main, 1 = special, 2 = OP, 3 = ED)
        #[arg(long = "type")]
        kind: Option<u8>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        offset: Option<u32>,
    },

    /// List releases for a subject, grouped by subtitle group
    #[command(alias = "res")]
    Resources(ResourceArgs),

    /// Search the resource library
    #[command(alias = "s")]
    Search {
        /// Search query; omit with --resume to reopen the last search
        query: Vec<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        /// Restore the previous results when returning from a detail page
        #[arg(long)]
        resume: bool,
    },

    /// Manage crawler tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Manage scheduled crawl jobs
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Manage subscriptions
    #[command(alias = "subs")]
    Subscriptions {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },

    /// Check backend health
    Health,
}

#[derive(Args)]
pub struct ResourceArgs {
    pub id: SubjectId,

    /// Only releases for this episode
    #[arg(long)]
    pub episode: Option<u32>,

    #[arg(long)]
    pub resolution: Option<String>,

    #[arg(long)]
    pub subtitle_type: Option<String>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub offset: Option<u32>,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List crawler tasks
    #[command(alias = "ls")]
    List {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "10")]
        page_size: u32,
    },

    /// Show a single task
    Show { id: TaskId },

    /// Start a crawl
    Create {
        /// homepage, season, year or full
        mode: String,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        season: Option<String>,

        #[arg(long)]
        start_url: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        /// Follow progress after creating
        #[arg(long)]
        watch: bool,
    },

    /// Cancel a running task
    Cancel { id: TaskId },

    /// Follow live progress until the task finishes
    Watch { id: TaskId },
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// List scheduled jobs
    #[command(alias = "ls")]
    List,

    /// Create a scheduled job
    Create {
        job_id: String,

        name: String,

        /// Cron expression, e.g. "0 3 * * *"
        cron: String,

        /// Crawl parameters as JSON
        #[arg(long, default_value = "{}")]
        parameters: String,

        #[arg(long)]
        description: Option<String>,

        /// Create the job disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Update fields of a scheduled job
    Update {
        job_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        cron: Option<String>,

        /// Crawl parameters as JSON
        #[arg(long)]
        parameters: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Delete a scheduled job
    #[command(alias = "rm")]
    Delete { job_id: String },

    /// Flip a job between enabled and disabled
    Toggle { job_id: String },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    /// List subscriptions
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Subscribe to a subject
    Add { id: SubjectId },

    /// Unsubscribe from a subject
    #[command(alias = "rm")]
    Remove { id: SubjectId },

    /// Show whether a subject is subscribed
    Status { id: SubjectId },
}

pub use commands::*;
