mod anime;
mod calendar;
mod health;
mod init;
mod jobs;
mod resources;
mod search;
mod subscriptions;
mod tasks;

pub use anime::{cmd_anime_info, cmd_episodes};
pub use calendar::cmd_calendar;
pub use health::cmd_health;
pub use init::cmd_init;
pub use jobs::cmd_jobs;
pub use resources::cmd_resources;
pub use search::cmd_search;
pub use subscriptions::cmd_subscriptions;
pub use tasks::cmd_tasks;

use super::Commands;
use crate::state::AppState;

/// Runs a command that talks to the backend.
pub async fn dispatch(state: &AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => cmd_init(),
        Commands::Calendar { refresh, day } => cmd_calendar(state, refresh, day).await,
        Commands::Info { id, from } => cmd_anime_info(state, id, from.as_deref()).await,
        Commands::Episodes {
            id,
            kind,
            limit,
            offset,
        } => cmd_episodes(state, id, kind, limit, offset).await,
        Commands::Resources(args) => cmd_resources(state, args).await,
        Commands::Search {
            query,
            page,
            resume,
        } => cmd_search(state, &query.join(" "), page, resume).await,
        Commands::Tasks { command } => cmd_tasks(state, command).await,
        Commands::Jobs { command } => cmd_jobs(state, command).await,
        Commands::Subscriptions { command } => cmd_subscriptions(state, command).await,
        Commands::Health => cmd_health(state).await,
    }
}
