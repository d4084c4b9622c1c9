//! Subscription handlers

use anyhow::Context;

use crate::cli::SubscriptionCommands;
use crate::models::SubscriptionQuery;
use crate::state::AppState;

pub async fn cmd_subscriptions(
    state: &AppState,
    command: SubscriptionCommands,
) -> anyhow::Result<()> {
    match command {
        SubscriptionCommands::List {
            search,
            page,
            limit,
        } => {
            let query = SubscriptionQuery {
                search,
                page,
                limit,
                ..SubscriptionQuery::default()
            };
            let list = state
                .subscriptions
                .list(&query)
                .await
                .context("Failed to list subscriptions")?;

            if list.subscriptions.is_empty() {
                println!("No subscriptions.");
                println!();
                println!("Subscribe with: ikuyo subscriptions add <id>");
                return Ok(());
            }

            println!(
                "Subscriptions ({} total, page {}/{})",
                list.pagination.total,
                list.pagination.page,
                list.pagination.pages.max(1)
            );
            println!("{:-<70}", "");
            for sub in &list.subscriptions {
                let since = sub
                    .subscribed_at()
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("  [{:>6}] {} (since {since})", sub.bangumi_id, sub.display_name());
                if let Some(notes) = sub.notes.as_deref().filter(|n| !n.is_empty()) {
                    println!("           {notes}");
                }
            }
        }
        SubscriptionCommands::Add { id } => {
            state
                .subscriptions
                .subscribe(id)
                .await
                .with_context(|| format!("Failed to subscribe to {id}"))?;
            println!("Subscribed to {id}");
        }
        SubscriptionCommands::Remove { id } => {
            state
                .subscriptions
                .unsubscribe(id)
                .await
                .with_context(|| format!("Failed to unsubscribe from {id}"))?;
            println!("Unsubscribed from {id}");
        }
        SubscriptionCommands::Status { id } => {
            let status = state
                .subscriptions
                .status(id)
                .await
                .with_context(|| format!("Failed to check subscription {id}"))?;
            if status.subscribed {
                println!("Subscribed to {id}");
            } else {
                println!("Not subscribed to {id}");
            }
        }
    }
    Ok(())
}
