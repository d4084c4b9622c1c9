//! Health command handler

use crate::state::AppState;

pub async fn cmd_health(state: &AppState) -> anyhow::Result<()> {
    let health = state.health.health().await?;

    let indicator = if health.is_healthy() { "✓" } else { "✗" };
    println!("{indicator} Backend {} ({})", health.status, state.http.base_url());
    println!("  Version:  {}", health.version);
    println!("  Database: {}", health.database_status);
    println!("  Time:     {}", health.timestamp);

    if let Some(stats) = &health.cache_stats {
        println!("  Cache:");
        for (key, value) in stats {
            println!("    {key}: {value}");
        }
    }

    Ok(())
}
