//! Calendar command handler

use anyhow::Context;

use crate::models::CalendarItem;
use crate::state::AppState;

pub async fn cmd_calendar(state: &AppState, refresh: bool, day: Option<u8>) -> anyhow::Result<()> {
    let home = state.home_store();
    home.restore();

    let calendar = home
        .load_calendar(refresh)
        .await
        .context("Failed to load the airing calendar")?;
    home.flush();

    let mut shown = 0;
    for entry in calendar
        .iter()
        .filter(|entry| day.is_none_or(|d| entry.weekday.id == d))
    {
        println!("{} / {} ({} titles)", entry.weekday.en, entry.weekday.cn, entry.items.len());
        println!("{:-<70}", "");
        for item in &entry.items {
            print_item(item);
        }
        println!();
        shown += entry.items.len();
    }

    if shown == 0 {
        println!("Nothing airing.");
    }

    Ok(())
}

fn print_item(item: &CalendarItem) {
    let score = if item.rating.score > 0.0 {
        format!("{:.1}", item.rating.score)
    } else {
        "-".to_string()
    };
    println!("  [{:>6}] {} ★ {score}", item.id, item.display_name());
    if !item.name_cn.is_empty() && item.name_cn != item.name {
        println!("           {}", item.name);
    }
}
