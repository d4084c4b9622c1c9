//! Library search handler

use anyhow::Context;

use crate::state::AppState;
use crate::stores::Location;
use crate::stores::search::LIBRARY_PATH;

pub async fn cmd_search(state: &AppState, query: &str, page: u32, resume: bool) -> anyhow::Result<()> {
    let search = state.search_store();

    if resume && search.restore_from_storage(&Location::new(LIBRARY_PATH)) {
        println!("Restored search for \"{}\"", search.query());
    } else if query.trim().is_empty() {
        println!("Usage: ikuyo search <query>");
        println!("Example: ikuyo search \"Frieren\"");
        return Ok(());
    }

    if !query.trim().is_empty() && query != search.query() {
        search.set_query(query);
        search
            .perform_search(page)
            .await
            .with_context(|| format!("Search for \"{query}\" failed"))?;
    } else if search.pagination().current_page != page && !search.go_to_page(page).await? {
        println!("Page {page} is out of range.");
    }
    search.flush();

    let results = search.results();
    let pagination = search.pagination();
    if results.is_empty() {
        println!("No results for \"{}\".", search.query());
        return Ok(());
    }

    println!(
        "Results for \"{}\" ({} total, page {}/{})",
        search.query(),
        pagination.total,
        pagination.current_page,
        pagination.total_pages
    );
    println!("{:-<70}", "");
    for item in &results {
        println!("  [{:>6}] {}", item.id, item.display_name());
        if !item.air_date.is_empty() {
            println!("           aired {}", item.air_date);
        }
    }

    if pagination.total_pages > 1 {
        let pages: Vec<String> = search
            .visible_pages()
            .iter()
            .map(|p| {
                if *p == pagination.current_page {
                    format!("[{p}]")
                } else {
                    p.to_string()
                }
            })
            .collect();
        println!();
        println!("Pages: {}", pages.join(" "));
    }
    println!();
    println!("Open one with: ikuyo info <id> --from {LIBRARY_PATH}");

    Ok(())
}
