//! Resource listing handler

use anyhow::Context;

use crate::cli::ResourceArgs;
use crate::models::{ResourceFilter, ResourceListing};
use crate::state::AppState;
use crate::stores::resource::ResourceQuery;

pub async fn cmd_resources(state: &AppState, args: ResourceArgs) -> anyhow::Result<()> {
    let listing = match args.episode {
        Some(episode) => match state.resources.episode_resources(args.id, episode).await {
            Ok(listing) => listing,
            Err(e) if e.is_not_found() => {
                println!("No releases for episode {episode} yet.");
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load releases for subject {} episode {episode}", args.id)
                });
            }
        },
        None => {
            let query = ResourceQuery {
                bangumi_id: args.id,
                filter: ResourceFilter {
                    resolution: args.resolution,
                    subtitle_type: args.subtitle_type,
                    limit: args.limit,
                    offset: args.offset,
                },
            };
            state
                .resource_store()
                .load(query)
                .await
                .with_context(|| format!("Failed to load releases for subject {}", args.id))?
        }
    };

    print_listing(&listing);
    Ok(())
}

fn print_listing(listing: &ResourceListing) {
    if listing.is_empty() {
        println!("No releases found.");
        return;
    }

    println!(
        "{} releases from {} groups",
        listing.total_resources,
        listing.subtitle_groups.len()
    );

    for group in &listing.subtitle_groups {
        println!();
        println!("{} ({})", group.name, group.resource_count);
        println!("{:-<70}", "");
        for release in &group.resources {
            let tags: Vec<&str> = [
                release.resolution.as_deref(),
                release.subtitle_type.as_deref(),
                release.file_size.as_deref(),
            ]
            .into_iter()
            .flatten()
            .collect();
            println!("  {}", release.title);
            if !tags.is_empty() {
                println!("    {}", tags.join(" | "));
            }
            if let Some(magnet) = &release.magnet_url {
                println!("    {magnet}");
            }
        }
    }

    let page = &listing.pagination;
    if page.total > page.offset + page.limit {
        println!();
        println!(
            "Showing {}-{} of {}, use --offset {} for more",
            page.offset + 1,
            page.offset + page.limit,
            page.total,
            page.offset + page.limit
        );
    }
}
