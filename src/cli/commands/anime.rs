//! Subject detail and episode list handlers

use anyhow::Context;

use crate::models::{Availability, Episode, EpisodeType, SubjectId};
use crate::services::EpisodeQuery;
use crate::state::AppState;
use crate::stores::Location;

pub async fn cmd_anime_info(
    state: &AppState,
    id: SubjectId,
    from: Option<&str>,
) -> anyhow::Result<()> {
    let detail_path = format!("/anime/{id}");
    if from.is_some() {
        state
            .navigation
            .record_detail_visit(&detail_path, from, &Location::new(&detail_path));
    }

    let detail = state.detail_store();
    detail
        .fetch_all(id)
        .await
        .with_context(|| format!("Failed to load subject {id}"))?;

    let Some(subject) = detail.subject() else {
        println!("Subject {id} not found.");
        return Ok(());
    };

    println!("{}", subject.display_name());
    if subject.display_name() != subject.name {
        println!("{}", subject.name);
    }
    println!("{:-<70}", "");
    println!("  ID:       {}", subject.id);
    println!(
        "  Aired:    {}",
        subject
            .air_date
            .as_deref()
            .or(subject.date.as_deref())
            .unwrap_or("?")
    );
    println!(
        "  Episodes: {}",
        subject
            .total_episodes
            .or(subject.eps)
            .map_or_else(|| "?".to_string(), |n| n.to_string())
    );
    println!(
        "  Rating:   {:.1} ({} votes){}",
        subject.rating.score,
        subject.rating.total,
        subject.rank.map(|r| format!(", rank #{r}")).unwrap_or_default()
    );
    if !subject.tags.is_empty() {
        let tags: Vec<&str> = subject.tags.iter().take(8).map(|t| t.name.as_str()).collect();
        println!("  Tags:     {}", tags.join(", "));
    }
    if !subject.summary.is_empty() {
        println!();
        println!("{}", subject.summary.trim());
    }

    let episodes = detail.main_episodes();
    println!();
    println!("Episodes ({})", episodes.len());
    println!("{:-<70}", "");
    let availability = detail.availability();
    for episode in &episodes {
        print_episode(episode, availability.as_ref());
    }

    if availability.is_none() {
        println!();
        println!("No resources collected for this subject yet.");
    } else if !detail.has_resource() {
        println!();
        println!("No episode has a release yet.");
    }

    Ok(())
}

pub async fn cmd_episodes(
    state: &AppState,
    id: SubjectId,
    kind: Option<u8>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> anyhow::Result<()> {
    let query = EpisodeQuery {
        kind: kind.map(EpisodeType::from),
        limit,
        offset,
    };
    let page = state
        .bangumi
        .episodes(id, query)
        .await
        .with_context(|| format!("Failed to load episodes for subject {id}"))?;

    println!(
        "Episodes {}-{} of {}",
        page.offset + 1,
        page.offset as usize + page.data.len(),
        page.total
    );
    println!("{:-<70}", "");
    for episode in &page.data {
        print_episode(episode, None);
    }

    Ok(())
}

fn print_episode(episode: &Episode, availability: Option<&Availability>) {
    let marker = match availability.map(|a| a.for_episode(episode)) {
        Some(Some(ep)) if ep.available => format!("● {:>3}", ep.resource_count),
        Some(_) => "○    ".to_string(),
        None => String::new(),
    };
    let title = if episode.name_cn.is_empty() {
        &episode.name
    } else {
        &episode.name_cn
    };
    let kind = if episode.kind == EpisodeType::Main {
        String::new()
    } else {
        format!(" [{}]", episode.kind)
    };
    println!(
        "  {marker} {:>4}{kind} {} {}",
        episode.availability_key(),
        episode.airdate.as_deref().unwrap_or(""),
        title
    );
}
