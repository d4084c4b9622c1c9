//! Page stores wired through `AppState` against a mock backend.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use ikuyo::config::Config;
use ikuyo::constants::storage::SEARCH_STATE_KEY;
use ikuyo::state::AppState;
use ikuyo::storage::{MemoryStorage, SessionStorage};
use ikuyo::stores::search::LIBRARY_PATH;
use ikuyo::stores::{LoadState, Location};
use serde_json::json;

use common::{ok, serve, subject};

#[derive(Clone, Default)]
struct Counters {
    calendar: Arc<AtomicUsize>,
}

async fn subject_route(Path(id): Path<u32>) -> Response {
    if id == 2 {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Subject not found" }))).into_response();
    }
    ok(subject(id)).into_response()
}

fn api(counters: Counters) -> Router {
    Router::new()
        .route(
            "/bangumi/calendar",
            get(|State(counters): State<Counters>| async move {
                counters.calendar.fetch_add(1, Ordering::SeqCst);
                ok(json!([{
                    "weekday": { "en": "Fri", "cn": "星期五", "ja": "金耀日", "id": 5 },
                    "items": [subject(1), subject(3)]
                }]))
            }),
        )
        .route("/bangumi/subjects/{id}", get(subject_route))
        .route(
            "/bangumi/subjects/{id}/episodes",
            get(|| async {
                ok(json!({
                    "data": [
                        { "id": 11, "type": 0, "sort": 1, "ep": 1, "name": "Ep 1" },
                        { "id": 12, "type": 0, "sort": 2, "ep": 2, "name": "Ep 2" },
                        { "id": 13, "type": 3, "sort": 1, "name": "ED" }
                    ],
                    "total": 3, "limit": 1000, "offset": 0
                }))
            }),
        )
        .route(
            "/animes/{id}/episodes/availability",
            get(|Path(id): Path<u32>| async move {
                if id == 1 {
                    ok(json!({
                        "bangumi_id": 1,
                        "episodes": { "1": { "available": true, "resource_count": 4 } }
                    }))
                    .into_response()
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "detail": "No data" }))).into_response()
                }
            }),
        )
        .route(
            "/animes/search",
            get(|RawQuery(query): RawQuery| async move {
                let page: u32 = query
                    .as_deref()
                    .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("page=")))
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1);
                ok(json!({
                    "bangumi_ids": [1, 2, 3],
                    "pagination": {
                        "current_page": page, "per_page": 12, "total": 30,
                        "total_pages": 3, "has_next": page < 3, "has_prev": page > 1
                    }
                }))
            }),
        )
        .with_state(counters)
}

async fn app() -> (AppState, Arc<MemoryStorage>, Counters) {
    let counters = Counters::default();
    let base = serve(api(counters.clone())).await;

    let mut config = Config::default();
    config.api.base_url = base;
    config.feedback.toast_duration_ms = 30_000;
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::with_storage(config, storage.clone()).expect("app state");
    (state, storage, counters)
}

#[tokio::test]
async fn calendar_is_cached_between_views() {
    let (state, _, counters) = app().await;

    let home = state.home_store();
    let calendar = home.load_calendar(false).await.expect("calendar");
    assert_eq!(calendar[0].items.len(), 2);
    home.flush();

    let revisit = state.home_store();
    assert!(revisit.restore());
    assert!(revisit.is_cache_valid());
    revisit.load_calendar(false).await.expect("calendar");
    assert_eq!(counters.calendar.load(Ordering::SeqCst), 1);

    revisit.load_calendar(true).await.expect("calendar");
    assert_eq!(counters.calendar.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn search_survives_a_detail_round_trip() {
    let (state, storage, _) = app().await;

    let search = state.search_store();
    search.set_query("frieren");
    search.perform_search(1).await.expect("search");
    let ids: Vec<u32> = search.results().iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(state.feedback.toasts().len(), 1);

    assert!(search.go_to_page(2).await.expect("page 2"));
    assert_eq!(search.pagination().current_page, 2);
    search.flush();
    assert!(storage.get(SEARCH_STATE_KEY).is_some());

    state
        .navigation
        .record_detail_visit("/anime/3", Some(LIBRARY_PATH), &Location::new("/anime/3"));
    let back = state.search_store();
    assert!(back.restore_from_storage(&Location::new(LIBRARY_PATH)));
    assert_eq!(back.query(), "frieren");
    assert_eq!(back.pagination().current_page, 2);

    let fresh = state.search_store();
    assert!(!fresh.restore_from_storage(&Location::new(LIBRARY_PATH)));
    assert!(storage.get(SEARCH_STATE_KEY).is_none());
}

#[tokio::test]
async fn detail_loads_without_availability_silently() {
    let (state, _, _) = app().await;

    let detail = state.detail_store();
    detail.fetch_all(3).await.expect("detail");
    assert_eq!(detail.load_state(), LoadState::Ready);
    assert_eq!(detail.main_episodes().len(), 2);
    assert!(detail.availability().is_none());
    assert!(state.feedback.toasts().is_empty());

    detail.fetch_all(1).await.expect("detail");
    assert!(detail.has_resource());
    let first = &detail.main_episodes()[0];
    assert_eq!(
        detail
            .availability()
            .and_then(|a| a.for_episode(first))
            .map(|ep| ep.resource_count),
        Some(4)
    );
}

#[tokio::test]
async fn missing_subject_fails_detail_with_one_toast() {
    let (state, _, _) = app().await;

    let detail = state.detail_store();
    assert!(detail.fetch_all(2).await.is_err());
    assert!(detail.load_state().error().is_some());
    assert_eq!(state.feedback.toasts().len(), 1);
}
