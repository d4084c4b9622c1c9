//! Library search with a snapshot that only survives a trip to a detail page.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::navigation::{Location, NavigationStore};
use super::{LoadState, StoreSettings, read, write};
use crate::constants::{limits, messages, storage::SEARCH_STATE_KEY};
use crate::error::Result;
use crate::models::{CalendarItem, SearchPagination};
use crate::services::{BangumiApi, ResourceApi};
use crate::storage::{self, SessionStorage};
use crate::timer::Debouncer;

/// Page the search view lives on; detail pages return here.
pub const LIBRARY_PATH: &str = "/library";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SearchSnapshot {
    search_query: String,
    search_results: Vec<CalendarItem>,
    pagination: SearchPagination,
    has_searched: bool,
    timestamp: i64,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    results: Vec<CalendarItem>,
    pagination: SearchPagination,
    has_searched: bool,
    load: LoadState,
}

pub struct SearchStore {
    resources: Arc<dyn ResourceApi>,
    bangumi: Arc<dyn BangumiApi>,
    navigation: NavigationStore,
    storage: Arc<dyn SessionStorage>,
    state: Arc<RwLock<SearchState>>,
    persist: Debouncer,
}

impl SearchStore {
    #[must_use]
    pub fn new(
        resources: Arc<dyn ResourceApi>,
        bangumi: Arc<dyn BangumiApi>,
        navigation: NavigationStore,
        storage: Arc<dyn SessionStorage>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            resources,
            bangumi,
            navigation,
            storage,
            state: Arc::new(RwLock::new(SearchState::default())),
            persist: Debouncer::new(settings.persist_debounce),
        }
    }

    #[must_use]
    pub fn query(&self) -> String {
        read(&self.state).query.clone()
    }

    #[must_use]
    pub fn results(&self) -> Vec<CalendarItem> {
        read(&self.state).results.clone()
    }

    #[must_use]
    pub fn pagination(&self) -> SearchPagination {
        read(&self.state).pagination.clone()
    }

    #[must_use]
    pub fn has_searched(&self) -> bool {
        read(&self.state).has_searched
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        read(&self.state).load.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let has_searched = {
            let mut state = write(&self.state);
            state.query = query.into();
            state.has_searched
        };
        if has_searched {
            self.schedule_persist();
        }
    }

    /// Runs the current query for `page`. A blank query does nothing.
    ///
    /// Ids that fail to resolve to a subject are left out of the results.
    pub async fn perform_search(&self, page: u32) -> Result<()> {
        let query = {
            let mut state = write(&self.state);
            if state.query.trim().is_empty() {
                return Ok(());
            }
            state.load = LoadState::Loading;
            state.has_searched = true;
            state.query.clone()
        };

        let found = match self
            .resources
            .search_library(&query, page, Some(limits::SEARCH_PAGE_SIZE))
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(query = %query, "Search failed: {e}");
                write(&self.state).load = LoadState::Failed(messages::SEARCH_FAILED.to_string());
                return Err(e);
            }
        };

        let results: Vec<CalendarItem> = if found.bangumi_ids.is_empty() {
            Vec::new()
        } else {
            self.bangumi
                .batch_subjects(&found.bangumi_ids)
                .await
                .iter()
                .map(|subject| subject.to_calendar_item())
                .collect()
        };

        info!(
            query = %query,
            page,
            ids = found.bangumi_ids.len(),
            resolved = results.len(),
            "Search finished"
        );

        {
            let mut state = write(&self.state);
            state.pagination = found.pagination;
            state.results = results;
            state.load = LoadState::Ready;
        }
        self.schedule_persist();
        Ok(())
    }

    /// Searches `page` if it is within range. Returns whether a search ran.
    pub async fn go_to_page(&self, page: u32) -> Result<bool> {
        let total_pages = read(&self.state).pagination.total_pages;
        if page < 1 || page > total_pages {
            return Ok(false);
        }
        self.perform_search(page).await?;
        Ok(true)
    }

    /// Page numbers around the current page, for a pager.
    #[must_use]
    pub fn visible_pages(&self) -> Vec<u32> {
        read(&self.state)
            .pagination
            .visible_pages(limits::VISIBLE_PAGE_RADIUS)
    }

    /// Restores the last search when coming back from a detail page, and
    /// starts clean otherwise. Returns whether state was restored.
    pub fn restore_from_storage(&self, location: &Location) -> bool {
        let Some(snapshot) =
            storage::read_json::<SearchSnapshot>(self.storage.as_ref(), SEARCH_STATE_KEY)
        else {
            debug!("No search snapshot to restore");
            self.clear();
            return false;
        };

        let returning = self.navigation.is_returning_from_detail(LIBRARY_PATH, location);
        if !returning || snapshot.search_query.is_empty() {
            debug!(returning, "Discarding search snapshot");
            self.clear();
            return false;
        }

        let mut state = write(&self.state);
        state.query = snapshot.search_query;
        state.results = snapshot.search_results;
        state.pagination = snapshot.pagination;
        state.has_searched = snapshot.has_searched;
        state.load = LoadState::Ready;
        debug!(query = %state.query, "Restored search state");
        true
    }

    /// Resets to an empty search and forgets the snapshot.
    pub fn clear(&self) {
        self.persist.cancel();
        *write(&self.state) = SearchState::default();
        storage::discard(self.storage.as_ref(), SEARCH_STATE_KEY);
    }

    /// Writes the snapshot now instead of waiting for the debounce window.
    pub fn flush(&self) {
        self.persist.cancel();
        if read(&self.state).has_searched {
            persist_snapshot(&self.state, self.storage.as_ref());
        }
    }

    fn schedule_persist(&self) {
        let state = Arc::clone(&self.state);
        let storage = Arc::clone(&self.storage);
        self.persist.call(move || persist_snapshot(&state, storage.as_ref()));
    }
}

fn persist_snapshot(state: &RwLock<SearchState>, storage: &dyn SessionStorage) {
    let snapshot = {
        let state = read(state);
        SearchSnapshot {
            search_query: state.query.clone(),
            search_results: state.results.clone(),
            pagination: state.pagination.clone(),
            has_searched: state.has_searched,
            timestamp: Utc::now().timestamp_millis(),
        }
    };
    if let Err(e) = storage::write_json(storage, SEARCH_STATE_KEY, &snapshot) {
        warn!("Failed to persist search state: {e}");
    }
}
