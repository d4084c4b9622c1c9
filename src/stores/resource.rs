//! Resource listings cached per subject, filter and page.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::{LoadState, read, write};
use crate::constants::messages;
use crate::error::Result;
use crate::models::{ResourceFilter, ResourceListing, SubjectId};
use crate::services::ResourceApi;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceQuery {
    pub bangumi_id: SubjectId,
    pub filter: ResourceFilter,
}

impl ResourceQuery {
    #[must_use]
    pub fn new(bangumi_id: SubjectId) -> Self {
        Self {
            bangumi_id,
            filter: ResourceFilter::default(),
        }
    }

    /// Cache key with defaults applied, so `limit: None` and `limit: 100`
    /// share an entry.
    #[must_use]
    pub fn key(&self) -> QueryKey {
        QueryKey {
            bangumi_id: self.bangumi_id,
            resolution: self.filter.resolution().unwrap_or_default().to_string(),
            subtitle_type: self.filter.subtitle_type().unwrap_or_default().to_string(),
            limit: self.filter.limit(),
            offset: self.filter.offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub bangumi_id: SubjectId,
    pub resolution: String,
    pub subtitle_type: String,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Default)]
struct Entry {
    listing: Option<ResourceListing>,
    load: LoadState,
}

#[derive(Debug, Default)]
struct ResourceState {
    entries: HashMap<QueryKey, Entry>,
    current: Option<ResourceQuery>,
}

pub struct ResourceStore {
    api: Arc<dyn ResourceApi>,
    state: RwLock<ResourceState>,
}

impl ResourceStore {
    #[must_use]
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ResourceState::default()),
        }
    }

    /// Fetches `query`, replacing whatever was cached under its key.
    pub async fn fetch(&self, query: ResourceQuery) -> Result<ResourceListing> {
        let key = query.key();
        {
            let mut state = write(&self.state);
            state.current = Some(query.clone());
            let entry = state.entries.entry(key.clone()).or_default();
            entry.load = LoadState::Loading;
        }

        let result = self
            .api
            .anime_resources(query.bangumi_id, &query.filter)
            .await;

        let mut state = write(&self.state);
        let entry = state.entries.entry(key).or_default();
        match result {
            Ok(listing) => {
                debug!(
                    bangumi_id = query.bangumi_id,
                    total = listing.total_resources,
                    "Cached resource listing"
                );
                entry.listing = Some(listing.clone());
                entry.load = LoadState::Ready;
                Ok(listing)
            }
            Err(e) => {
                warn!(bangumi_id = query.bangumi_id, "Failed to load resources: {e}");
                entry.listing = None;
                entry.load = LoadState::Failed(messages::RESOURCES_LOAD_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Cached listing for `query` if present, fetching it otherwise.
    pub async fn load(&self, query: ResourceQuery) -> Result<ResourceListing> {
        if let Some(listing) = self.get(&query) {
            write(&self.state).current = Some(query);
            return Ok(listing);
        }
        self.fetch(query).await
    }

    /// Re-issues the most recent query. Does nothing before the first fetch.
    pub async fn refresh(&self) -> Result<Option<ResourceListing>> {
        let current = read(&self.state).current.clone();
        match current {
            Some(query) => self.fetch(query).await.map(Some),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn get(&self, query: &ResourceQuery) -> Option<ResourceListing> {
        read(&self.state)
            .entries
            .get(&query.key())
            .and_then(|entry| entry.listing.clone())
    }

    #[must_use]
    pub fn current_query(&self) -> Option<ResourceQuery> {
        read(&self.state).current.clone()
    }

    /// Listing for the most recent query.
    #[must_use]
    pub fn current(&self) -> Option<ResourceListing> {
        let state = read(&self.state);
        let key = state.current.as_ref()?.key();
        state.entries.get(&key)?.listing.clone()
    }

    #[must_use]
    pub fn load_state(&self, query: &ResourceQuery) -> LoadState {
        read(&self.state)
            .entries
            .get(&query.key())
            .map(|entry| entry.load.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.state).entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *write(&self.state) = ResourceState::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::stores::testing::FakeResources;

    fn query(id: SubjectId, resolution: Option<&str>, limit: Option<u32>) -> ResourceQuery {
        ResourceQuery {
            bangumi_id: id,
            filter: ResourceFilter {
                resolution: resolution.map(str::to_string),
                limit,
                ..ResourceFilter::default()
            },
        }
    }

    #[test]
    fn test_keys_normalize_defaults() {
        assert_eq!(query(1, None, None).key(), query(1, Some(""), Some(100)).key());
        assert_eq!(query(1, None, Some(0)).key(), query(1, None, None).key());
        assert_eq!(query(1, None, Some(0)).key().limit, 100);
        assert_ne!(query(1, None, None).key(), query(1, Some("1080p"), None).key());
        assert_ne!(query(1, None, None).key(), query(2, None, None).key());
    }

    #[tokio::test]
    async fn test_each_filter_is_cached_independently() {
        let api = Arc::new(FakeResources::default());
        let store = ResourceStore::new(api.clone());

        store.fetch(query(1, None, None)).await.unwrap();
        store.fetch(query(1, Some("1080p"), None)).await.unwrap();
        assert_eq!(store.len(), 2);

        let cached = store.load(query(1, None, Some(100))).await.unwrap();
        assert_eq!(cached.total_resources, 1);
        assert_eq!(api.listing_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.current().map(|l| l.total_resources), Some(1));
    }

    #[tokio::test]
    async fn test_refresh_reissues_latest_query() {
        let api = Arc::new(FakeResources::default());
        let store = ResourceStore::new(api.clone());
        assert_eq!(store.refresh().await.unwrap(), None);

        store.fetch(query(3, Some("720p"), None)).await.unwrap();
        assert_eq!(store.current_query(), Some(query(3, Some("720p"), None)));
        let refreshed = store.refresh().await.unwrap().unwrap();
        assert_eq!(refreshed.total_resources, 2);
        assert_eq!(api.listing_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
        assert!(store.current().is_none());
        assert!(store.current_query().is_none());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_per_key() {
        let api = Arc::new(FakeResources {
            listings_fail: true,
            ..FakeResources::default()
        });
        let store = ResourceStore::new(api);
        let q = query(1, None, None);

        assert!(store.fetch(q.clone()).await.is_err());
        assert_eq!(store.load_state(&q).error(), Some(messages::RESOURCES_LOAD_FAILED));
        assert!(store.get(&q).is_none());
        assert_eq!(store.load_state(&query(2, None, None)), LoadState::Empty);
    }
}
