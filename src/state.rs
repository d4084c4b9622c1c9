use std::sync::Arc;

use crate::config::Config;
use crate::feedback::FeedbackStore;
use crate::http::HttpClient;
use crate::live::{ChannelConnector, WsConnector};
use crate::services::{
    BangumiApi, CrawlerApi, HealthApi, HttpBangumiApi, HttpCrawlerApi, HttpHealthApi,
    HttpResourceApi, HttpSchedulerApi, HttpSubscriptionApi, ResourceApi, SchedulerApi,
    SubscriptionApi,
};
use crate::storage::{FileStorage, MemoryStorage, SessionStorage};
use crate::stores::{
    AnimeDetailStore, HomeStore, NavigationStore, ResourceStore, SearchStore, StoreSettings,
    TaskStore,
};

/// Services and shared infrastructure, wired once per process.
///
/// Stores are created on demand since each one is scoped to a single view.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub feedback: FeedbackStore,

    pub http: HttpClient,

    pub storage: Arc<dyn SessionStorage>,

    pub navigation: NavigationStore,

    pub bangumi: Arc<dyn BangumiApi>,

    pub resources: Arc<dyn ResourceApi>,

    pub crawler: Arc<dyn CrawlerApi>,

    pub scheduler: Arc<dyn SchedulerApi>,

    pub subscriptions: Arc<dyn SubscriptionApi>,

    pub health: Arc<dyn HealthApi>,

    pub connector: Arc<dyn ChannelConnector>,

    store_settings: StoreSettings,
}

impl AppState {
    /// Wires everything against the configured backend with file-backed
    /// session storage.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let storage: Arc<dyn SessionStorage> = match config.session_path() {
            Some(path) => Arc::new(FileStorage::open(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<dyn SessionStorage>) -> anyhow::Result<Self> {
        let feedback = FeedbackStore::new(config.feedback_settings());
        let http = HttpClient::new(config.http_settings(), feedback.clone())?;
        let connector = WsConnector::new(http.base_url())?;

        Ok(Self {
            store_settings: config.store_settings(),
            config: Arc::new(config),
            navigation: NavigationStore::new(storage.clone()),
            storage,
            bangumi: Arc::new(HttpBangumiApi::new(http.clone())),
            resources: Arc::new(HttpResourceApi::new(http.clone())),
            crawler: Arc::new(HttpCrawlerApi::new(http.clone())),
            scheduler: Arc::new(HttpSchedulerApi::new(http.clone())),
            subscriptions: Arc::new(HttpSubscriptionApi::new(http.clone())),
            health: Arc::new(HttpHealthApi::new(http.clone())),
            connector: Arc::new(connector),
            feedback,
            http,
        })
    }

    #[must_use]
    pub fn home_store(&self) -> HomeStore {
        HomeStore::new(self.bangumi.clone(), self.storage.clone(), self.store_settings)
    }

    #[must_use]
    pub fn search_store(&self) -> SearchStore {
        SearchStore::new(
            self.resources.clone(),
            self.bangumi.clone(),
            self.navigation.clone(),
            self.storage.clone(),
            self.store_settings,
        )
    }

    #[must_use]
    pub fn detail_store(&self) -> AnimeDetailStore {
        AnimeDetailStore::new(self.bangumi.clone(), self.resources.clone())
    }

    #[must_use]
    pub fn resource_store(&self) -> ResourceStore {
        ResourceStore::new(self.resources.clone())
    }

    #[must_use]
    pub fn task_store(&self) -> TaskStore {
        TaskStore::new(
            self.crawler.clone(),
            self.scheduler.clone(),
            self.connector.clone(),
        )
    }
}
