//! Aggregated releases and the local library index.

use crate::constants::limits;
use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{Availability, LibrarySearch, ResourceFilter, ResourceListing, SubjectId};

#[async_trait::async_trait]
pub trait ResourceApi: Send + Sync {
    /// Releases for a subject, grouped by subtitle group.
    async fn anime_resources(&self, id: SubjectId, filter: &ResourceFilter)
    -> Result<ResourceListing>;

    /// Releases for a single episode. A 404 here is reported silently.
    async fn episode_resources(&self, id: SubjectId, episode: u32) -> Result<ResourceListing>;

    /// Which episodes have releases. A 404 means "nothing indexed yet".
    async fn availability(&self, id: SubjectId) -> Result<Availability>;

    /// Full-text search over the library; `limit` defaults to 12.
    async fn search_library(
        &self,
        query: &str,
        page: u32,
        limit: Option<u32>,
    ) -> Result<LibrarySearch>;
}

#[derive(Clone)]
pub struct HttpResourceApi {
    http: HttpClient,
}

impl HttpResourceApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

fn filter_params(filter: &ResourceFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(4);
    if let Some(resolution) = filter.resolution() {
        params.push(("resolution", resolution.to_string()));
    }
    if let Some(subtitle_type) = filter.subtitle_type() {
        params.push(("subtitle_type", subtitle_type.to_string()));
    }
    params.push(("limit", filter.limit().to_string()));
    params.push(("offset", filter.offset().to_string()));
    params
}

#[async_trait::async_trait]
impl ResourceApi for HttpResourceApi {
    async fn anime_resources(
        &self,
        id: SubjectId,
        filter: &ResourceFilter,
    ) -> Result<ResourceListing> {
        self.http
            .get(&format!("/animes/{id}/resources"), &filter_params(filter))
            .await
    }

    async fn episode_resources(&self, id: SubjectId, episode: u32) -> Result<ResourceListing> {
        self.http
            .get(
                &format!("/animes/{id}/resources"),
                &[("episode", episode.to_string())],
            )
            .await
    }

    async fn availability(&self, id: SubjectId) -> Result<Availability> {
        self.http
            .get(&format!("/animes/{id}/episodes/availability"), &[])
            .await
    }

    async fn search_library(
        &self,
        query: &str,
        page: u32,
        limit: Option<u32>,
    ) -> Result<LibrarySearch> {
        let params = [
            ("q", query.to_string()),
            ("page", page.to_string()),
            (
                "limit",
                limit.unwrap_or(limits::SEARCH_PAGE_SIZE).to_string(),
            ),
        ];
        self.http.get("/animes/search", &params).await
    }
}
