//! Per-user subscriptions. Requires the client to be configured with a user id.

use serde_json::Value;

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{
    SubjectId, Subscription, SubscriptionIds, SubscriptionList, SubscriptionQuery,
    SubscriptionStatus,
};

#[async_trait::async_trait]
pub trait SubscriptionApi: Send + Sync {
    async fn subscribe(&self, id: SubjectId) -> Result<Subscription>;

    async fn list(&self, query: &SubscriptionQuery) -> Result<SubscriptionList>;

    async fn unsubscribe(&self, id: SubjectId) -> Result<()>;

    async fn ids(&self) -> Result<Vec<SubjectId>>;

    async fn status(&self, id: SubjectId) -> Result<SubscriptionStatus>;
}

#[derive(Clone)]
pub struct HttpSubscriptionApi {
    http: HttpClient,
}

impl HttpSubscriptionApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl SubscriptionApi for HttpSubscriptionApi {
    async fn subscribe(&self, id: SubjectId) -> Result<Subscription> {
        self.http.post_empty(&format!("/subscriptions/{id}")).await
    }

    async fn list(&self, query: &SubscriptionQuery) -> Result<SubscriptionList> {
        let mut params = vec![
            ("sort", query.sort.clone()),
            ("order", query.order.clone()),
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        self.http.get("/subscriptions", &params).await
    }

    async fn unsubscribe(&self, id: SubjectId) -> Result<()> {
        let _: Value = self.http.delete(&format!("/subscriptions/{id}")).await?;
        Ok(())
    }

    async fn ids(&self) -> Result<Vec<SubjectId>> {
        let ids: SubscriptionIds = self.http.get("/subscriptions/ids", &[]).await?;
        Ok(ids.ids)
    }

    async fn status(&self, id: SubjectId) -> Result<SubscriptionStatus> {
        self.http.get(&format!("/subscriptions/{id}"), &[]).await
    }
}
