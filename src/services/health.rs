use crate::error::Result;
use crate::http::HttpClient;
use crate::models::Health;

#[async_trait::async_trait]
pub trait HealthApi: Send + Sync {
    async fn health(&self) -> Result<Health>;
}

#[derive(Clone)]
pub struct HttpHealthApi {
    http: HttpClient,
}

impl HttpHealthApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl HealthApi for HttpHealthApi {
    async fn health(&self) -> Result<Health> {
        self.http.get("/health", &[]).await
    }
}
