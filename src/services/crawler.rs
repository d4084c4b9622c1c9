//! Crawler task administration.

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::{Task, TaskCreate, TaskId, TaskProgress};

#[async_trait::async_trait]
pub trait CrawlerApi: Send + Sync {
    /// Starts a crawl and returns the created task.
    async fn create_task(&self, request: &TaskCreate) -> Result<Task>;

    async fn list_tasks(&self, page: u32, page_size: u32) -> Result<Vec<Task>>;

    async fn get_task(&self, id: TaskId) -> Result<Task>;

    /// Cancels a task and returns it in its post-cancel state.
    async fn cancel_task(&self, id: TaskId) -> Result<Task>;

    async fn task_progress(&self, id: TaskId) -> Result<TaskProgress>;
}

#[derive(Clone)]
pub struct HttpCrawlerApi {
    http: HttpClient,
}

impl HttpCrawlerApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl CrawlerApi for HttpCrawlerApi {
    async fn create_task(&self, request: &TaskCreate) -> Result<Task> {
        self.http.post("/crawler/tasks", request).await
    }

    async fn list_tasks(&self, page: u32, page_size: u32) -> Result<Vec<Task>> {
        let params = [
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.http.get("/crawler/tasks", &params).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.http.get(&format!("/crawler/tasks/{id}"), &[]).await
    }

    async fn cancel_task(&self, id: TaskId) -> Result<Task> {
        self.http.delete(&format!("/crawler/tasks/{id}")).await
    }

    async fn task_progress(&self, id: TaskId) -> Result<TaskProgress> {
        self.http
            .get(&format!("/crawler/tasks/{id}/progress"), &[])
            .await
    }
}
