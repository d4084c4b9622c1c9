//! Mock backend and client helpers shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::Json;
use axum::Router;
use ikuyo::feedback::{FeedbackSettings, FeedbackStore};
use ikuyo::http::{HttpClient, HttpSettings};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Serves `api` under `/api/v1` on an ephemeral port and returns the base URL.
pub async fn serve(api: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");
    let app = Router::new().nest("/api/v1", api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock backend");
    });
    format!("http://{addr}/api/v1")
}

pub fn feedback() -> FeedbackStore {
    FeedbackStore::new(FeedbackSettings {
        loading_delay: Duration::from_millis(50),
        toast_duration: Duration::from_secs(30),
    })
}

pub fn client(base_url: &str, feedback: &FeedbackStore) -> HttpClient {
    let settings = HttpSettings {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        user_id: Some("user-7".to_string()),
    };
    HttpClient::new(settings, feedback.clone()).expect("http client")
}

/// `{success: true, data}` envelope.
pub fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub fn subject(id: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Subject {id}"),
        "name_cn": format!("作品 {id}"),
        "summary": "",
        "air_date": "2024-10-04",
        "air_weekday": 5,
        "rating": { "total": 100, "count": {}, "score": 8.5 },
        "images": { "large": "", "common": "", "medium": "", "small": "", "grid": "" },
        "tags": [{ "name": "fantasy", "count": 10 }]
    })
}

pub fn task(id: u64, status: &str) -> Value {
    json!({
        "id": id,
        "task_type": "manual",
        "status": status,
        "parameters": "{\"mode\": \"homepage\"}",
        "created_at": "2024-10-04T12:00:00",
        "percentage": 0.0
    })
}
