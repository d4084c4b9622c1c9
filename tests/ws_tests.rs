//! Live task progress over a real WebSocket.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use ikuyo::live::{ChannelConnector, ChannelEvent, WsConnector};
use ikuyo::models::TaskStatus;
use ikuyo::services::{HttpCrawlerApi, HttpSchedulerApi};
use ikuyo::stores::{CloseReason, TaskEvent, TaskStore};
use serde_json::{Value, json};
use tokio::sync::broadcast;

use common::{client, feedback, serve, task};

#[derive(Clone, Default)]
struct Backend {
    list_calls: Arc<AtomicUsize>,
    client_closed: Arc<AtomicBool>,
}

/// Task 1 reports progress then completes, task 2 pushes an error payload,
/// task 3 stays silent until the client leaves.
async fn progress(socket: WebSocket, task_id: u64, backend: Backend) {
    let script: Vec<Value> = match task_id {
        1 => vec![
            json!({ "task_id": 1, "percentage": 50.0, "processed_items": 5, "total_items": 10 }),
            json!({ "task_id": 1, "percentage": 100.0, "final_status": "completed" }),
        ],
        2 => vec![json!({ "error": "Task not found", "code": "task_not_found" })],
        _ => vec![],
    };

    let mut socket = socket;
    for message in script {
        if socket
            .send(Message::Text(message.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }

    while let Some(Ok(message)) = socket.recv().await {
        if matches!(message, Message::Close(_)) {
            backend.client_closed.store(true, Ordering::SeqCst);
            break;
        }
    }
}

async fn upgrade(
    Path(task_id): Path<u64>,
    State(backend): State<Backend>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| progress(socket, task_id, backend))
}

async fn setup() -> (String, Backend) {
    let backend = Backend::default();
    let api = Router::new()
        .route(
            "/crawler/tasks",
            get(|State(backend): State<Backend>| async move {
                backend.list_calls.fetch_add(1, Ordering::SeqCst);
                Json(json!([task(1, "running"), task(2, "running"), task(3, "running")]))
            }),
        )
        .route("/crawler/tasks/{id}/ws", get(upgrade))
        .with_state(backend.clone());
    (serve(api).await, backend)
}

fn store(base: &str) -> TaskStore {
    let http = client(base, &feedback());
    TaskStore::new(
        Arc::new(HttpCrawlerApi::new(http.clone())),
        Arc::new(HttpSchedulerApi::new(http)),
        Arc::new(WsConnector::new(base).expect("ws connector")),
    )
}

async fn closed_event(events: &mut broadcast::Receiver<TaskEvent>, id: u64) -> CloseReason {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for channel close")
            .expect("event stream ended");
        if let TaskEvent::ChannelClosed { task_id, reason } = event
            && task_id == id
        {
            return reason;
        }
    }
}

async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn connector_streams_pushed_objects() {
    let (base, _) = setup().await;
    let connector = WsConnector::new(&base).expect("ws connector");
    assert!(connector.task_url(1).starts_with("ws://127.0.0.1:"));

    let mut channel = connector.connect(1).await.expect("connect");
    assert_eq!(channel.task_id(), 1);

    let Some(ChannelEvent::Message(first)) = channel.next().await else {
        panic!("expected a progress message");
    };
    assert_eq!(first.get("percentage"), Some(&json!(50.0)));

    let Some(ChannelEvent::Message(last)) = channel.next().await else {
        panic!("expected the final message");
    };
    assert_eq!(last.get("final_status"), Some(&json!("completed")));
    channel.close();
}

#[tokio::test]
async fn terminal_status_closes_the_channel() {
    let (base, backend) = setup().await;
    let tasks = store(&base);
    tasks.fetch_tasks().await.expect("tasks");
    let mut events = tasks.subscribe();

    assert!(tasks.start_progress(1).await.expect("start"));
    let reason = closed_event(&mut events, 1).await;
    assert_eq!(reason, CloseReason::Finished(TaskStatus::Completed));

    let task = tasks.task(1).expect("task 1");
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.percentage, Some(100.0));
    assert_eq!(task.processed_items, Some(5));
    assert!(!tasks.is_tracking(1));
    assert!(eventually(|| backend.client_closed.load(Ordering::SeqCst)).await);
}

#[tokio::test]
async fn error_payload_tears_down_and_refetches() {
    let (base, backend) = setup().await;
    let tasks = store(&base);
    tasks.fetch_tasks().await.expect("tasks");
    let mut events = tasks.subscribe();

    tasks.start_progress(2).await.expect("start");
    let reason = closed_event(&mut events, 2).await;
    assert!(matches!(reason, CloseReason::Failed(ref m) if m.contains("task_not_found")));
    assert!(!tasks.is_tracking(2));
    assert!(eventually(|| backend.list_calls.load(Ordering::SeqCst) == 2).await);
}

#[tokio::test]
async fn stop_all_closes_open_channels() {
    let (base, backend) = setup().await;
    let tasks = store(&base);

    tasks.start_progress(3).await.expect("start");
    assert_eq!(tasks.tracked(), vec![3]);

    tasks.stop_all();
    assert!(tasks.tracked().is_empty());
    assert!(eventually(|| backend.client_closed.load(Ordering::SeqCst)).await);
}
