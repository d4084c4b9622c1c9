//! Live task progress channels.
//!
//! A [`TaskChannel`] is a receive-only stream of JSON objects pushed by the
//! backend for one crawler task, plus a handle to close it. The WebSocket
//! implementation lives here; stores only see the [`ChannelConnector`] trait.

use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use crate::constants::intervals;
use crate::error::{ApiError, Result};
use crate::models::TaskId;

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// One pushed JSON object.
    Message(Map<String, Value>),
    /// Transport failure. No further events follow.
    Error(String),
    /// The remote side closed the channel.
    Closed,
}

/// Closes a channel from any holder. Closing twice is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ChannelCloser {
    signal: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl ChannelCloser {
    pub fn close(&self) {
        let sender = self
            .signal
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.signal
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_none_or(oneshot::Sender::is_closed)
    }
}

/// Producer half of a channel, held by whatever pumps events in.
#[derive(Debug)]
pub struct ChannelFeed {
    pub events: mpsc::Sender<ChannelEvent>,
    /// Resolves when the consumer closes or drops the channel.
    pub closed: oneshot::Receiver<()>,
}

#[derive(Debug)]
pub struct TaskChannel {
    task_id: TaskId,
    events: mpsc::Receiver<ChannelEvent>,
    closer: ChannelCloser,
}

impl TaskChannel {
    /// Creates a connected producer/consumer pair.
    #[must_use]
    pub fn pipe(task_id: TaskId) -> (ChannelFeed, Self) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();
        let feed = ChannelFeed {
            events: events_tx,
            closed: close_rx,
        };
        let channel = Self {
            task_id,
            events: events_rx,
            closer: ChannelCloser {
                signal: Arc::new(Mutex::new(Some(close_tx))),
            },
        };
        (feed, channel)
    }

    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Next event, or `None` once the producer is gone.
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    pub fn close(&self) {
        self.closer.close();
    }

    #[must_use]
    pub fn closer(&self) -> ChannelCloser {
        self.closer.clone()
    }

    #[must_use]
    pub fn into_parts(self) -> (mpsc::Receiver<ChannelEvent>, ChannelCloser) {
        (self.events, self.closer)
    }
}

/// Opens a live progress channel for a task.
#[async_trait::async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(&self, task_id: TaskId) -> Result<TaskChannel>;
}

/// WebSocket channels at `{base}/crawler/tasks/{id}/ws`, with the base URL's
/// scheme swapped to `ws`/`wss`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base: String,
}

impl WsConnector {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let mut url = Url::parse(api_base_url)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| ApiError::Setup(format!("cannot derive websocket url from {api_base_url}")))?;

        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn task_url(&self, task_id: TaskId) -> String {
        format!("{}/crawler/tasks/{task_id}/ws", self.base)
    }
}

#[async_trait::async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&self, task_id: TaskId) -> Result<TaskChannel> {
        let url = self.task_url(task_id);
        debug!(task_id, url = %url, "Opening task channel");

        let (stream, _) = tokio::time::timeout(
            intervals::REQUEST_TIMEOUT,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        .map_err(|_| ApiError::Channel(format!("timed out connecting to {url}")))?
        .map_err(|e| ApiError::Channel(e.to_string()))?;

        let (feed, channel) = TaskChannel::pipe(task_id);
        tokio::spawn(pump(task_id, stream, feed));
        Ok(channel)
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn pump(task_id: TaskId, stream: WsStream, mut feed: ChannelFeed) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = &mut feed.closed => {
                debug!(task_id, "Closing task channel");
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            frame = source.next() => {
                let event = match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Value>(text.as_str()) {
                            Ok(Value::Object(map)) => ChannelEvent::Message(map),
                            Ok(other) => {
                                warn!(task_id, "Ignoring non-object channel payload: {other}");
                                continue;
                            }
                            Err(e) => {
                                warn!(task_id, "Ignoring unreadable channel payload: {e}");
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => ChannelEvent::Closed,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => ChannelEvent::Error(e.to_string()),
                };

                let last = !matches!(event, ChannelEvent::Message(_));
                if feed.events.send(event).await.is_err() || last {
                    break;
                }
            }
        }
    }
}
