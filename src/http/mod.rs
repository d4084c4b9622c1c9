//! The single HTTP adapter every service goes through.
//!
//! It unwraps the response envelope, classifies failures and reports them to
//! the [`FeedbackStore`] exactly once, so callers only ever see `data` or an
//! [`ApiError`].

pub mod envelope;

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use reqwest::{Client, Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::constants::{self, intervals, messages};
use crate::error::{ApiError, Result};
use crate::feedback::{FeedbackStore, Severity};

pub use envelope::Unwrapped;

/// Query pairs appended to a request URL.
pub type Query<'a> = &'a [(&'a str, String)];

/// Decoded payload plus the envelope's `total`, for paginated routes.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub data: T,
    pub total: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,

    pub timeout: Duration,

    /// Sent as `X-User-Id` when set.
    pub user_id: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_API_BASE_URL.to_string(),
            timeout: intervals::REQUEST_TIMEOUT,
            user_id: None,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    feedback: FeedbackStore,
}

fn availability_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/animes/\d+/episodes/availability/?$").expect("Invalid regex")
    })
}

fn resources_path() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/animes/\d+/resources/?$").expect("Invalid regex"))
}

/// Requests whose 404 means "no data yet" rather than a failure.
#[must_use]
pub fn is_optional_data(method: &Method, path: &str, query: Query<'_>) -> bool {
    if *method != Method::GET {
        return false;
    }
    availability_path().is_match(path)
        || (resources_path().is_match(path) && query.iter().any(|(k, _)| *k == "episode"))
}

impl HttpClient {
    pub fn new(settings: HttpSettings, feedback: FeedbackStore) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(user_id) = settings.user_id.as_deref() {
            let value = header::HeaderValue::from_str(user_id)
                .map_err(|e| ApiError::Setup(format!("invalid user id: {e}")))?;
            headers.insert("x-user-id", value);
        }

        let client = Client::builder()
            .user_agent(constants::USER_AGENT)
            .timeout(settings.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Setup(e.to_string()))?;

        Url::parse(&settings.base_url)?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            feedback,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Base URL plus `path`, with `query` appended.
    pub fn url(&self, path: &str, query: Query<'_>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T> {
        let unwrapped = self.send(Method::GET, path, query, None).await?;
        self.decode(path, unwrapped.data)
    }

    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<Paged<T>> {
        let unwrapped = self.send(Method::GET, path, query, None).await?;
        Ok(Paged {
            data: self.decode(path, unwrapped.data)?,
            total: unwrapped.total,
        })
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let unwrapped = self.send(Method::POST, path, &[], Some(body)).await?;
        self.decode(path, unwrapped.data)
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let unwrapped = self.send(Method::POST, path, &[], None).await?;
        self.decode(path, unwrapped.data)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let unwrapped = self.send(Method::PUT, path, &[], Some(body)).await?;
        self.decode(path, unwrapped.data)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let unwrapped = self.send(Method::DELETE, path, &[], None).await?;
        self.decode(path, unwrapped.data)
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, data: Value) -> Result<T> {
        serde_json::from_value(data).map_err(|e| {
            warn!(path, "Response did not match the expected shape: {e}");
            self.report(ApiError::Decode(e.to_string()))
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
    ) -> Result<Unwrapped> {
        let url = self.url(path, query).map_err(|e| self.report(e))?;
        let silent_not_found = is_optional_data(&method, path, query);

        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "api_request",
            request_id = %request_id,
            method = %method,
            path = %path,
        );

        async move {
            let _loading = self.feedback.begin_loading();
            let start = Instant::now();

            let mut request = self
                .client
                .request(method.clone(), url)
                .header("x-request-id", request_id.as_str());
            if let Some(body) = body {
                request = request.json(&body);
            }

            let outcome = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.bytes().await {
                        Ok(bytes) if status.is_success() => {
                            envelope::unwrap_body(&bytes).map_err(|e| self.report(e))
                        }
                        Ok(bytes) => {
                            let message = envelope::server_message(&bytes);
                            let silent = silent_not_found && status.as_u16() == 404;
                            Err(self.report(ApiError::from_status(
                                status.as_u16(),
                                message,
                                silent,
                            )))
                        }
                        Err(e) => Err(self.report(ApiError::Connectivity(e.to_string()))),
                    }
                }
                Err(e) => Err(self.report(ApiError::Connectivity(e.to_string()))),
            };

            let status = match &outcome {
                Ok(_) => "ok".to_string(),
                Err(e) => e.status().map_or_else(|| "none".to_string(), |s| s.to_string()),
            };
            let labels = [("method", method.to_string()), ("status", status)];
            metrics::counter!("ikuyo_api_requests_total", &labels).increment(1);
            metrics::histogram!("ikuyo_api_request_duration_seconds", &labels)
                .record(start.elapsed().as_secs_f64());

            match &outcome {
                Ok(_) => debug!(
                    event = "api_request_finished",
                    duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Request finished"
                ),
                Err(e) => info!(
                    event = "api_request_failed",
                    duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    silent = e.is_silent(),
                    error = %e,
                    "Request failed"
                ),
            }

            outcome
        }
        .instrument(span)
        .await
    }

    /// Applies the user-visible side effect for a failure and hands it back.
    fn report(&self, error: ApiError) -> ApiError {
        match &error {
            ApiError::NotFound { silent: true, .. } => {}
            ApiError::Authentication { .. } => {
                self.feedback
                    .push_toast(messages::AUTH_FAILED, Severity::Error);
                self.feedback.redirect_to_login();
            }
            other => {
                self.feedback.push_toast(other.user_message(), Severity::Error);
            }
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpClient {
        let settings = HttpSettings {
            base_url: base_url.to_string(),
            ..HttpSettings::default()
        };
        HttpClient::new(settings, FeedbackStore::default()).unwrap()
    }

    #[test]
    fn test_optional_data_whitelist() {
        let episode = [("episode", "3".to_string())];

        assert!(is_optional_data(
            &Method::GET,
            "/animes/12/episodes/availability",
            &[]
        ));
        assert!(is_optional_data(&Method::GET, "/animes/12/resources", &episode));
        assert!(!is_optional_data(&Method::GET, "/animes/12/resources", &[]));
        assert!(!is_optional_data(&Method::POST, "/animes/12/resources", &episode));
        assert!(!is_optional_data(&Method::GET, "/animes/12/episodes", &[]));
        assert!(!is_optional_data(&Method::GET, "/bangumi/subjects/12", &[]));
    }

    #[test]
    fn test_url_building() {
        let http = client("http://localhost:8000/api/v1/");
        assert_eq!(http.base_url(), "http://localhost:8000/api/v1");

        let url = http
            .url(
                "/animes/search",
                &[("q", "frieren & co".to_string()), ("page", "2".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/v1/animes/search?q=frieren+%26+co&page=2"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let settings = HttpSettings {
            base_url: "not a url".to_string(),
            ..HttpSettings::default()
        };
        assert!(HttpClient::new(settings, FeedbackStore::default()).is_err());
    }
}
