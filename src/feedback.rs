//! Session-wide UI feedback: loading indicator, toast queue, modal error.
//!
//! One [`FeedbackStore`] is created with the application context and shared
//! (it is a cheap `Clone`) by the HTTP adapter and every page store. Changes
//! are published on a broadcast channel so a front end can render them.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::constants::{LOGIN_PATH, intervals};
use crate::timer::{self, TimerHandle};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum FeedbackEvent {
    LoadingChanged(bool),
    ToastPushed(Toast),
    ToastRemoved(u64),
    ErrorShown(String),
    ErrorCleared,
    Redirect(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FeedbackSettings {
    pub loading_delay: Duration,
    pub toast_duration: Duration,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            loading_delay: intervals::LOADING_SHOW_DELAY,
            toast_duration: intervals::TOAST_DURATION,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    loading: bool,
    in_flight: usize,
    show_timer: Option<TimerHandle>,
    show_generation: u64,
    toasts: Vec<Toast>,
    last_toast_id: u64,
    error_message: Option<String>,
    redirect: Option<String>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    events: broadcast::Sender<FeedbackEvent>,
    settings: FeedbackSettings,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: FeedbackEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.events.send(event);
    }

    fn finish_show(&self, generation: u64) {
        let mut state = self.lock();
        if state.show_generation != generation {
            return;
        }
        state.show_timer = None;
        if state.in_flight > 0 && !state.loading {
            state.loading = true;
            self.emit(FeedbackEvent::LoadingChanged(true));
        }
    }

    fn expire_toast(&self, id: u64) {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        if state.toasts.len() != before {
            self.emit(FeedbackEvent::ToastRemoved(id));
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackStore {
    inner: Arc<Inner>,
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new(FeedbackSettings::default())
    }
}

impl FeedbackStore {
    #[must_use]
    pub fn new(settings: FeedbackSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                events,
                settings,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedbackEvent> {
        self.inner.events.subscribe()
    }

    /// Registers one outstanding request.
    ///
    /// The indicator becomes visible after the configured delay unless every
    /// outstanding request finishes first.
    pub fn show_loading(&self) {
        let mut state = self.inner.lock();
        state.in_flight += 1;
        if state.loading || state.show_timer.is_some() {
            return;
        }

        let delay = self.inner.settings.loading_delay;
        if delay.is_zero() {
            state.loading = true;
            self.inner.emit(FeedbackEvent::LoadingChanged(true));
            return;
        }

        state.show_generation += 1;
        let generation = state.show_generation;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state.show_timer = Some(timer::after(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.finish_show(generation);
            }
        }));
    }

    /// Completes one outstanding request. The indicator is cleared only when
    /// none remain.
    pub fn hide_loading(&self) {
        let mut state = self.inner.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.in_flight > 0 {
            return;
        }

        if let Some(pending) = state.show_timer.take() {
            pending.cancel();
        }
        state.show_generation += 1;

        if state.loading {
            state.loading = false;
            self.inner.emit(FeedbackEvent::LoadingChanged(false));
        }
    }

    /// Raises the loading counter until the returned guard is dropped.
    #[must_use = "dropping the guard immediately lowers the loading counter"]
    pub fn begin_loading(&self) -> LoadingGuard {
        self.show_loading();
        LoadingGuard {
            store: self.clone(),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.lock().loading
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    pub fn push_toast(&self, message: impl Into<String>, severity: Severity) -> u64 {
        self.push_toast_for(message, severity, self.inner.settings.toast_duration)
    }

    /// Appends a toast and schedules its removal after `duration`.
    pub fn push_toast_for(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Duration,
    ) -> u64 {
        let toast = {
            let mut state = self.inner.lock();
            state.last_toast_id += 1;
            let toast = Toast {
                id: state.last_toast_id,
                message: message.into(),
                severity,
            };
            state.toasts.push(toast.clone());
            toast
        };

        debug!(id = toast.id, severity = severity.as_str(), "{}", toast.message);
        metrics::counter!("ikuyo_toasts_total", "severity" => severity.as_str()).increment(1);

        let id = toast.id;
        self.inner.emit(FeedbackEvent::ToastPushed(toast));

        let weak = Arc::downgrade(&self.inner);
        timer::after(duration, move || {
            if let Some(inner) = weak.upgrade() {
                inner.expire_toast(id);
            }
        });

        id
    }

    pub fn dismiss_toast(&self, id: u64) {
        self.inner.expire_toast(id);
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.lock().toasts.clone()
    }

    pub fn show_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.inner.lock().error_message = Some(message.clone());
        self.inner.emit(FeedbackEvent::ErrorShown(message));
    }

    pub fn clear_error(&self) {
        self.inner.lock().error_message = None;
        self.inner.emit(FeedbackEvent::ErrorCleared);
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.inner.lock().error_message.clone()
    }

    pub fn redirect_to_login(&self) {
        self.inner.lock().redirect = Some(LOGIN_PATH.to_string());
        self.inner
            .emit(FeedbackEvent::Redirect(LOGIN_PATH.to_string()));
    }

    /// Takes the pending redirect target, if any.
    pub fn take_redirect(&self) -> Option<String> {
        self.inner.lock().redirect.take()
    }
}

/// Lowers the loading counter when dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    store: FeedbackStore,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.store.hide_loading();
    }
}
