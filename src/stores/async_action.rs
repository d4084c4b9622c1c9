use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

#[derive(Debug, Default)]
struct ActionState {
    running: usize,
    error: Option<String>,
}

/// Loading and error flags around one kind of async operation.
///
/// The error from the last run is kept for display and also returned to the
/// caller unchanged.
#[derive(Debug, Clone, Default)]
pub struct AsyncAction {
    state: Arc<Mutex<ActionState>>,
}

struct RunningGuard<'a>(&'a AsyncAction);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.running = state.running.saturating_sub(1);
    }
}

impl AsyncAction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ActionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub async fn run<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        {
            let mut state = self.lock();
            state.running += 1;
            state.error = None;
        }
        let _running = RunningGuard(self);

        let result = operation.await;
        if let Err(e) = &result {
            self.lock().error = Some(e.user_message());
        }
        result
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().running > 0
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[tokio::test]
    async fn test_tracks_error_and_reraises() {
        let action = AsyncAction::new();

        let value = action.run(async { Ok(3) }).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(action.error(), None);

        let failed = action
            .run(async { Err::<(), _>(ApiError::Rejected("nope".to_string())) })
            .await;
        assert!(matches!(failed, Err(ApiError::Rejected(_))));
        assert_eq!(action.error().as_deref(), Some("nope"));
        assert!(!action.is_loading());

        action.run(async { Ok(()) }).await.unwrap();
        assert_eq!(action.error(), None);
    }

    #[tokio::test]
    async fn test_loading_while_running() {
        let action = AsyncAction::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let running = {
            let action = action.clone();
            tokio::spawn(async move {
                action
                    .run(async {
                        let _ = rx.await;
                        Ok(())
                    })
                    .await
            })
        };

        tokio::task::yield_now().await;
        while !action.is_loading() {
            tokio::task::yield_now().await;
        }
        tx.send(()).unwrap();
        running.await.unwrap().unwrap();
        assert!(!action.is_loading());
    }
}
