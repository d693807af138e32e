//! Desktop Lifecycle Observer Implementation

use async_trait::async_trait;
use bridge_traits::{
    background::{LifecycleChangeStream, LifecycleObserver, LifecycleState},
    error::Result,
};
use tokio::sync::watch;
use tracing::debug;

/// Desktop lifecycle observer.
///
/// Desktop applications are foreground for their whole life unless the host
/// forwards window minimize/restore events through [`set_state`](Self::set_state).
pub struct DesktopLifecycleObserver {
    state: watch::Sender<LifecycleState>,
}

impl DesktopLifecycleObserver {
    /// Create a new lifecycle observer in the foreground state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Foreground);
        Self { state }
    }

    /// Report a raw lifecycle transition from the windowing layer.
    pub fn set_state(&self, state: LifecycleState) {
        debug!(?state, "Desktop lifecycle transition");
        self.state.send_replace(state);
    }
}

impl Default for DesktopLifecycleObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LifecycleObserver for DesktopLifecycleObserver {
    async fn get_state(&self) -> Result<LifecycleState> {
        Ok(*self.state.borrow())
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn LifecycleChangeStream>> {
        let receiver = self.state.subscribe();
        Ok(Box::new(DesktopLifecycleChangeStream { receiver }))
    }
}

/// Desktop lifecycle change stream.
///
/// Never emits unless the host calls `set_state`.
struct DesktopLifecycleChangeStream {
    receiver: watch::Receiver<LifecycleState>,
}

#[async_trait]
impl LifecycleChangeStream for DesktopLifecycleChangeStream {
    async fn next(&mut self) -> Option<LifecycleState> {
        self.receiver.changed().await.ok()?;
        let state = *self.receiver.borrow_and_update();
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lifecycle_observer_starts_foreground() {
        let observer = DesktopLifecycleObserver::new();
        assert_eq!(
            observer.get_state().await.unwrap(),
            LifecycleState::Foreground
        );
    }

    #[tokio::test]
    async fn test_stream_is_silent_without_transitions() {
        let observer = DesktopLifecycleObserver::new();
        let mut stream = observer.subscribe_changes().await.unwrap();

        let next = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_stream_reports_host_transitions() {
        let observer = DesktopLifecycleObserver::new();
        let mut stream = observer.subscribe_changes().await.unwrap();

        observer.set_state(LifecycleState::Background);
        assert_eq!(stream.next().await, Some(LifecycleState::Background));
        assert_eq!(
            observer.get_state().await.unwrap(),
            LifecycleState::Background
        );

        observer.set_state(LifecycleState::Foreground);
        assert_eq!(stream.next().await, Some(LifecycleState::Foreground));
    }
}
