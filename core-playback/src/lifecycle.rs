//! # Lifecycle Signal
//!
//! Debounced foreground/background signal.
//!
//! Raw transitions from the host are noisy: navigating between two screens
//! on Android briefly pauses one activity before the next resumes. The
//! signal therefore waits `debounce` before declaring a background
//! transition, and drops the pending declaration if the app comes back to
//! the foreground first. Foreground transitions are declared immediately,
//! but only if a background transition had been declared.
//!
//! Declarations are fanned out to [`LifecycleListener`]s and published on the
//! event bus as [`LifecycleEvent`]s.

use bridge_traits::LifecycleObserver;
use core_runtime::events::{CoreEvent, EventBus, LifecycleEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::listeners::{ListenerId, ListenerRegistry};

/// Receives debounced lifecycle declarations.
///
/// Called synchronously from the task that made the declaration; keep the
/// work short.
pub trait LifecycleListener: Send + Sync {
    fn on_became_foreground(&self) {}
    fn on_became_background(&self) {}
}

#[derive(Default)]
struct SignalState {
    background: bool,
    pending: Option<JoinHandle<()>>,
    generation: u64,
    ignore_next: bool,
}

struct Inner {
    debounce: Duration,
    state: Mutex<SignalState>,
    listeners: ListenerRegistry<dyn LifecycleListener>,
    events: Option<EventBus>,
}

/// Debounced lifecycle signal. Cloning shares the same signal.
#[derive(Clone)]
pub struct LifecycleSignal {
    inner: Arc<Inner>,
}

impl LifecycleSignal {
    /// Create a signal that starts in the foreground.
    pub fn new(debounce: Duration) -> Self {
        Self::build(debounce, None)
    }

    /// Create a signal that also publishes declarations on `events`.
    pub fn with_event_bus(debounce: Duration, events: EventBus) -> Self {
        Self::build(debounce, Some(events))
    }

    fn build(debounce: Duration, events: Option<EventBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                debounce,
                state: Mutex::new(SignalState::default()),
                listeners: ListenerRegistry::new(),
                events,
            }),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn LifecycleListener>) -> ListenerId {
        self.inner.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.remove(id)
    }

    /// Whether the last declaration was foreground (the initial state).
    pub fn is_foreground(&self) -> bool {
        !self.is_background()
    }

    pub fn is_background(&self) -> bool {
        self.inner.state.lock().background
    }

    /// Whether a background declaration is waiting out the debounce.
    pub fn has_pending_background(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    /// Raw "app went to background" from the host.
    ///
    /// Restarts the debounce timer. Outside a tokio runtime the declaration is
    /// made immediately.
    pub fn on_raw_background(&self) {
        let mut state = self.inner.state.lock();
        if state.background {
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
        let generation = state.generation;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                let debounce = self.inner.debounce;
                state.pending = Some(handle.spawn(async move {
                    tokio::time::sleep(debounce).await;
                    declare_background(&inner, generation);
                }));
            }
            Err(_) => {
                warn!("No tokio runtime; declaring background without debounce");
                drop(state);
                declare_background(&self.inner, generation);
            }
        }
    }

    /// Raw "app came to foreground" from the host.
    pub fn on_raw_foreground(&self) {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
            debug!("Foreground returned within debounce; background dropped");
        }
        state.generation += 1;
        if !state.background {
            return;
        }
        state.background = false;
        drop(state);

        info!("Application became foreground");
        self.inner
            .listeners
            .notify("on_became_foreground", |listener| {
                listener.on_became_foreground()
            });
        publish(&self.inner, LifecycleEvent::BecameForeground);
    }

    /// Skip the next background declaration.
    ///
    /// Cancels a pending declaration if one is waiting; otherwise the next
    /// one to fire is suppressed. Used before launching an external activity
    /// that is expected to return, such as a file picker.
    pub fn ignore_next_background(&self) {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
            state.generation += 1;
            debug!("Pending background declaration cancelled");
        } else {
            state.ignore_next = true;
        }
    }

    /// Forward transitions from a host observer until its stream closes.
    pub fn attach(&self, observer: Arc<dyn LifecycleObserver>) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            match observer.get_state().await {
                Ok(initial) if !initial.is_foreground() => signal.on_raw_background(),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to read initial lifecycle state"),
            }

            let mut changes = match observer.subscribe_changes().await {
                Ok(changes) => changes,
                Err(e) => {
                    warn!(error = %e, "Lifecycle changes unavailable");
                    return;
                }
            };

            while let Some(state) = changes.next().await {
                if state.is_foreground() {
                    signal.on_raw_foreground();
                } else {
                    signal.on_raw_background();
                }
            }
            debug!("Lifecycle change stream closed");
        })
    }

    /// Cancel any pending declaration.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
        state.generation += 1;
    }
}

fn declare_background(inner: &Arc<Inner>, generation: u64) {
    let mut state = inner.state.lock();
    if state.generation != generation {
        return;
    }
    state.pending = None;
    if state.ignore_next {
        state.ignore_next = false;
        debug!("Background declaration ignored on request");
        return;
    }
    if state.background {
        return;
    }
    state.background = true;
    drop(state);

    info!("Application became background");
    inner
        .listeners
        .notify("on_became_background", |listener| {
            listener.on_became_background()
        });
    publish(inner, LifecycleEvent::BecameBackground);
}

fn publish(inner: &Inner, event: LifecycleEvent) {
    if let Some(events) = &inner.events {
        let _ = events.emit(CoreEvent::Lifecycle(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        foreground: AtomicUsize,
        background: AtomicUsize,
    }

    impl LifecycleListener for Recorder {
        fn on_became_foreground(&self) {
            self.foreground.fetch_add(1, Ordering::SeqCst);
        }

        fn on_became_background(&self) {
            self.background.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicking;

    impl LifecycleListener for Panicking {
        fn on_became_background(&self) {
            panic!("boom");
        }
    }

    fn signal_with_recorder() -> (LifecycleSignal, Arc<Recorder>) {
        let signal = LifecycleSignal::new(Duration::from_millis(500));
        let recorder = Arc::new(Recorder::default());
        signal.add_listener(recorder.clone());
        (signal, recorder)
    }

    async fn settle(duration: Duration) {
        tokio::time::sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_declared_after_debounce() {
        let (signal, recorder) = signal_with_recorder();

        signal.on_raw_background();
        settle(Duration::from_millis(499)).await;
        assert!(signal.is_foreground());
        assert!(signal.has_pending_background());

        settle(Duration::from_millis(2)).await;
        assert!(signal.is_background());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_within_debounce_cancels() {
        let (signal, recorder) = signal_with_recorder();

        signal.on_raw_background();
        settle(Duration::from_millis(200)).await;
        signal.on_raw_foreground();
        settle(Duration::from_secs(1)).await;

        assert!(signal.is_foreground());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 0);
        // Never declared background, so no foreground announcement either
        assert_eq!(recorder.foreground.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_announced_after_background() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let signal = LifecycleSignal::with_event_bus(Duration::from_millis(500), bus);
        let recorder = Arc::new(Recorder::default());
        signal.add_listener(recorder.clone());

        signal.on_raw_background();
        settle(Duration::from_millis(600)).await;
        signal.on_raw_foreground();

        assert_eq!(recorder.foreground.load(Ordering::SeqCst), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Lifecycle(LifecycleEvent::BecameBackground)
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            CoreEvent::Lifecycle(LifecycleEvent::BecameForeground)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignore_next_cancels_pending() {
        let (signal, recorder) = signal_with_recorder();

        signal.on_raw_background();
        signal.ignore_next_background();
        settle(Duration::from_secs(1)).await;

        assert!(signal.is_foreground());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 0);

        // The escape hatch is one-shot
        signal.on_raw_background();
        settle(Duration::from_secs(1)).await;
        assert!(signal.is_background());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignore_next_suppresses_future_declaration() {
        let (signal, recorder) = signal_with_recorder();

        signal.ignore_next_background();
        signal.on_raw_background();
        settle(Duration::from_secs(1)).await;
        assert!(signal.is_foreground());

        signal.on_raw_foreground();
        signal.on_raw_background();
        settle(Duration::from_secs(1)).await;
        assert_eq!(recorder.background.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_listener_does_not_block_others() {
        let signal = LifecycleSignal::new(Duration::from_millis(10));
        signal.add_listener(Arc::new(Panicking));
        let recorder = Arc::new(Recorder::default());
        signal.add_listener(recorder.clone());

        signal.on_raw_background();
        settle(Duration::from_millis(20)).await;

        assert!(signal.is_background());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_raw_background_restarts_timer() {
        let (signal, recorder) = signal_with_recorder();

        signal.on_raw_background();
        settle(Duration::from_millis(300)).await;
        signal.on_raw_background();
        settle(Duration::from_millis(300)).await;
        assert!(signal.is_foreground());

        settle(Duration::from_millis(250)).await;
        assert!(signal.is_background());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_without_runtime_declares_immediately() {
        let (signal, recorder) = signal_with_recorder();
        signal.on_raw_background();
        assert!(signal.is_background());
        assert_eq!(recorder.background.load(Ordering::SeqCst), 1);
    }
}
