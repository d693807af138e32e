//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (playback adapter,
//! audio focus, power, notifications, lifecycle, attachments) into a running
//! playback engine. Desktop apps typically enable the `desktop-shims`
//! feature (which depends on `bridge-desktop`) and only supply a playback
//! adapter; mobile hosts inject every bridge through
//! [`CoreConfig::builder`](core_runtime::config::CoreConfig::builder).
//!
//! The service is created once per application context and owns the only
//! engine instance. Everything else reaches playback through a cloned
//! [`PlaybackHandle`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::AttachmentStore;
use core_playback::{LifecycleSignal, PlayableItem, PlaybackEngine, PlaybackError, PlaybackHandle};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[cfg(feature = "desktop-shims")]
use bridge_traits::PlaybackAdapter;

struct ServiceInner {
    config: CoreConfig,
    events: EventBus,
    lifecycle: LifecycleSignal,
    playback: PlaybackHandle,
    lifecycle_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ServiceInner {
    fn drop(&mut self) {
        if let Some(task) = self.lifecycle_task.get_mut().take() {
            task.abort();
        }
        self.lifecycle.shutdown();
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Start the playback core.
    ///
    /// Must be called from within a tokio runtime; the engine, the lifecycle
    /// forwarding and the progress poller run as tasks on it.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "CoreService must be created inside a tokio runtime".to_string(),
            ));
        }

        let settings = &config.settings;
        let events = EventBus::new(settings.event_buffer_size);
        let lifecycle = LifecycleSignal::with_event_bus(settings.background_debounce, events.clone());

        // The engine subscribes to the signal before raw transitions flow in
        let playback = PlaybackEngine::spawn(&config, events.clone(), &lifecycle);
        let lifecycle_task = lifecycle.attach(Arc::clone(&config.lifecycle_observer));

        info!(
            debounce_ms = settings.background_debounce.as_millis() as u64,
            progress_interval_ms = settings.progress_interval.as_millis() as u64,
            attachments = config.attachment_store.is_some(),
            "Playback core started"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                events,
                lifecycle,
                playback,
                lifecycle_task: Mutex::new(Some(lifecycle_task)),
            }),
        })
    }

    /// Handle to the playback engine.
    pub fn playback(&self) -> &PlaybackHandle {
        &self.inner.playback
    }

    /// The debounced lifecycle signal. Hosts without a lifecycle observer
    /// stream can feed raw transitions here directly.
    pub fn lifecycle(&self) -> &LifecycleSignal {
        &self.inner.lifecycle
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Subscribe to every core event.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// The configured attachment store.
    ///
    /// # Errors
    ///
    /// [`CoreError::CapabilityMissing`] when no store was configured.
    pub fn attachment_store(&self) -> Result<Arc<dyn AttachmentStore>> {
        self.inner
            .config
            .attachment_store
            .clone()
            .ok_or_else(|| CoreError::CapabilityMissing {
                capability: "AttachmentStore".to_string(),
                message: "configure an attachment store or an attachments directory \
                          to resolve transfers"
                    .to_string(),
            })
    }

    /// Resolve a downloaded transfer into a playable item.
    pub async fn resolve_item(&self, transfer_id: &str) -> Result<Arc<PlayableItem>> {
        let store = self.attachment_store()?;
        let item = PlayableItem::resolve(store.as_ref(), transfer_id).await?;
        debug!(transfer_id, file = %item.file_name(), "Resolved playable item");
        Ok(item)
    }

    /// Resolve a transfer and start playing it on its own.
    pub async fn play_attachment(&self, transfer_id: &str) -> Result<Arc<PlayableItem>> {
        let item = self.resolve_item(transfer_id).await?;
        self.inner.playback.play_item(Arc::clone(&item))?;
        Ok(item)
    }

    /// Stop the engine, release every host resource and stop following the
    /// lifecycle observer. Further playback commands fail with
    /// [`PlaybackError::EngineShutdown`].
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(task) = self.inner.lifecycle_task.lock().take() {
            task.abort();
        }
        self.inner.lifecycle.shutdown();

        match self.inner.playback.shutdown().await {
            Ok(()) | Err(PlaybackError::EngineShutdown) => {}
            Err(e) => return Err(e.into()),
        }
        info!("Playback core stopped");
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Every optional bridge comes from `bridge-desktop`; attachments are read
/// from the per-user data directory.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example(adapter: std::sync::Arc<dyn bridge_traits::PlaybackAdapter>) -> core_service::Result<()> {
/// let core = core_service::bootstrap_desktop(adapter)?;
/// core.play_attachment("transfer-42").await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(adapter: Arc<dyn PlaybackAdapter>) -> Result<CoreService> {
    let store = bridge_desktop::FsAttachmentStore::default_location();
    debug!(root = %store.root().display(), "Using desktop attachment store");
    let config = CoreConfig::builder()
        .playback_adapter(adapter)
        .attachment_store(Arc::new(store))
        .build()?;
    CoreService::new(config)
}
