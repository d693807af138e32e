//! # Core Configuration Module
//!
//! Configuration for the playback core.
//!
//! ## Overview
//!
//! A builder assembles a [`CoreConfig`] holding every host bridge the core
//! needs plus the [`PlaybackSettings`] tuning values. Validation is
//! fail-fast: a missing capability is reported at build time with an
//! actionable message instead of surfacing later as a silent playback
//! failure.
//!
//! ## Required Dependencies
//!
//! - `PlaybackAdapter` - the native output primitive; there is no portable default
//!
//! ## Optional Dependencies (with desktop defaults)
//!
//! - `AudioFocus` - desktop default always grants focus
//! - `PowerManager` - desktop default reports the screen on and tracks wake locks
//! - `NotificationHost` - desktop default logs notifications through `tracing`
//! - `LifecycleObserver` - desktop default is always foreground
//! - `AttachmentStore` - desktop default reads a directory of downloaded transfers
//!   (only when `attachments_dir` is set)
//!
//! Desktop defaults are injected only when the `desktop-shims` feature is
//! enabled; otherwise each missing bridge is a `CapabilityMissing` error.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .playback_adapter(Arc::new(MyMediaPlayerAdapter::new()))
//!     .audio_focus(Arc::new(MyAudioFocus))
//!     .background_debounce(Duration::from_millis(700))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AttachmentStore, AudioFocus, LifecycleObserver, NotificationHost, PlaybackAdapter,
    PowerManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default delay before a background transition is declared.
pub const DEFAULT_BACKGROUND_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default period of the progress poller.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Default safety timeout for the wake lock held across a background transition.
pub const DEFAULT_WAKE_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning values for the playback core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Delay before a raw background transition is declared.
    pub background_debounce: Duration,
    /// Period of the progress poller.
    pub progress_interval: Duration,
    /// Host-side timeout of the transition wake lock.
    pub wake_lock_timeout: Duration,
    /// Per-subscriber buffer of the event bus.
    pub event_buffer_size: usize,
    /// Notification slot used for the playback notification.
    pub notification_id: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            background_debounce: DEFAULT_BACKGROUND_DEBOUNCE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            wake_lock_timeout: DEFAULT_WAKE_LOCK_TIMEOUT,
            event_buffer_size: crate::events::DEFAULT_EVENT_BUFFER_SIZE,
            notification_id: 1,
        }
    }
}

impl PlaybackSettings {
    /// Validates the settings.
    pub fn validate(&self) -> Result<()> {
        if self.background_debounce > Duration::from_secs(10) {
            return Err(Error::Config(
                "Background debounce exceeds maximum of 10 seconds".to_string(),
            ));
        }

        if self.progress_interval.is_zero() {
            return Err(Error::Config(
                "Progress interval must be greater than 0ms".to_string(),
            ));
        }

        if self.progress_interval > Duration::from_secs(60) {
            return Err(Error::Config(
                "Progress interval exceeds maximum of 60 seconds".to_string(),
            ));
        }

        if self.wake_lock_timeout.is_zero() {
            return Err(Error::Config(
                "Wake lock timeout must be greater than 0ms".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Native output primitive (required)
    pub playback_adapter: Arc<dyn PlaybackAdapter>,

    /// Exclusive audio output token
    pub audio_focus: Arc<dyn AudioFocus>,

    /// Screen state and wake lock
    pub power_manager: Arc<dyn PowerManager>,

    /// System notification renderer
    pub notification_host: Arc<dyn NotificationHost>,

    /// Raw foreground/background transitions
    pub lifecycle_observer: Arc<dyn LifecycleObserver>,

    /// Transfer id resolution (optional)
    pub attachment_store: Option<Arc<dyn AttachmentStore>>,

    /// Tuning values
    pub settings: PlaybackSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("playback_adapter", &"PlaybackAdapter { ... }")
            .field("audio_focus", &"AudioFocus { ... }")
            .field("power_manager", &"PowerManager { ... }")
            .field("notification_host", &"NotificationHost { ... }")
            .field("lifecycle_observer", &"LifecycleObserver { ... }")
            .field(
                "attachment_store",
                &self
                    .attachment_store
                    .as_ref()
                    .map(|_| "AttachmentStore { ... }"),
            )
            .field("settings", &self.settings)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

fn capability_missing(capability: &str, purpose: &str, mobile: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required {}. \
             Desktop: enable the 'desktop-shims' feature to use the default. \
             Mobile: inject {}.",
            capability, purpose, mobile
        ),
    }
}

#[cfg(feature = "desktop-shims")]
mod defaults {
    use super::*;
    use bridge_desktop::{
        DesktopAudioFocus, DesktopLifecycleObserver, DesktopPowerManager, FsAttachmentStore,
        TracingNotificationHost,
    };

    pub(super) fn audio_focus() -> Result<Arc<dyn AudioFocus>> {
        Ok(Arc::new(DesktopAudioFocus::new()))
    }

    pub(super) fn power_manager() -> Result<Arc<dyn PowerManager>> {
        Ok(Arc::new(DesktopPowerManager::new()))
    }

    pub(super) fn notification_host() -> Result<Arc<dyn NotificationHost>> {
        Ok(Arc::new(TracingNotificationHost::new()))
    }

    pub(super) fn lifecycle_observer() -> Result<Arc<dyn LifecycleObserver>> {
        Ok(Arc::new(DesktopLifecycleObserver::new()))
    }

    pub(super) fn attachment_store(dir: PathBuf) -> Result<Arc<dyn AttachmentStore>> {
        Ok(Arc::new(FsAttachmentStore::new(dir)))
    }
}

#[cfg(not(feature = "desktop-shims"))]
mod defaults {
    use super::*;

    pub(super) fn audio_focus() -> Result<Arc<dyn AudioFocus>> {
        Err(capability_missing(
            "AudioFocus",
            "to coordinate exclusive audio output",
            "AudioManager focus requests (Android) or AVAudioSession (iOS)",
        ))
    }

    pub(super) fn power_manager() -> Result<Arc<dyn PowerManager>> {
        Err(capability_missing(
            "PowerManager",
            "to keep playback transitions alive while backgrounding",
            "PowerManager wake locks (Android) or background task assertions (iOS)",
        ))
    }

    pub(super) fn notification_host() -> Result<Arc<dyn NotificationHost>> {
        Err(capability_missing(
            "NotificationHost",
            "to show playback controls while backgrounded",
            "NotificationManager (Android) or MPNowPlayingInfoCenter (iOS)",
        ))
    }

    pub(super) fn lifecycle_observer() -> Result<Arc<dyn LifecycleObserver>> {
        Err(capability_missing(
            "LifecycleObserver",
            "to detect foreground/background transitions",
            "ActivityLifecycleCallbacks (Android) or scene notifications (iOS)",
        ))
    }

    pub(super) fn attachment_store(_dir: PathBuf) -> Result<Arc<dyn AttachmentStore>> {
        Err(capability_missing(
            "AttachmentStore",
            "when an attachments directory is configured",
            "the chat client's transfer store",
        ))
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    playback_adapter: Option<Arc<dyn PlaybackAdapter>>,
    audio_focus: Option<Arc<dyn AudioFocus>>,
    power_manager: Option<Arc<dyn PowerManager>>,
    notification_host: Option<Arc<dyn NotificationHost>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    attachment_store: Option<Arc<dyn AttachmentStore>>,
    attachments_dir: Option<PathBuf>,
    settings: PlaybackSettings,
}

impl CoreConfigBuilder {
    /// Sets the playback adapter implementation (required).
    pub fn playback_adapter(mut self, adapter: Arc<dyn PlaybackAdapter>) -> Self {
        self.playback_adapter = Some(adapter);
        self
    }

    /// Sets the audio focus implementation.
    pub fn audio_focus(mut self, focus: Arc<dyn AudioFocus>) -> Self {
        self.audio_focus = Some(focus);
        self
    }

    /// Sets the power manager implementation.
    pub fn power_manager(mut self, power: Arc<dyn PowerManager>) -> Self {
        self.power_manager = Some(power);
        self
    }

    /// Sets the notification host implementation.
    pub fn notification_host(mut self, host: Arc<dyn NotificationHost>) -> Self {
        self.notification_host = Some(host);
        self
    }

    /// Sets the lifecycle observer implementation.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Sets the attachment store implementation.
    ///
    /// Takes precedence over [`attachments_dir`](Self::attachments_dir).
    pub fn attachment_store(mut self, store: Arc<dyn AttachmentStore>) -> Self {
        self.attachment_store = Some(store);
        self
    }

    /// Directory of downloaded transfers used by the desktop attachment store.
    pub fn attachments_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.attachments_dir = Some(dir.into());
        self
    }

    /// Delay before a raw background transition is declared.
    ///
    /// Default: 500ms
    pub fn background_debounce(mut self, delay: Duration) -> Self {
        self.settings.background_debounce = delay;
        self
    }

    /// Period of the progress poller.
    ///
    /// Default: 1s
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.settings.progress_interval = interval;
        self
    }

    /// Host-side safety timeout of the transition wake lock.
    ///
    /// Default: 10s
    pub fn wake_lock_timeout(mut self, timeout: Duration) -> Self {
        self.settings.wake_lock_timeout = timeout;
        self
    }

    /// Per-subscriber buffer of the event bus.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.settings.event_buffer_size = size;
        self
    }

    /// Notification slot used for the playback notification.
    pub fn notification_id(mut self, id: u32) -> Self {
        self.settings.notification_id = id;
        self
    }

    /// Replaces all tuning values at once.
    pub fn settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when the playback adapter is missing, or
    ///   an optional bridge is missing without the `desktop-shims` feature
    /// - [`Error::Config`] when a tuning value is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let playback_adapter = self.playback_adapter.ok_or_else(|| {
            capability_missing(
                "PlaybackAdapter",
                "to drive the native output primitive",
                "a MediaPlayer (Android) or AVAudioPlayer (iOS) backed adapter",
            )
        })?;

        let audio_focus = match self.audio_focus {
            Some(focus) => focus,
            None => defaults::audio_focus()?,
        };

        let power_manager = match self.power_manager {
            Some(power) => power,
            None => defaults::power_manager()?,
        };

        let notification_host = match self.notification_host {
            Some(host) => host,
            None => defaults::notification_host()?,
        };

        let lifecycle_observer = match self.lifecycle_observer {
            Some(observer) => observer,
            None => defaults::lifecycle_observer()?,
        };

        let attachment_store = match (self.attachment_store, self.attachments_dir) {
            (Some(store), _) => Some(store),
            (None, Some(dir)) => Some(defaults::attachment_store(dir)?),
            (None, None) => None,
        };

        let config = CoreConfig {
            playback_adapter,
            audio_focus,
            power_manager,
            notification_host,
            lifecycle_observer,
            attachment_store,
            settings: self.settings,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        error::Result as BridgeResult, AdapterEventStream, FocusChangeStream, FocusGrant,
        LifecycleChangeStream, LifecycleState, NotificationContent, NotificationId,
        PlaybackRequest, PlaybackSessionId, PreparedSession,
    };

    struct MockAdapter;

    #[async_trait]
    impl PlaybackAdapter for MockAdapter {
        async fn prepare(&self, _request: PlaybackRequest) -> BridgeResult<PreparedSession> {
            Ok(PreparedSession::new(PlaybackSessionId::new(), None))
        }
        async fn play(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
        async fn pause(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
        async fn seek(&self, _session: PlaybackSessionId, _position: Duration) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_position(&self, _session: PlaybackSessionId) -> BridgeResult<Duration> {
            Ok(Duration::ZERO)
        }
        async fn unload(&self, _session: PlaybackSessionId) -> BridgeResult<()> {
            Ok(())
        }
        async fn subscribe_events(&self) -> BridgeResult<Box<dyn AdapterEventStream>> {
            Ok(Box::new(NeverStream))
        }
    }

    struct NeverStream;

    #[async_trait]
    impl AdapterEventStream for NeverStream {
        async fn next(&mut self) -> Option<bridge_traits::AdapterEvent> {
            None
        }
    }

    #[async_trait]
    impl FocusChangeStream for NeverStream {
        async fn next(&mut self) -> Option<bridge_traits::FocusChange> {
            None
        }
    }

    #[async_trait]
    impl LifecycleChangeStream for NeverStream {
        async fn next(&mut self) -> Option<LifecycleState> {
            None
        }
    }

    struct MockFocus;

    #[async_trait]
    impl AudioFocus for MockFocus {
        async fn request_focus(&self) -> BridgeResult<FocusGrant> {
            Ok(FocusGrant::Granted)
        }
        async fn abandon_focus(&self) -> BridgeResult<()> {
            Ok(())
        }
        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn FocusChangeStream>> {
            Ok(Box::new(NeverStream))
        }
    }

    struct MockPower;

    #[async_trait]
    impl PowerManager for MockPower {
        async fn is_screen_on(&self) -> BridgeResult<bool> {
            Ok(true)
        }
        async fn acquire_wake_lock(&self, _tag: &str, _timeout: Duration) -> BridgeResult<()> {
            Ok(())
        }
        async fn release_wake_lock(&self, _tag: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct MockNotifications;

    #[async_trait]
    impl NotificationHost for MockNotifications {
        async fn show(&self, _id: NotificationId, _content: NotificationContent) -> BridgeResult<()> {
            Ok(())
        }
        async fn cancel(&self, _id: NotificationId) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct MockLifecycle;

    #[async_trait]
    impl LifecycleObserver for MockLifecycle {
        async fn get_state(&self) -> BridgeResult<LifecycleState> {
            Ok(LifecycleState::Foreground)
        }
        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn LifecycleChangeStream>> {
            Ok(Box::new(NeverStream))
        }
    }

    fn full_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .playback_adapter(Arc::new(MockAdapter))
            .audio_focus(Arc::new(MockFocus))
            .power_manager(Arc::new(MockPower))
            .notification_host(Arc::new(MockNotifications))
            .lifecycle_observer(Arc::new(MockLifecycle))
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = full_builder().build().unwrap();
        assert_eq!(config.settings, PlaybackSettings::default());
        assert!(config.attachment_store.is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = PlaybackSettings::default();
        assert_eq!(settings.background_debounce, Duration::from_millis(500));
        assert_eq!(settings.progress_interval, Duration::from_secs(1));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_playback_adapter() {
        let result = CoreConfig::builder()
            .audio_focus(Arc::new(MockFocus))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "PlaybackAdapter");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_audio_focus_without_shims() {
        let result = CoreConfig::builder()
            .playback_adapter(Arc::new(MockAdapter))
            .power_manager(Arc::new(MockPower))
            .notification_host(Arc::new(MockNotifications))
            .lifecycle_observer(Arc::new(MockLifecycle))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "AudioFocus"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_optional_bridges() {
        let config = CoreConfig::builder()
            .playback_adapter(Arc::new(MockAdapter))
            .attachments_dir(std::env::temp_dir())
            .build()
            .unwrap();

        assert!(config.attachment_store.is_some());
    }

    #[test]
    fn test_custom_settings() {
        let config = full_builder()
            .background_debounce(Duration::from_millis(750))
            .progress_interval(Duration::from_millis(250))
            .wake_lock_timeout(Duration::from_secs(5))
            .event_buffer_size(32)
            .notification_id(7)
            .build()
            .unwrap();

        assert_eq!(config.settings.background_debounce, Duration::from_millis(750));
        assert_eq!(config.settings.progress_interval, Duration::from_millis(250));
        assert_eq!(config.settings.wake_lock_timeout, Duration::from_secs(5));
        assert_eq!(config.settings.event_buffer_size, 32);
        assert_eq!(config.settings.notification_id, 7);
    }

    #[test]
    fn test_zero_progress_interval_rejected() {
        let result = full_builder().progress_interval(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_excessive_debounce_rejected() {
        let result = full_builder()
            .background_debounce(Duration::from_secs(30))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = full_builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_debounce_allowed() {
        assert!(full_builder()
            .background_debounce(Duration::ZERO)
            .build()
            .is_ok());
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = full_builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("PlaybackAdapter { ... }"));
        assert!(debug.contains("settings"));
    }
}
