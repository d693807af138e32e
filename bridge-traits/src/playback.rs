//! Playback bridge traits and supporting types.
//!
//! A [`PlaybackAdapter`] wraps the host's native decode/output primitive
//! (e.g. `MediaPlayer` on Android, `AVAudioPlayer` on iOS). The core never
//! decodes audio itself: it asks the adapter to prepare a session for a local
//! file, drives it with play/pause/seek, and releases it with `unload`.
//!
//! Completion and error callbacks from the native primitive are delivered
//! through an [`AdapterEventStream`] so the core can marshal them onto its own
//! task before touching any playback state.

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a prepared output primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Options applied when a session is prepared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    /// Position the primitive should be positioned at once prepared.
    pub start_position: Duration,
    /// Initial volume (0.0 = muted, 1.0 = unity gain).
    pub initial_volume: f32,
    /// Whether the native primitive should loop on its own.
    pub looping: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            start_position: Duration::from_secs(0),
            initial_volume: 1.0,
            looping: false,
        }
    }
}

/// Display metadata forwarded to the host, e.g. for lock-screen media sessions.
#[derive(Debug, Clone, Default)]
pub struct PlaybackMetadata {
    /// Transfer identifier of the attachment, when known.
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Arbitrary extra fields.
    pub extra: HashMap<String, String>,
}

/// Request describing the output primitive a host adapter should provision.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    /// Absolute path of the already downloaded media file.
    pub path: PathBuf,
    pub options: PlaybackOptions,
    pub metadata: PlaybackMetadata,
}

impl PlaybackRequest {
    /// Construct a request for a local file with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: PlaybackOptions::default(),
            metadata: PlaybackMetadata::default(),
        }
    }

    /// Attach playback options to the request.
    pub fn with_options(mut self, options: PlaybackOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach metadata to the request.
    pub fn with_metadata(mut self, metadata: PlaybackMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Result of a successful prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedSession {
    pub session: PlaybackSessionId,
    /// Total duration reported by the native primitive, if known.
    pub duration: Option<Duration>,
}

impl PreparedSession {
    pub fn new(session: PlaybackSessionId, duration: Option<Duration>) -> Self {
        Self { session, duration }
    }
}

/// Asynchronous notifications raised by a live output primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// The session played through to the end of the media.
    Completed { session: PlaybackSessionId },
    /// The session failed while playing.
    Error {
        session: PlaybackSessionId,
        message: String,
    },
}

impl AdapterEvent {
    /// Session the event belongs to.
    pub fn session(&self) -> PlaybackSessionId {
        match self {
            AdapterEvent::Completed { session } | AdapterEvent::Error { session, .. } => *session,
        }
    }
}

/// Trait for platform-specific adapters that own the native output primitive.
///
/// Implementations must tolerate calls for sessions that were already unloaded
/// by returning [`BridgeError::UnknownSession`](crate::BridgeError::UnknownSession)
/// rather than panicking; the core treats such errors as "no data".
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PlaybackAdapter: PlatformSendSync {
    /// Allocate and prepare an output primitive for the request. Resolves once
    /// the primitive is ready to start.
    async fn prepare(&self, request: PlaybackRequest) -> Result<PreparedSession>;

    /// Begin or resume playback.
    async fn play(&self, session: PlaybackSessionId) -> Result<()>;

    /// Pause playback without releasing the session.
    async fn pause(&self, session: PlaybackSessionId) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()>;

    /// Query the current playback position.
    async fn get_position(&self, session: PlaybackSessionId) -> Result<Duration>;

    /// Release the native resources of a session. Must be idempotent.
    async fn unload(&self, session: PlaybackSessionId) -> Result<()>;

    /// Subscribe to completion/error notifications for all sessions.
    async fn subscribe_events(&self) -> Result<Box<dyn AdapterEventStream>>;
}

/// Stream of adapter notifications.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AdapterEventStream: PlatformSend {
    /// Next notification, or `None` once the adapter shuts down.
    async fn next(&mut self) -> Option<AdapterEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_options_default_values() {
        let opts = PlaybackOptions::default();
        assert_eq!(opts.start_position, Duration::from_secs(0));
        assert_eq!(opts.initial_volume, 1.0);
        assert!(!opts.looping);
    }

    #[test]
    fn session_id_is_unique() {
        let a = PlaybackSessionId::new();
        let b = PlaybackSessionId::new();
        assert_ne!(a, b);
        assert_eq!(a, PlaybackSessionId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn adapter_event_reports_session() {
        let session = PlaybackSessionId::new();
        let event = AdapterEvent::Error {
            session,
            message: "decoder crashed".to_string(),
        };
        assert_eq!(event.session(), session);
        assert_eq!(AdapterEvent::Completed { session }.session(), session);
    }

    #[test]
    fn request_builder_keeps_path() {
        let request = PlaybackRequest::new("/data/voice.ogg").with_options(PlaybackOptions {
            start_position: Duration::from_millis(500),
            ..Default::default()
        });
        assert_eq!(request.path, PathBuf::from("/data/voice.ogg"));
        assert_eq!(request.options.start_position, Duration::from_millis(500));
    }
}
