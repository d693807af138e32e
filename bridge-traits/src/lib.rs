//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host
//! application. Each trait represents an OS capability the core needs but
//! cannot implement portably: the native audio output primitive, the audio
//! focus and wake tokens, lifecycle transitions, notifications and the
//! attachment store of the chat client.
//!
//! ## Traits
//!
//! ### Playback
//! - [`PlaybackAdapter`](playback::PlaybackAdapter) - Native decode/output primitive
//! - [`AudioFocus`](focus::AudioFocus) - Exclusive audio output token
//! - [`PowerManager`](focus::PowerManager) - Screen state and wake lock
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](background::LifecycleObserver) - Raw foreground/background transitions
//! - [`NotificationHost`](notification::NotificationHost) - System notification rendering
//! - [`AttachmentStore`](storage::AttachmentStore) - Transfer id to local file resolution
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | Optional bridges only |
//! | Android  | host app            | Provided by the host |
//! | iOS      | host app            | Provided by the host |
//!
//! `PlaybackAdapter` has no portable default; every host must inject one.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors and include context (paths, session ids).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets so they can be
//! shared between the engine task and its helper tasks.

pub mod background;
pub mod error;
pub mod focus;
pub mod logging;
pub mod notification;
pub mod platform;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use focus::{AudioFocus, FocusChange, FocusChangeStream, FocusGrant, PowerManager};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use notification::{NotificationContent, NotificationHost, NotificationId, TapTarget};
pub use playback::{
    AdapterEvent, AdapterEventStream, PlaybackAdapter, PlaybackMetadata, PlaybackOptions,
    PlaybackRequest, PlaybackSessionId, PreparedSession,
};
pub use storage::{AttachmentStore, ConversationRef, ResolvedAttachment};
