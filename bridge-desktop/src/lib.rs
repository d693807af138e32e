//! # Desktop Bridge Implementations
//!
//! Default implementations of the optional bridge traits for desktop
//! platforms (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop hosts rarely have OS-level audio focus, wake locks or a
//! notification shade the core must drive, so these implementations are
//! deliberately thin:
//! - `AudioFocus` that always grants focus
//! - `PowerManager` that reports the screen on and tracks held wake locks
//! - `NotificationHost` that records and logs notifications via `tracing`
//! - `LifecycleObserver` that stays foreground unless the host reports otherwise
//! - `AttachmentStore` reading downloaded transfers from a directory, tagged with `lofty`
//!
//! `PlaybackAdapter` has no desktop default; the host injects its audio output.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopAudioFocus, FsAttachmentStore};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .playback_adapter(Arc::new(MyOutput::new()))
//!     .audio_focus(Arc::new(DesktopAudioFocus::new()))
//!     .attachment_store(Arc::new(FsAttachmentStore::new("/home/me/.chat/attachments")))
//!     .build()?;
//! ```

mod attachments;
mod background;
mod focus;
mod notification;

pub use attachments::FsAttachmentStore;
pub use background::DesktopLifecycleObserver;
pub use focus::{DesktopAudioFocus, DesktopPowerManager};
pub use notification::TracingNotificationHost;
