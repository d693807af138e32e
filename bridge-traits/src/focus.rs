//! Audio focus and power bridges.
//!
//! Both capabilities map to OS-level exclusive tokens:
//! - **Audio focus**: Android `AudioManager` focus requests, iOS
//!   `AVAudioSession` activation. Revocable by the OS at any time.
//! - **Wake lock**: Android `PowerManager.WakeLock`, iOS background task
//!   assertions. Keeps the CPU running long enough to finish a short
//!   operation while the app moves to the background.

use std::time::Duration;

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Outcome of an audio focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGrant {
    Granted,
    Denied,
}

impl FocusGrant {
    pub fn is_granted(self) -> bool {
        matches!(self, FocusGrant::Granted)
    }
}

/// Focus changes imposed by the OS after a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    /// Focus came back after a transient loss.
    Gained,
    /// Focus was taken away permanently (another player started).
    Lost,
    /// Focus was taken away temporarily (incoming call, navigation prompt).
    LostTransient,
}

/// Exclusive audio output token.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioFocus: PlatformSendSync {
    /// Request exclusive audio focus.
    async fn request_focus(&self) -> Result<FocusGrant>;

    /// Give focus back. Safe to call when focus is not held.
    async fn abandon_focus(&self) -> Result<()>;

    /// Subscribe to OS-driven focus changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn FocusChangeStream>>;
}

/// Stream of focus changes.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait FocusChangeStream: PlatformSend {
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<FocusChange>;
}

/// Screen state and wake lock access.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait PowerManager: PlatformSendSync {
    /// Whether the display is currently on (interactive).
    async fn is_screen_on(&self) -> Result<bool>;

    /// Acquire a wake lock identified by `tag`. The host releases it on its
    /// own after `timeout` if the core never does.
    async fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<()>;

    /// Release the wake lock identified by `tag`. Must be idempotent.
    async fn release_wake_lock(&self, tag: &str) -> Result<()>;
}
