//! Audio Focus and Power Implementations
//!
//! Desktop mixers let every application play at once, so focus is always
//! granted and never revoked. Wake locks have no desktop equivalent; the
//! power manager only keeps track of which tags are held so misuse shows up
//! in logs.

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    focus::{AudioFocus, FocusChange, FocusChangeStream, FocusGrant, PowerManager},
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Desktop audio focus: always granted.
pub struct DesktopAudioFocus {
    held: AtomicBool,
}

impl DesktopAudioFocus {
    pub fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Whether focus is currently held by the core.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl Default for DesktopAudioFocus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioFocus for DesktopAudioFocus {
    async fn request_focus(&self) -> Result<FocusGrant> {
        self.held.store(true, Ordering::SeqCst);
        debug!("Audio focus granted");
        Ok(FocusGrant::Granted)
    }

    async fn abandon_focus(&self) -> Result<()> {
        if self.held.swap(false, Ordering::SeqCst) {
            debug!("Audio focus abandoned");
        }
        Ok(())
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn FocusChangeStream>> {
        Ok(Box::new(DesktopFocusChangeStream))
    }
}

/// Focus change stream (never emits).
struct DesktopFocusChangeStream;

#[async_trait]
impl FocusChangeStream for DesktopFocusChangeStream {
    async fn next(&mut self) -> Option<FocusChange> {
        std::future::pending::<()>().await;
        None
    }
}

/// Desktop power manager.
///
/// Reports the screen as on and records held wake lock tags.
pub struct DesktopPowerManager {
    held: RwLock<HashSet<String>>,
}

impl DesktopPowerManager {
    pub fn new() -> Self {
        Self {
            held: RwLock::new(HashSet::new()),
        }
    }

    /// Whether a wake lock with `tag` is currently held.
    pub async fn is_held(&self, tag: &str) -> bool {
        self.held.read().await.contains(tag)
    }
}

impl Default for DesktopPowerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PowerManager for DesktopPowerManager {
    async fn is_screen_on(&self) -> Result<bool> {
        Ok(true)
    }

    async fn acquire_wake_lock(&self, tag: &str, timeout: Duration) -> Result<()> {
        let mut held = self.held.write().await;
        if !held.insert(tag.to_string()) {
            warn!(tag, "Wake lock acquired twice");
        }
        debug!(tag, timeout_ms = timeout.as_millis() as u64, "Wake lock acquired");
        Ok(())
    }

    async fn release_wake_lock(&self, tag: &str) -> Result<()> {
        if self.held.write().await.remove(tag) {
            debug!(tag, "Wake lock released");
        }
        Ok(())
    }
}
