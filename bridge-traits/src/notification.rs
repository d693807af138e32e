//! System notification rendering.
//!
//! The core decides *when* a playback notification should be visible and what
//! it says; the host only renders or cancels it.

use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync, storage::ConversationRef};

/// Identifier of a notification slot owned by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u32);

/// Where tapping the notification should take the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapTarget {
    /// Open the in-app media player.
    Player,
    /// Open the conversation the attachment was sent in.
    Conversation(ConversationRef),
}

/// Content descriptor for a playback notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub subtitle: Option<String>,
    /// Drives the play/pause icon state.
    pub is_playing: bool,
    pub tap_target: TapTarget,
}

/// Host notification renderer.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NotificationHost: PlatformSendSync {
    /// Show or replace the notification in slot `id`.
    async fn show(&self, id: NotificationId, content: NotificationContent) -> Result<()>;

    /// Remove the notification in slot `id`. Must be idempotent.
    async fn cancel(&self, id: NotificationId) -> Result<()>;
}
