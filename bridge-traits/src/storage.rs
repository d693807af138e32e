//! Attachment storage abstraction.
//!
//! The chat data store and the transfer pipeline live outside the core. The
//! playback engine only needs to turn a transfer identifier into a local file
//! plus the little metadata it displays.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::{error::Result, platform::PlatformSendSync};

/// Reference to the conversation an attachment belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationRef {
    /// Stable identifier of the conversation (account + partner address).
    pub id: String,
    /// Name shown for the conversation partner or group.
    pub display_name: Option<String>,
}

impl ConversationRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// A downloaded attachment resolved to a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    /// Absolute path of the downloaded file.
    pub path: PathBuf,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
}

impl ResolvedAttachment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: None,
            artist: None,
            duration: None,
        }
    }
}

/// Attachment/transfer store trait.
///
/// # Errors
///
/// `resolve` returns [`BridgeError::AttachmentNotFound`](crate::BridgeError::AttachmentNotFound)
/// when the transfer is unknown or its file has not been downloaded yet.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AttachmentStore: PlatformSendSync {
    /// Resolve a transfer identifier to a local file and its basic metadata.
    async fn resolve(&self, transfer_id: &str) -> Result<ResolvedAttachment>;

    /// Conversation the transfer belongs to, for display purposes.
    async fn conversation_for(&self, transfer_id: &str) -> Result<Option<ConversationRef>>;
}
