//! Attachment Store Implementation over a download directory
//!
//! Downloaded transfers are stored as `<root>/<transfer_id>.<ext>`. An
//! optional `<root>/conversations.json` maps transfer ids to the
//! conversation they were received in.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{AttachmentStore, ConversationRef, ResolvedAttachment},
};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const CONVERSATION_INDEX: &str = "conversations.json";

/// Directory-backed attachment store.
pub struct FsAttachmentStore {
    root: PathBuf,
}

impl FsAttachmentStore {
    /// Create a store reading transfers from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user default download directory.
    pub fn default_location() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("chat-media-core")
            .join("attachments");
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn find_file(&self, transfer_id: &str) -> Result<PathBuf> {
        if transfer_id.is_empty() || transfer_id.contains(['/', '\\']) || transfer_id == ".." {
            return Err(BridgeError::AttachmentNotFound(transfer_id.to_string()));
        }

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BridgeError::AttachmentNotFound(transfer_id.to_string()));
            }
            Err(e) => return Err(BridgeError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_name().and_then(|n| n.to_str()) == Some(CONVERSATION_INDEX) {
                continue;
            }
            let matches = path.file_stem().and_then(|s| s.to_str()) == Some(transfer_id)
                || path.file_name().and_then(|n| n.to_str()) == Some(transfer_id);
            if matches && entry.file_type().await?.is_file() {
                return Ok(path);
            }
        }

        Err(BridgeError::AttachmentNotFound(transfer_id.to_string()))
    }

    async fn read_tags(path: &Path) -> ResolvedAttachment {
        let mut attachment = ResolvedAttachment::new(path);

        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read attachment for tags");
                return attachment;
            }
        };

        let tagged_file = Probe::new(std::io::Cursor::new(&data))
            .options(ParseOptions::new())
            .guess_file_type()
            .map_err(lofty::error::LoftyError::from)
            .and_then(|probe| probe.read());

        match tagged_file {
            Ok(tagged_file) => {
                let duration = tagged_file.properties().duration();
                if !duration.is_zero() {
                    attachment.duration = Some(duration);
                }
                let tag = tagged_file
                    .primary_tag()
                    .or_else(|| tagged_file.first_tag());
                if let Some(tag) = tag {
                    attachment.title = tag.title().map(|s| s.trim().to_string());
                    attachment.artist = tag.artist().map(|s| s.trim().to_string());
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No readable tags in attachment");
            }
        }

        attachment
    }

    async fn load_conversation_index(&self) -> Result<HashMap<String, ConversationRef>> {
        let path = self.root.join(CONVERSATION_INDEX);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(BridgeError::Io(e)),
        };

        serde_json::from_slice(&data).map_err(|e| {
            BridgeError::OperationFailed(format!(
                "Invalid conversation index {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl AttachmentStore for FsAttachmentStore {
    async fn resolve(&self, transfer_id: &str) -> Result<ResolvedAttachment> {
        let path = self.find_file(transfer_id).await?;
        let attachment = Self::read_tags(&path).await;
        debug!(
            transfer_id,
            path = %attachment.path.display(),
            has_duration = attachment.duration.is_some(),
            "Resolved attachment"
        );
        Ok(attachment)
    }

    async fn conversation_for(&self, transfer_id: &str) -> Result<Option<ConversationRef>> {
        let mut index = self.load_conversation_index().await?;
        Ok(index.remove(transfer_id))
    }
}
