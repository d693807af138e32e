//! # Playable Items and Playlists
//!
//! A [`PlayableItem`] references an already downloaded media file. Items are
//! shared as `Arc<PlayableItem>`: the playlist owns them and the engine only
//! keeps a reference to the current one. Identity is the file path.
//!
//! Duration and display metadata are not always known when an item is
//! created (the attachment store may not have read the tags yet, and the
//! native primitive only reports a duration once prepared), so both are
//! set-once interior values.

use bridge_traits::{AttachmentStore, ConversationRef, PlaybackMetadata, ResolvedAttachment};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::Result;

/// Display metadata of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Reference to a locally available media file.
#[derive(Debug)]
pub struct PlayableItem {
    path: PathBuf,
    transfer_id: Option<String>,
    conversation: Option<ConversationRef>,
    duration: OnceLock<Duration>,
    metadata: OnceLock<ItemMetadata>,
}

impl PlayableItem {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            transfer_id: None,
            conversation: None,
            duration: OnceLock::new(),
            metadata: OnceLock::new(),
        }
    }

    pub fn with_transfer_id(mut self, transfer_id: impl Into<String>) -> Self {
        self.transfer_id = Some(transfer_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation: ConversationRef) -> Self {
        self.conversation = Some(conversation);
        self
    }

    pub fn with_metadata(self, metadata: ItemMetadata) -> Self {
        let _ = self.metadata.set(metadata);
        self
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        let _ = self.duration.set(duration);
        self
    }

    /// Build an item from a resolved attachment.
    pub fn from_attachment(
        transfer_id: &str,
        attachment: ResolvedAttachment,
        conversation: Option<ConversationRef>,
    ) -> Self {
        let mut item = Self::new(attachment.path).with_transfer_id(transfer_id);
        item.conversation = conversation;
        if attachment.title.is_some() || attachment.artist.is_some() {
            item = item.with_metadata(ItemMetadata {
                title: attachment.title,
                artist: attachment.artist,
            });
        }
        if let Some(duration) = attachment.duration {
            item = item.with_duration(duration);
        }
        item
    }

    /// Resolve a transfer through the attachment store.
    ///
    /// The conversation lookup is best effort; a failure there still yields
    /// a playable item.
    pub async fn resolve(store: &dyn AttachmentStore, transfer_id: &str) -> Result<Arc<Self>> {
        let attachment = store.resolve(transfer_id).await?;
        let conversation = match store.conversation_for(transfer_id).await {
            Ok(conversation) => conversation,
            Err(e) => {
                tracing::debug!(transfer_id, error = %e, "Conversation lookup failed");
                None
            }
        };
        Ok(Arc::new(Self::from_attachment(
            transfer_id,
            attachment,
            conversation,
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used when no title is known.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn transfer_id(&self) -> Option<&str> {
        self.transfer_id.as_deref()
    }

    pub fn conversation(&self) -> Option<&ConversationRef> {
        self.conversation.as_ref()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration.get().copied()
    }

    /// Record the duration once known. Returns `false` if it was already set.
    pub fn set_duration(&self, duration: Duration) -> bool {
        self.duration.set(duration).is_ok()
    }

    pub fn metadata(&self) -> Option<&ItemMetadata> {
        self.metadata.get()
    }

    /// Record display metadata once resolved. Returns `false` if it was already set.
    pub fn set_metadata(&self, metadata: ItemMetadata) -> bool {
        self.metadata.set(metadata).is_ok()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.title.as_deref())
    }

    pub fn artist(&self) -> Option<&str> {
        self.metadata().and_then(|m| m.artist.as_deref())
    }

    /// Title, falling back to the file name.
    pub fn display_title(&self) -> String {
        self.title()
            .map(str::to_string)
            .unwrap_or_else(|| self.file_name())
    }

    /// Metadata forwarded to the playback adapter.
    pub fn playback_metadata(&self) -> PlaybackMetadata {
        PlaybackMetadata {
            track_id: self.transfer_id.clone(),
            title: self.title().map(str::to_string),
            artist: self.artist().map(str::to_string),
            ..PlaybackMetadata::default()
        }
    }

    pub(crate) fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl PartialEq for PlayableItem {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PlayableItem {}

impl Hash for PlayableItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// What a playlist is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistKind {
    /// A single attachment.
    Single,
    /// All audio attachments exchanged with one conversation partner.
    Conversation { partner: ConversationRef },
    /// A named collection.
    Collection { name: String },
}

/// Ordered sequence of items plus a human name.
///
/// Membership is fixed at construction; build a new playlist to change it.
#[derive(Debug, Clone)]
pub struct Playlist {
    name: String,
    kind: PlaylistKind,
    items: Vec<Arc<PlayableItem>>,
}

impl Playlist {
    /// Playlist holding exactly one item, named after it.
    pub fn single(item: Arc<PlayableItem>) -> Self {
        Self {
            name: item.display_title(),
            kind: PlaylistKind::Single,
            items: vec![item],
        }
    }

    pub fn conversation(partner: ConversationRef, items: Vec<Arc<PlayableItem>>) -> Self {
        let name = partner
            .display_name
            .clone()
            .unwrap_or_else(|| partner.id.clone());
        Self {
            name,
            kind: PlaylistKind::Conversation { partner },
            items,
        }
    }

    pub fn collection(name: impl Into<String>, items: Vec<Arc<PlayableItem>>) -> Self {
        let name = name.into();
        Self {
            name: name.clone(),
            kind: PlaylistKind::Collection { name },
            items,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PlaylistKind {
        &self.kind
    }

    pub fn items(&self) -> &[Arc<PlayableItem>] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Arc<PlayableItem>> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Position of `item` in the original order.
    pub fn position(&self, item: &PlayableItem) -> Option<usize> {
        self.items.iter().position(|candidate| candidate.as_ref() == item)
    }

    pub fn contains(&self, item: &PlayableItem) -> bool {
        self.position(item).is_some()
    }
}
