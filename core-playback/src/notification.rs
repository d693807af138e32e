//! # Notification Presenter
//!
//! Keeps the system playback notification in sync with the engine while the
//! app is backgrounded. In the foreground the in-app player is visible, so
//! the notification is removed; it is also removed whenever playback stops.

use bridge_traits::{NotificationContent, NotificationHost, NotificationId, TapTarget};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::PlaybackState;
use crate::item::PlayableItem;

/// Build the notification content for `item`.
///
/// The title falls back to the file name; the subtitle is the artist, or the
/// playlist name when the artist is unknown.
pub fn notification_content(
    item: &PlayableItem,
    playlist_name: Option<&str>,
    is_playing: bool,
) -> NotificationContent {
    let subtitle = item
        .artist()
        .map(str::to_string)
        .or_else(|| playlist_name.map(str::to_string));
    let tap_target = match item.conversation() {
        Some(conversation) => TapTarget::Conversation(conversation.clone()),
        None => TapTarget::Player,
    };

    NotificationContent {
        title: item.display_title(),
        subtitle,
        is_playing,
        tap_target,
    }
}

/// Shows and hides the playback notification through the host.
pub struct NotificationPresenter {
    host: Arc<dyn NotificationHost>,
    id: NotificationId,
    visible: bool,
}

impl NotificationPresenter {
    pub fn new(host: Arc<dyn NotificationHost>, id: NotificationId) -> Self {
        Self {
            host,
            id,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Reconcile the notification with the current engine state.
    pub async fn update(
        &mut self,
        backgrounded: bool,
        state: PlaybackState,
        item: Option<&PlayableItem>,
        playlist_name: Option<&str>,
    ) {
        let item = match item {
            Some(item) if backgrounded && state != PlaybackState::Stopped => item,
            _ => {
                self.hide().await;
                return;
            }
        };

        let content = notification_content(item, playlist_name, state == PlaybackState::Playing);
        match self.host.show(self.id, content).await {
            Ok(()) => {
                self.visible = true;
                debug!(notification_id = self.id.0, ?state, "Playback notification shown");
            }
            Err(e) => warn!(error = %e, "Failed to show playback notification"),
        }
    }

    /// Remove the notification if it is showing.
    pub async fn hide(&mut self) {
        if !self.visible {
            return;
        }
        if let Err(e) = self.host.cancel(self.id).await {
            warn!(error = %e, "Failed to cancel playback notification");
        }
        self.visible = false;
    }
}
