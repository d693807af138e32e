//! Notification Host Implementation backed by `tracing`

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    notification::{NotificationContent, NotificationHost, NotificationId},
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Notification host for desktop shells without a media notification area.
///
/// Each show/cancel is logged and the visible content is kept so callers can
/// inspect what would be on screen.
pub struct TracingNotificationHost {
    visible: RwLock<HashMap<NotificationId, NotificationContent>>,
}

impl TracingNotificationHost {
    pub fn new() -> Self {
        Self {
            visible: RwLock::new(HashMap::new()),
        }
    }

    /// Content currently shown in slot `id`, if any.
    pub async fn visible(&self, id: NotificationId) -> Option<NotificationContent> {
        self.visible.read().await.get(&id).cloned()
    }
}

impl Default for TracingNotificationHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationHost for TracingNotificationHost {
    async fn show(&self, id: NotificationId, content: NotificationContent) -> Result<()> {
        info!(
            notification_id = id.0,
            title = %content.title,
            subtitle = content.subtitle.as_deref().unwrap_or(""),
            is_playing = content.is_playing,
            "Showing playback notification"
        );
        self.visible.write().await.insert(id, content);
        Ok(())
    }

    async fn cancel(&self, id: NotificationId) -> Result<()> {
        if self.visible.write().await.remove(&id).is_some() {
            info!(notification_id = id.0, "Cancelled playback notification");
        }
        Ok(())
    }
}
