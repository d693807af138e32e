//! Cloneable front end to the engine task.

use core_runtime::events::{CoreEvent, EventBus, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::cursor::RepeatMode;
use crate::error::{PlaybackError, Result};
use crate::item::{PlayableItem, Playlist};
use crate::listeners::{ListenerId, ListenerRegistry};

use super::command::{EngineCommand, EngineSnapshot};
use super::state::PlaybackState;
use super::PlaybackListener;

/// Handle to a running [`PlaybackEngine`](super::PlaybackEngine).
///
/// Commands are queued and return as soon as they are accepted; their effect
/// is observable through listeners, the event bus or the query methods.
/// The engine stops once every handle is dropped or
/// [`shutdown`](Self::shutdown) is called.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    listeners: Arc<ListenerRegistry<dyn PlaybackListener>>,
    events: EventBus,
}

impl PlaybackHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<EngineCommand>,
        listeners: Arc<ListenerRegistry<dyn PlaybackListener>>,
        events: EventBus,
    ) -> Self {
        Self {
            commands,
            listeners,
            events,
        }
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::EngineShutdown)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| PlaybackError::EngineShutdown)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Resume, or start the cursor's current item.
    pub fn play(&self) -> Result<()> {
        self.send(EngineCommand::Play)
    }

    /// Play `item`, replacing the playlist with it unless it is already part
    /// of the current one.
    pub fn play_item(&self, item: Arc<PlayableItem>) -> Result<()> {
        self.send(EngineCommand::PlayItem(item))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(EngineCommand::Pause)
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(EngineCommand::TogglePlayPause)
    }

    pub fn forward(&self) -> Result<()> {
        self.send(EngineCommand::Forward)
    }

    pub fn backward(&self) -> Result<()> {
        self.send(EngineCommand::Backward)
    }

    /// Stop playback, release every resource and clear the cursor.
    pub fn reset(&self) -> Result<()> {
        self.send(EngineCommand::Reset)
    }

    /// Seek the live primitive; the state does not change.
    ///
    /// With nothing prepared this is a state transition: the current item is
    /// prepared, the seek is applied once it is ready, and the engine moves
    /// from `Stopped` to `Paused` at `position`. Call [`play`](Self::play)
    /// to start from there.
    pub fn set_seek_position(&self, position: Duration) -> Result<()> {
        self.send(EngineCommand::Seek(position))
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        self.send(EngineCommand::SetRepeatMode(mode))
    }

    pub fn set_shuffle_active(&self, shuffled: bool) -> Result<()> {
        self.send(EngineCommand::SetShuffle(shuffled))
    }

    /// Play `item` from `playlist`. Re-selecting the item that is already
    /// current resumes it instead of recreating the primitive.
    pub fn play_item_in_playlist(&self, item: Arc<PlayableItem>, playlist: Playlist) -> Result<()> {
        self.send(EngineCommand::PlayItemInPlaylist { item, playlist })
    }

    pub fn set_playlist(&self, playlist: Playlist) -> Result<()> {
        self.send(EngineCommand::SetPlaylist(playlist))
    }

    /// Move the cursor to `index` in the effective order. Playback follows
    /// if something is active.
    pub async fn set_index(&self, index: usize) -> Result<()> {
        self.request(|reply| EngineCommand::SetIndex { index, reply })
            .await?
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        self.request(EngineCommand::Snapshot).await
    }

    pub async fn state(&self) -> Result<PlaybackState> {
        Ok(self.snapshot().await?.state)
    }

    pub async fn is_stopped(&self) -> Result<bool> {
        Ok(self.state().await?.is_stopped())
    }

    pub async fn is_paused(&self) -> Result<bool> {
        Ok(self.state().await?.is_paused())
    }

    pub async fn is_playing(&self) -> Result<bool> {
        Ok(self.state().await?.is_playing())
    }

    pub async fn current_index(&self) -> Result<Option<usize>> {
        Ok(self.snapshot().await?.current_index)
    }

    pub async fn current_media_item(&self) -> Result<Option<Arc<PlayableItem>>> {
        Ok(self.snapshot().await?.current_item)
    }

    /// Duration of the current item, once known.
    pub async fn total_duration(&self) -> Result<Option<Duration>> {
        Ok(self.snapshot().await?.total_duration)
    }

    pub async fn repeat_mode(&self) -> Result<RepeatMode> {
        Ok(self.snapshot().await?.repeat_mode)
    }

    pub async fn is_shuffled(&self) -> Result<bool> {
        Ok(self.snapshot().await?.shuffled)
    }

    pub async fn playlist_len(&self) -> Result<usize> {
        Ok(self.snapshot().await?.playlist_len)
    }

    /// Position of the live primitive; `None` when nothing is playing or
    /// paused.
    pub async fn current_progress(&self) -> Result<Option<Duration>> {
        self.request(EngineCommand::Progress).await
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn add_listener(&self, listener: Arc<dyn PlaybackListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Stop the engine and wait until every resource is released.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(EngineCommand::Shutdown).await
    }
}
