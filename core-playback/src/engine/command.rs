//! Messages processed by the engine task.

use bridge_traits::{error::Result as BridgeResult, AdapterEvent, FocusChange, PreparedSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::cursor::RepeatMode;
use crate::error::Result;
use crate::item::{PlayableItem, Playlist};

use super::state::PlaybackState;

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    pub state: PlaybackState,
    pub current_item: Option<Arc<PlayableItem>>,
    pub current_index: Option<usize>,
    pub total_duration: Option<Duration>,
    pub repeat_mode: RepeatMode,
    pub shuffled: bool,
    pub playlist_len: usize,
    pub playlist_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleTransition {
    Foreground,
    Background,
}

#[derive(Debug)]
pub(crate) enum EngineCommand {
    // User commands
    Play,
    PlayItem(Arc<PlayableItem>),
    Pause,
    TogglePlayPause,
    Forward,
    Backward,
    Reset,
    Seek(Duration),
    SetRepeatMode(RepeatMode),
    SetShuffle(bool),
    PlayItemInPlaylist {
        item: Arc<PlayableItem>,
        playlist: Playlist,
    },
    SetPlaylist(Playlist),
    SetIndex {
        index: usize,
        reply: oneshot::Sender<Result<()>>,
    },

    // Queries
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Progress(oneshot::Sender<Option<Duration>>),

    // Marshalled notifications
    Prepared {
        request_id: u64,
        item: Arc<PlayableItem>,
        result: BridgeResult<PreparedSession>,
    },
    Adapter(AdapterEvent),
    Focus(FocusChange),
    Lifecycle(LifecycleTransition),
    ProgressTick,

    Shutdown(oneshot::Sender<()>),
}

impl EngineCommand {
    /// Short name for logs.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            EngineCommand::Play => "play",
            EngineCommand::PlayItem(_) => "play_item",
            EngineCommand::Pause => "pause",
            EngineCommand::TogglePlayPause => "toggle_play_pause",
            EngineCommand::Forward => "forward",
            EngineCommand::Backward => "backward",
            EngineCommand::Reset => "reset",
            EngineCommand::Seek(_) => "seek",
            EngineCommand::SetRepeatMode(_) => "set_repeat_mode",
            EngineCommand::SetShuffle(_) => "set_shuffle",
            EngineCommand::PlayItemInPlaylist { .. } => "play_item_in_playlist",
            EngineCommand::SetPlaylist(_) => "set_playlist",
            EngineCommand::SetIndex { .. } => "set_index",
            EngineCommand::Snapshot(_) => "snapshot",
            EngineCommand::Progress(_) => "progress",
            EngineCommand::Prepared { .. } => "prepared",
            EngineCommand::Adapter(_) => "adapter_event",
            EngineCommand::Focus(_) => "focus_change",
            EngineCommand::Lifecycle(_) => "lifecycle",
            EngineCommand::ProgressTick => "progress_tick",
            EngineCommand::Shutdown(_) => "shutdown",
        }
    }
}
