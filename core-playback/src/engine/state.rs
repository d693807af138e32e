//! Engine states.

use bridge_traits::PlaybackSessionId;
use core_runtime::events::PlaybackStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::item::PlayableItem;

/// Externally observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn is_stopped(self) -> bool {
        self == PlaybackState::Stopped
    }

    pub fn is_paused(self) -> bool {
        self == PlaybackState::Paused
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Paused => "paused",
            PlaybackState::Playing => "playing",
        };
        f.write_str(name)
    }
}

impl From<PlaybackState> for PlaybackStatus {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Stopped => PlaybackStatus::Stopped,
            PlaybackState::Paused => PlaybackStatus::Paused,
            PlaybackState::Playing => PlaybackStatus::Playing,
        }
    }
}

/// An in-flight prepare.
#[derive(Debug, Clone)]
pub(crate) struct PrepareRequest {
    /// Monotonic id; a completion whose id no longer matches is stale.
    pub id: u64,
    /// Start playing once prepared, otherwise settle in `Paused`.
    pub autoplay: bool,
    /// Position to seek to once prepared.
    pub seek_to: Option<Duration>,
    /// State reported while the prepare is in flight. A fresh start reports
    /// `Stopped`; replacing a live item keeps reporting what was live.
    pub reported: PlaybackState,
}

impl PrepareRequest {
    /// Start playing once prepared.
    pub fn resume(&mut self) {
        self.autoplay = true;
        if self.reported.is_paused() {
            self.reported = PlaybackState::Playing;
        }
    }

    /// Settle in `Paused` once prepared.
    pub fn hold(&mut self) {
        self.autoplay = false;
        if self.reported.is_playing() {
            self.reported = PlaybackState::Paused;
        }
    }
}

/// Internal engine state. Whether a primitive is live is encoded in the
/// variant, never inferred.
#[derive(Debug, Default)]
pub(crate) enum EngineState {
    #[default]
    Idle,
    Preparing {
        item: Arc<PlayableItem>,
        request: PrepareRequest,
    },
    Playing {
        item: Arc<PlayableItem>,
        session: PlaybackSessionId,
    },
    Paused {
        item: Arc<PlayableItem>,
        session: PlaybackSessionId,
    },
}

impl EngineState {
    /// `Preparing` reports whatever the request carries: `Stopped` until a
    /// fresh primitive starts, the previous state while a live item is
    /// being replaced.
    pub fn public(&self) -> PlaybackState {
        match self {
            EngineState::Idle => PlaybackState::Stopped,
            EngineState::Preparing { request, .. } => request.reported,
            EngineState::Playing { .. } => PlaybackState::Playing,
            EngineState::Paused { .. } => PlaybackState::Paused,
        }
    }

    pub fn item(&self) -> Option<&Arc<PlayableItem>> {
        match self {
            EngineState::Idle => None,
            EngineState::Preparing { item, .. }
            | EngineState::Playing { item, .. }
            | EngineState::Paused { item, .. } => Some(item),
        }
    }

    pub fn session(&self) -> Option<PlaybackSessionId> {
        match self {
            EngineState::Playing { session, .. } | EngineState::Paused { session, .. } => {
                Some(*session)
            }
            _ => None,
        }
    }

    /// Whether the user intends audio to be audible.
    pub fn wants_playback(&self) -> bool {
        match self {
            EngineState::Playing { .. } => true,
            EngineState::Preparing { request, .. } => request.autoplay,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preparing(reported: PlaybackState) -> EngineState {
        EngineState::Preparing {
            item: Arc::new(PlayableItem::new("/media/a.ogg")),
            request: PrepareRequest {
                id: 1,
                autoplay: true,
                seek_to: None,
                reported,
            },
        }
    }

    #[test]
    fn test_fresh_prepare_reports_stopped() {
        let state = preparing(PlaybackState::Stopped);
        assert_eq!(state.public(), PlaybackState::Stopped);
        assert!(state.session().is_none());
        assert!(state.wants_playback());
        assert!(state.item().is_some());
    }

    #[test]
    fn test_replacing_prepare_keeps_previous_state() {
        assert_eq!(
            preparing(PlaybackState::Playing).public(),
            PlaybackState::Playing
        );
    }

    #[test]
    fn test_hold_and_resume_follow_reported_state() {
        let mut request = PrepareRequest {
            id: 3,
            autoplay: true,
            seek_to: None,
            reported: PlaybackState::Playing,
        };
        request.hold();
        assert!(!request.autoplay);
        assert_eq!(request.reported, PlaybackState::Paused);
        request.resume();
        assert!(request.autoplay);
        assert_eq!(request.reported, PlaybackState::Playing);

        let mut fresh = PrepareRequest {
            reported: PlaybackState::Stopped,
            ..request
        };
        fresh.hold();
        fresh.resume();
        assert_eq!(fresh.reported, PlaybackState::Stopped);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PlaybackStatus::from(PlaybackState::Paused),
            PlaybackStatus::Paused
        );
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert_eq!(PlaybackState::Playing.to_string(), "playing");
    }
}
