//! # Playback Engine
//!
//! State machine driving a single output primitive through
//! `Idle → Preparing → Playing ⇄ Paused`.
//!
//! ## Architecture
//!
//! The engine runs as one tokio task that owns all mutable state: the
//! playlist cursor, the resource coordinator and the notification presenter.
//! Everything reaches it as an [`EngineCommand`] on a single mailbox:
//!
//! ```text
//!  PlaybackHandle ──┐
//!  adapter events ──┤
//!  focus changes  ──┼──> mailbox ──> engine task ──> listeners / EventBus
//!  lifecycle      ──┤
//!  progress ticks ──┘
//! ```
//!
//! Host callbacks are therefore applied in arrival order on one logical
//! thread, and a prepare that completes after a newer request is recognised
//! by its request id and discarded.
//!
//! Outward notifications (listeners, then the event bus) are published after
//! each command, and only for actual changes of state or current item.

mod actor;
mod command;
mod handle;
mod state;

use std::sync::Arc;

use crate::item::PlayableItem;

pub use actor::PlaybackEngine;
pub use command::EngineSnapshot;
pub(crate) use command::{EngineCommand, LifecycleTransition};
pub use handle::PlaybackHandle;
pub use state::PlaybackState;

/// Receives engine transitions.
///
/// Called synchronously on the engine task, in registration order. A
/// listener that panics is logged and skipped.
pub trait PlaybackListener: Send + Sync {
    fn on_state_changed(&self, _state: PlaybackState) {}
    fn on_track_changed(&self, _item: Option<Arc<PlayableItem>>) {}
}
