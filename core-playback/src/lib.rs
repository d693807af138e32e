//! # Playback Module
//!
//! Media playback engine for chat attachments: voice memos, shared music
//! and video.
//!
//! ## Overview
//!
//! This module handles:
//! - Playlist navigation with shuffle and repeat ([`cursor`])
//! - Exclusive host resources: audio focus, wake token and the single live
//!   output primitive ([`resources`])
//! - The playback state machine and its command handle ([`engine`])
//! - Debounced foreground/background detection ([`lifecycle`])
//! - The system playback notification ([`notification`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{LifecycleSignal, PlayableItem, PlaybackEngine, Playlist};
//! use std::sync::Arc;
//!
//! let lifecycle = LifecycleSignal::with_event_bus(config.settings.background_debounce, bus.clone());
//! let playback = PlaybackEngine::spawn(&config, bus, &lifecycle);
//!
//! let memo = Arc::new(PlayableItem::new("/data/attachments/memo.m4a"));
//! playback.play_item_in_playlist(memo.clone(), Playlist::single(memo))?;
//! ```

pub mod cursor;
pub mod engine;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod listeners;
pub mod notification;
mod progress;
pub mod resources;

pub use cursor::{PlaylistCursor, RepeatMode};
pub use engine::{EngineSnapshot, PlaybackEngine, PlaybackHandle, PlaybackListener, PlaybackState};
pub use error::{PlaybackError, Result};
pub use item::{ItemMetadata, PlayableItem, Playlist, PlaylistKind};
pub use lifecycle::{LifecycleListener, LifecycleSignal};
pub use listeners::ListenerId;
pub use notification::{notification_content, NotificationPresenter};
pub use resources::ResourceCoordinator;
