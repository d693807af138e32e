//! Workspace umbrella crate.
//!
//! Host applications can depend on `chat-media-core` alone and enable the
//! documented features instead of wiring `core-service` and `core-playback`
//! individually.

#[cfg(feature = "desktop-shims")]
pub use core_playback as playback;
#[cfg(feature = "desktop-shims")]
pub use core_service::{bootstrap_desktop, CoreError, CoreService};
