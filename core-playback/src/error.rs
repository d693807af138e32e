//! # Playback Error Types
//!
//! Errors raised by the playlist cursor, the resource coordinator and the
//! playback engine.
//!
//! Most of these never cross the engine boundary: the engine logs them and
//! surfaces the outcome as a `Stopped` state plus a `PlaybackEvent::Error` on
//! the event bus. Only [`PlaybackError::EngineShutdown`] and
//! [`PlaybackError::IndexOutOfRange`] are returned from the handle.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// The OS refused the audio focus token.
    #[error("Audio focus denied for {0}")]
    FocusDenied(String),

    /// The output primitive could not be prepared for an item.
    #[error("Failed to prepare {path}: {message}")]
    PrepareFailed { path: String, message: String },

    /// A live output primitive failed while starting, pausing or seeking.
    #[error("Playback operation failed: {0}")]
    PlaybackFailed(String),

    // ========================================================================
    // Cursor Errors
    // ========================================================================
    /// `set_index` was called with an index outside `[0, len)`.
    #[error("Index {index} out of range for playlist of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An operation needed a current item but the cursor is empty.
    #[error("No current item")]
    NoCurrentItem,

    // ========================================================================
    // Listener / Engine Errors
    // ========================================================================
    /// A listener panicked while handling a notification.
    #[error("Listener {listener} failed during {event}: {message}")]
    ListenerFailure {
        listener: u64,
        event: &'static str,
        message: String,
    },

    /// The engine task is no longer running.
    #[error("Playback engine has shut down")]
    EngineShutdown,

    /// A host bridge call failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the error leaves the engine able to continue with
    /// the next command.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PlaybackError::EngineShutdown)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_message() {
        let err = PlaybackError::IndexOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "Index 5 out of range for playlist of length 3");
    }

    #[test]
    fn test_bridge_error_conversion() {
        let err: PlaybackError = BridgeError::UnknownSession("abc".into()).into();
        assert!(matches!(err, PlaybackError::Bridge(_)));
        assert!(err.is_recoverable());
        assert!(!PlaybackError::EngineShutdown.is_recoverable());
    }
}
