//! # Resource Coordinator
//!
//! Owns the exclusive resources the engine needs: the audio focus token, the
//! wake token and the single live output primitive.
//!
//! ## Invariants
//!
//! - At most one output primitive is live. A new primitive is only adopted
//!   after the previous one has been unloaded (acquire-after-release).
//! - Focus and wake token bookkeeping is idempotent: acquiring a held token
//!   does not call the host again, releasing an unheld one is a no-op.
//!
//! Bridge failures are logged here; callers see a `bool` or an `Option`
//! where a failure only means "not granted" or "no data".

use bridge_traits::{
    error::Result as BridgeResult, AudioFocus, FocusGrant, PlaybackAdapter, PlaybackRequest,
    PlaybackSessionId, PowerManager, PreparedSession,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{PlaybackError, Result};

/// Tag used for the transition wake lock.
pub const WAKE_LOCK_TAG: &str = "media-playback:transition";

pub struct ResourceCoordinator {
    adapter: Arc<dyn PlaybackAdapter>,
    focus: Arc<dyn AudioFocus>,
    power: Arc<dyn PowerManager>,
    wake_lock_timeout: Duration,
    has_focus: bool,
    holds_wake_token: bool,
    live: Option<PlaybackSessionId>,
}

impl ResourceCoordinator {
    pub fn new(
        adapter: Arc<dyn PlaybackAdapter>,
        focus: Arc<dyn AudioFocus>,
        power: Arc<dyn PowerManager>,
        wake_lock_timeout: Duration,
    ) -> Self {
        Self {
            adapter,
            focus,
            power,
            wake_lock_timeout,
            has_focus: false,
            holds_wake_token: false,
            live: None,
        }
    }

    // ------------------------------------------------------------------
    // Audio focus
    // ------------------------------------------------------------------

    /// Request audio focus. Returns whether it is held afterwards.
    pub async fn acquire_audio_focus(&mut self) -> bool {
        if self.has_focus {
            return true;
        }
        match self.focus.request_focus().await {
            Ok(FocusGrant::Granted) => {
                self.has_focus = true;
                debug!("Audio focus acquired");
                true
            }
            Ok(FocusGrant::Denied) => {
                debug!("Audio focus denied");
                false
            }
            Err(e) => {
                warn!(error = %e, "Audio focus request failed; treating as denied");
                false
            }
        }
    }

    pub async fn release_audio_focus(&mut self) {
        if !self.has_focus {
            return;
        }
        self.has_focus = false;
        if let Err(e) = self.focus.abandon_focus().await {
            warn!(error = %e, "Failed to abandon audio focus");
        }
    }

    /// The OS took focus away for good: drop the claim and unregister it
    /// with the host so a later play has to request focus again.
    pub async fn focus_revoked(&mut self) {
        self.release_audio_focus().await;
    }

    pub fn has_audio_focus(&self) -> bool {
        self.has_focus
    }

    // ------------------------------------------------------------------
    // Wake token
    // ------------------------------------------------------------------

    pub async fn acquire_wake_token(&mut self) {
        if self.holds_wake_token {
            return;
        }
        match self
            .power
            .acquire_wake_lock(WAKE_LOCK_TAG, self.wake_lock_timeout)
            .await
        {
            Ok(()) => {
                self.holds_wake_token = true;
                debug!("Wake token acquired");
            }
            Err(e) => warn!(error = %e, "Failed to acquire wake token"),
        }
    }

    pub async fn release_wake_token(&mut self) {
        if !self.holds_wake_token {
            return;
        }
        self.holds_wake_token = false;
        if let Err(e) = self.power.release_wake_lock(WAKE_LOCK_TAG).await {
            warn!(error = %e, "Failed to release wake token");
        }
    }

    pub fn holds_wake_token(&self) -> bool {
        self.holds_wake_token
    }

    /// Screen state; an unknown state counts as off.
    pub async fn is_screen_on(&self) -> bool {
        match self.power.is_screen_on().await {
            Ok(on) => on,
            Err(e) => {
                warn!(error = %e, "Failed to read screen state");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Output primitive
    // ------------------------------------------------------------------

    /// Release the live primitive, then start preparing a new one.
    ///
    /// The returned future does not borrow the coordinator, so the caller can
    /// keep handling commands while the host prepares. The session is not
    /// live until passed to [`adopt`](Self::adopt).
    #[instrument(skip(self, request), fields(path = %request.path.display()))]
    pub async fn create_output_primitive(
        &mut self,
        request: PlaybackRequest,
    ) -> BoxFuture<'static, BridgeResult<PreparedSession>> {
        self.destroy_output_primitive().await;
        let adapter = Arc::clone(&self.adapter);
        async move { adapter.prepare(request).await }.boxed()
    }

    /// Make `session` the live primitive.
    pub async fn adopt(&mut self, session: PlaybackSessionId) {
        if self.live == Some(session) {
            return;
        }
        self.destroy_output_primitive().await;
        self.live = Some(session);
    }

    /// Unload the live primitive, if any.
    pub async fn destroy_output_primitive(&mut self) {
        if let Some(session) = self.live.take() {
            self.unload(session).await;
            debug!(%session, "Output primitive destroyed");
        }
    }

    /// Unload a session that never became live (a superseded prepare).
    pub async fn discard(&self, session: PlaybackSessionId) {
        if self.live == Some(session) {
            return;
        }
        self.unload(session).await;
    }

    async fn unload(&self, session: PlaybackSessionId) {
        if let Err(e) = self.adapter.unload(session).await {
            warn!(%session, error = %e, "Failed to unload output primitive");
        }
    }

    pub fn live_session(&self) -> Option<PlaybackSessionId> {
        self.live
    }

    pub fn adapter(&self) -> Arc<dyn PlaybackAdapter> {
        Arc::clone(&self.adapter)
    }

    pub async fn play(&self, session: PlaybackSessionId) -> Result<()> {
        self.adapter
            .play(session)
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("play: {}", e)))
    }

    pub async fn pause(&self, session: PlaybackSessionId) -> Result<()> {
        self.adapter
            .pause(session)
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("pause: {}", e)))
    }

    pub async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()> {
        self.adapter
            .seek(session, position)
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("seek: {}", e)))
    }

    /// Current position of `session`; `None` if it was torn down mid-read.
    pub async fn position(&self, session: PlaybackSessionId) -> Option<Duration> {
        match self.adapter.get_position(session).await {
            Ok(position) => Some(position),
            Err(e) => {
                debug!(%session, error = %e, "Position unavailable");
                None
            }
        }
    }

    /// Release every resource held.
    pub async fn release_all(&mut self) {
        self.destroy_output_primitive().await;
        self.release_audio_focus().await;
        self.release_wake_token().await;
    }
}
