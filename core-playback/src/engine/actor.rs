//! The engine task.

use bridge_traits::{
    error::Result as BridgeResult, AdapterEvent, AudioFocus, FocusChange, NotificationId,
    PlaybackAdapter, PlaybackRequest, PlaybackSessionId, PreparedSession,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::cursor::{PlaylistCursor, RepeatMode};
use crate::error::{PlaybackError, Result};
use crate::item::{PlayableItem, Playlist};
use crate::lifecycle::{LifecycleListener, LifecycleSignal};
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::notification::NotificationPresenter;
use crate::progress::ProgressPoller;
use crate::resources::ResourceCoordinator;

use super::command::{EngineCommand, EngineSnapshot, LifecycleTransition};
use super::handle::PlaybackHandle;
use super::state::{EngineState, PlaybackState, PrepareRequest};
use super::PlaybackListener;

/// Posts debounced lifecycle declarations to the engine mailbox.
struct LifecycleForwarder {
    mailbox: WeakUnboundedSender<EngineCommand>,
}

impl LifecycleForwarder {
    fn forward(&self, transition: LifecycleTransition) {
        if let Some(sender) = self.mailbox.upgrade() {
            let _ = sender.send(EngineCommand::Lifecycle(transition));
        }
    }
}

impl LifecycleListener for LifecycleForwarder {
    fn on_became_foreground(&self) {
        self.forward(LifecycleTransition::Foreground);
    }

    fn on_became_background(&self) {
        self.forward(LifecycleTransition::Background);
    }
}

/// Playback engine. Owned by its task; interact with it through the
/// [`PlaybackHandle`] returned by [`spawn`](Self::spawn).
pub struct PlaybackEngine {
    state: EngineState,
    cursor: PlaylistCursor,
    resources: ResourceCoordinator,
    presenter: NotificationPresenter,
    listeners: Arc<ListenerRegistry<dyn PlaybackListener>>,
    events: EventBus,
    mailbox: WeakUnboundedSender<EngineCommand>,
    lifecycle: LifecycleSignal,
    lifecycle_listener: Option<ListenerId>,
    poller: Option<ProgressPoller>,
    pumps: Vec<JoinHandle<()>>,
    backgrounded: bool,
    focus_paused: bool,
    last_state: PlaybackState,
    last_item: Option<Arc<PlayableItem>>,
    next_request_id: u64,
}

impl PlaybackEngine {
    /// Start the engine on the current tokio runtime.
    ///
    /// The engine follows `lifecycle` for notification and wake token
    /// handling and publishes its events on `events`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(config: &CoreConfig, events: EventBus, lifecycle: &LifecycleSignal) -> PlaybackHandle {
        let settings = &config.settings;
        let (sender, receiver) = mpsc::unbounded_channel();
        let mailbox = sender.downgrade();
        let listeners: Arc<ListenerRegistry<dyn PlaybackListener>> =
            Arc::new(ListenerRegistry::new());

        let lifecycle_listener = lifecycle.add_listener(Arc::new(LifecycleForwarder {
            mailbox: mailbox.clone(),
        }));

        let engine = PlaybackEngine {
            state: EngineState::Idle,
            cursor: PlaylistCursor::new(),
            resources: ResourceCoordinator::new(
                Arc::clone(&config.playback_adapter),
                Arc::clone(&config.audio_focus),
                Arc::clone(&config.power_manager),
                settings.wake_lock_timeout,
            ),
            presenter: NotificationPresenter::new(
                Arc::clone(&config.notification_host),
                NotificationId(settings.notification_id),
            ),
            listeners: Arc::clone(&listeners),
            events: events.clone(),
            mailbox: mailbox.clone(),
            lifecycle: lifecycle.clone(),
            lifecycle_listener: Some(lifecycle_listener),
            poller: Some(ProgressPoller::spawn(settings.progress_interval, mailbox)),
            pumps: Vec::new(),
            backgrounded: lifecycle.is_background(),
            focus_paused: false,
            last_state: PlaybackState::Stopped,
            last_item: None,
            next_request_id: 0,
        };

        let adapter = Arc::clone(&config.playback_adapter);
        let focus = Arc::clone(&config.audio_focus);
        tokio::spawn(engine.run(receiver, adapter, focus));

        PlaybackHandle::new(sender, listeners, events)
    }

    async fn run(
        mut self,
        mut commands: UnboundedReceiver<EngineCommand>,
        adapter: Arc<dyn PlaybackAdapter>,
        focus: Arc<dyn AudioFocus>,
    ) {
        self.start_pumps(adapter, focus).await;
        info!("Playback engine started");

        while let Some(command) = commands.recv().await {
            trace!(command = command.name(), "Engine command");
            if let EngineCommand::Shutdown(ack) = command {
                commands.close();
                self.teardown().await;
                let _ = ack.send(());
                return;
            }
            self.handle(command).await;
            self.publish().await;
        }

        // Every handle was dropped
        self.teardown().await;
    }

    /// Forward host callbacks into the mailbox.
    async fn start_pumps(&mut self, adapter: Arc<dyn PlaybackAdapter>, focus: Arc<dyn AudioFocus>) {
        match adapter.subscribe_events().await {
            Ok(mut stream) => {
                let mailbox = self.mailbox.clone();
                self.pumps.push(tokio::spawn(async move {
                    while let Some(event) = stream.next().await {
                        let Some(sender) = mailbox.upgrade() else {
                            break;
                        };
                        if sender.send(EngineCommand::Adapter(event)).is_err() {
                            break;
                        }
                    }
                    debug!("Adapter event stream closed");
                }));
            }
            Err(e) => warn!(
                error = %e,
                "Adapter events unavailable; completion will not advance the playlist"
            ),
        }

        match focus.subscribe_changes().await {
            Ok(mut stream) => {
                let mailbox = self.mailbox.clone();
                self.pumps.push(tokio::spawn(async move {
                    while let Some(change) = stream.next().await {
                        let Some(sender) = mailbox.upgrade() else {
                            break;
                        };
                        if sender.send(EngineCommand::Focus(change)).is_err() {
                            break;
                        }
                    }
                    debug!("Focus change stream closed");
                }));
            }
            Err(e) => warn!(error = %e, "Audio focus changes unavailable"),
        }
    }

    async fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Play => self.play().await,
            EngineCommand::PlayItem(item) => self.play_item(item).await,
            EngineCommand::Pause => {
                self.focus_paused = false;
                self.pause().await;
            }
            EngineCommand::TogglePlayPause => {
                if self.state.wants_playback() {
                    self.focus_paused = false;
                    self.pause().await;
                } else {
                    self.play().await;
                }
            }
            EngineCommand::Forward => self.navigate(true).await,
            EngineCommand::Backward => self.navigate(false).await,
            EngineCommand::Reset => self.reset().await,
            EngineCommand::Seek(position) => self.seek(position).await,
            EngineCommand::SetRepeatMode(mode) => {
                debug!(?mode, "Repeat mode changed");
                self.cursor.set_repeat_mode(mode);
            }
            EngineCommand::SetShuffle(shuffled) => {
                debug!(shuffled, "Shuffle changed");
                self.cursor.set_shuffled(shuffled);
            }
            EngineCommand::PlayItemInPlaylist { item, playlist } => {
                self.play_item_in_playlist(item, playlist).await
            }
            EngineCommand::SetPlaylist(playlist) => self.set_playlist(playlist).await,
            EngineCommand::SetIndex { index, reply } => {
                let result = self.set_index(index).await;
                let _ = reply.send(result);
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            EngineCommand::Progress(reply) => {
                let position = match self.state.session() {
                    Some(session) => self.resources.position(session).await,
                    None => None,
                };
                let _ = reply.send(position);
            }
            EngineCommand::Prepared {
                request_id,
                item,
                result,
            } => self.on_prepared(request_id, item, result).await,
            EngineCommand::Adapter(event) => self.on_adapter_event(event).await,
            EngineCommand::Focus(change) => self.on_focus_change(change).await,
            EngineCommand::Lifecycle(transition) => self.on_lifecycle(transition).await,
            EngineCommand::ProgressTick => self.on_progress_tick().await,
            EngineCommand::Shutdown(ack) => {
                // Handled by the run loop
                let _ = ack.send(());
            }
        }
    }

    // ------------------------------------------------------------------
    // User commands
    // ------------------------------------------------------------------

    async fn play(&mut self) {
        self.focus_paused = false;
        match std::mem::take(&mut self.state) {
            EngineState::Paused { item, session } => self.resume(item, session).await,
            EngineState::Preparing { item, mut request } => {
                request.resume();
                self.state = EngineState::Preparing { item, request };
            }
            EngineState::Idle => match self.cursor.current_item() {
                Some(item) => self.start(item, true, None).await,
                None => debug!("Nothing to play"),
            },
            playing @ EngineState::Playing { .. } => self.state = playing,
        }
    }

    async fn play_item(&mut self, item: Arc<PlayableItem>) {
        match self.cursor.index_of(&item) {
            Some(index) => {
                if let Err(e) = self.cursor.set_index(index) {
                    warn!(error = %e, "Failed to move cursor");
                }
            }
            None => self.cursor.set_playlist(Playlist::single(Arc::clone(&item))),
        }
        self.start(item, true, None).await;
    }

    async fn pause(&mut self) {
        match std::mem::take(&mut self.state) {
            EngineState::Playing { item, session } => match self.resources.pause(session).await {
                Ok(()) => self.state = EngineState::Paused { item, session },
                Err(e) => self.fail(&item, e).await,
            },
            EngineState::Preparing { item, mut request } => {
                request.hold();
                self.state = EngineState::Preparing { item, request };
            }
            other => self.state = other,
        }
    }

    async fn navigate(&mut self, forward: bool) {
        if matches!(self.state, EngineState::Idle) {
            // Nothing playing: only move the cursor
            if forward {
                self.cursor.forward();
            } else {
                self.cursor.backward();
            }
            return;
        }

        let next = if forward {
            self.cursor.forward()
        } else {
            self.cursor.backward()
        };
        match next {
            Some(item) => self.start(item, true, None).await,
            None => {
                debug!(forward, "End of playlist");
                self.reset().await;
            }
        }
    }

    async fn reset(&mut self) {
        self.state = EngineState::Idle;
        self.focus_paused = false;
        self.resources.release_all().await;
        self.cursor.reset();
        self.presenter.hide().await;
    }

    async fn seek(&mut self, position: Duration) {
        if let Some(session) = self.state.session() {
            if let Err(e) = self.resources.seek(session, position).await {
                warn!(error = %e, "Seek failed");
            }
            return;
        }

        if let EngineState::Preparing { request, .. } = &mut self.state {
            request.seek_to = Some(position);
            return;
        }

        match self.cursor.current_item() {
            Some(item) => self.start(item, false, Some(position)).await,
            None => debug!("Seek ignored; nothing to play"),
        }
    }

    async fn play_item_in_playlist(&mut self, item: Arc<PlayableItem>, playlist: Playlist) {
        let is_current = self
            .state
            .item()
            .map_or(false, |current| current.as_ref() == item.as_ref());
        if is_current {
            match std::mem::take(&mut self.state) {
                EngineState::Paused { item, session } => self.resume(item, session).await,
                EngineState::Preparing { item, mut request } => {
                    request.resume();
                    self.state = EngineState::Preparing { item, request };
                }
                other => self.state = other,
            }
            return;
        }

        if !playlist.contains(&item) {
            warn!(
                playlist = playlist.name(),
                file = %item.file_name(),
                "Item is not part of the playlist; ignoring"
            );
            return;
        }

        self.cursor.set_playlist(playlist);
        if let Some(index) = self.cursor.index_of(&item) {
            if let Err(e) = self.cursor.set_index(index) {
                warn!(error = %e, "Failed to move cursor");
            }
        }
        self.start(item, true, None).await;
    }

    async fn set_playlist(&mut self, playlist: Playlist) {
        let active = self.state.item().cloned();
        self.cursor.set_playlist(playlist);

        let Some(item) = active else {
            return;
        };
        match self.cursor.index_of(&item) {
            Some(index) => {
                if let Err(e) = self.cursor.set_index(index) {
                    warn!(error = %e, "Failed to move cursor");
                }
            }
            None => {
                debug!("Active item left the playlist; stopping");
                self.stop().await;
            }
        }
    }

    async fn set_index(&mut self, index: usize) -> Result<()> {
        let previous = self.cursor.current_item();
        self.cursor.set_index(index)?;

        let Some(item) = self.cursor.current_item() else {
            return Ok(());
        };
        if previous.as_ref() == Some(&item) {
            return Ok(());
        }

        let autoplay = match &self.state {
            EngineState::Idle => return Ok(()),
            EngineState::Paused { .. } => false,
            EngineState::Playing { .. } => true,
            EngineState::Preparing { request, .. } => request.autoplay,
        };
        self.start(item, autoplay, None).await;
        Ok(())
    }

    fn snapshot(&self) -> EngineSnapshot {
        let current_item = self.cursor.current_item();
        EngineSnapshot {
            state: self.state.public(),
            total_duration: current_item.as_ref().and_then(|item| item.duration()),
            current_item,
            current_index: self.cursor.current_index(),
            repeat_mode: self.cursor.repeat_mode(),
            shuffled: self.cursor.is_shuffled(),
            playlist_len: self.cursor.len(),
            playlist_name: self.cursor.playlist().map(|p| p.name().to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Release the current primitive and begin preparing `item`.
    ///
    /// Replacing a live item keeps its public state until the new primitive
    /// settles; only a start from `Stopped` stays stopped until focus is
    /// granted.
    async fn start(&mut self, item: Arc<PlayableItem>, autoplay: bool, seek_to: Option<Duration>) {
        self.focus_paused = false;

        self.next_request_id += 1;
        let mut request = PrepareRequest {
            id: self.next_request_id,
            autoplay,
            seek_to,
            reported: self.state.public(),
        };
        if !request.reported.is_stopped() {
            if autoplay {
                request.resume();
            } else {
                request.hold();
            }
        }

        let path = item.path_string();
        debug!(
            request_id = request.id,
            file = strip_path(&path),
            autoplay,
            "Preparing output primitive"
        );

        let prepare = self
            .resources
            .create_output_primitive(
                PlaybackRequest::new(item.path()).with_metadata(item.playback_metadata()),
            )
            .await;
        let adapter = self.resources.adapter();
        let mailbox = self.mailbox.clone();
        let request_id = request.id;
        let prepared_item = Arc::clone(&item);
        tokio::spawn(async move {
            let result = prepare.await;
            let message = EngineCommand::Prepared {
                request_id,
                item: prepared_item,
                result,
            };
            let undelivered = match mailbox.upgrade() {
                Some(sender) => sender.send(message).err().map(|e| e.0),
                None => Some(message),
            };
            // The engine is gone; nobody else will unload this primitive
            if let Some(EngineCommand::Prepared {
                result: Ok(prepared),
                ..
            }) = undelivered
            {
                let _ = adapter.unload(prepared.session).await;
            }
        });

        self.state = EngineState::Preparing { item, request };
    }

    async fn on_prepared(
        &mut self,
        request_id: u64,
        item: Arc<PlayableItem>,
        result: BridgeResult<PreparedSession>,
    ) {
        let is_current = matches!(
            &self.state,
            EngineState::Preparing { request, .. } if request.id == request_id
        );
        if !is_current {
            debug!(request_id, "Discarding superseded prepare");
            if let Ok(prepared) = result {
                self.resources.discard(prepared.session).await;
            }
            return;
        }

        let request = match std::mem::take(&mut self.state) {
            EngineState::Preparing { request, .. } => request,
            other => {
                self.state = other;
                return;
            }
        };

        let prepared = match result {
            Ok(prepared) => prepared,
            Err(e) => {
                let failure = PlaybackError::PrepareFailed {
                    path: item.path_string(),
                    message: e.to_string(),
                };
                error!(error = %failure, "Failed to prepare output primitive");
                self.emit_error(Some(&item), &failure);
                self.stop().await;
                return;
            }
        };

        let session = prepared.session;
        self.resources.adopt(session).await;
        if let Some(duration) = prepared.duration {
            item.set_duration(duration);
        }
        if let Some(position) = request.seek_to {
            if let Err(e) = self.resources.seek(session, position).await {
                warn!(error = %e, "Seek after prepare failed");
            }
        }

        if request.autoplay {
            self.begin(item, session).await;
        } else {
            self.state = EngineState::Paused { item, session };
        }
    }

    /// Start a freshly prepared primitive. A focus denial abandons it.
    async fn begin(&mut self, item: Arc<PlayableItem>, session: PlaybackSessionId) {
        if !self.resources.acquire_audio_focus().await {
            self.focus_denied(&item);
            self.resources.destroy_output_primitive().await;
            self.state = EngineState::Idle;
            return;
        }
        match self.resources.play(session).await {
            Ok(()) => self.state = EngineState::Playing { item, session },
            Err(e) => self.fail(&item, e).await,
        }
    }

    /// Resume a paused primitive. A focus denial leaves it paused.
    async fn resume(&mut self, item: Arc<PlayableItem>, session: PlaybackSessionId) {
        if !self.resources.acquire_audio_focus().await {
            self.focus_denied(&item);
            self.state = EngineState::Paused { item, session };
            return;
        }
        match self.resources.play(session).await {
            Ok(()) => self.state = EngineState::Playing { item, session },
            Err(e) => self.fail(&item, e).await,
        }
    }

    /// Tear the primitive down without touching the cursor.
    async fn stop(&mut self) {
        self.state = EngineState::Idle;
        self.focus_paused = false;
        self.resources.destroy_output_primitive().await;
        self.resources.release_audio_focus().await;
    }

    /// Unrecoverable primitive failure: report it and stop.
    async fn fail(&mut self, item: &PlayableItem, failure: PlaybackError) {
        error!(error = %failure, "Output primitive failed; stopping");
        self.emit_error(Some(item), &failure);
        self.stop().await;
    }

    fn focus_denied(&self, item: &PlayableItem) {
        let denial = PlaybackError::FocusDenied(item.path_string());
        warn!(error = %denial, "Not starting playback");
        self.emit(PlaybackEvent::FocusDenied {
            path: item.path_string(),
        });
    }

    // ------------------------------------------------------------------
    // Host callbacks
    // ------------------------------------------------------------------

    async fn on_adapter_event(&mut self, event: AdapterEvent) {
        let (item, session) = match &self.state {
            EngineState::Playing { item, session } | EngineState::Paused { item, session }
                if *session == event.session() =>
            {
                (Arc::clone(item), *session)
            }
            _ => {
                debug!(session = %event.session(), "Ignoring event for a stale session");
                return;
            }
        };

        match event {
            AdapterEvent::Completed { .. } => self.on_completed(item, session).await,
            AdapterEvent::Error { message, .. } => {
                let failure = PlaybackError::PlaybackFailed(message);
                error!(error = %failure, "Output primitive reported an error");
                self.emit(PlaybackEvent::Error {
                    path: Some(item.path_string()),
                    message: failure.to_string(),
                    recoverable: true,
                });
            }
        }
    }

    async fn on_completed(&mut self, item: Arc<PlayableItem>, session: PlaybackSessionId) {
        debug!(file = %item.file_name(), "Playback completed");
        if self.cursor.repeat_mode() == RepeatMode::Item {
            let replay = match self.resources.seek(session, Duration::ZERO).await {
                Ok(()) => self.resources.play(session).await,
                Err(e) => Err(e),
            };
            match replay {
                Ok(()) => self.state = EngineState::Playing { item, session },
                Err(e) => {
                    debug!(error = %e, "Replay on the same primitive failed; recreating");
                    self.start(item, true, None).await;
                }
            }
        } else if self.cursor.can_forward() {
            self.navigate(true).await;
        } else {
            self.reset().await;
        }
    }

    async fn on_focus_change(&mut self, change: FocusChange) {
        debug!(?change, "Audio focus changed");
        match change {
            FocusChange::Lost => {
                self.focus_paused = false;
                if matches!(self.state, EngineState::Playing { .. }) {
                    self.pause().await;
                }
                self.resources.focus_revoked().await;
            }
            FocusChange::LostTransient => {
                if matches!(self.state, EngineState::Playing { .. }) {
                    self.pause().await;
                    self.focus_paused = true;
                }
            }
            FocusChange::Gained => {
                if !std::mem::replace(&mut self.focus_paused, false) {
                    return;
                }
                match std::mem::take(&mut self.state) {
                    EngineState::Paused { item, session } => self.resume(item, session).await,
                    other => self.state = other,
                }
            }
        }
    }

    async fn on_lifecycle(&mut self, transition: LifecycleTransition) {
        match transition {
            LifecycleTransition::Background => {
                self.backgrounded = true;
                if !self.state.public().is_stopped() {
                    if self.resources.is_screen_on().await {
                        self.resources.acquire_wake_token().await;
                    }
                    self.refresh_notification().await;
                }
            }
            LifecycleTransition::Foreground => {
                self.backgrounded = false;
                self.resources.release_wake_token().await;
                self.presenter.hide().await;
            }
        }
    }

    async fn on_progress_tick(&mut self) {
        let EngineState::Playing { item, session } = &self.state else {
            return;
        };
        let (item, session) = (Arc::clone(item), *session);
        let Some(position) = self.resources.position(session).await else {
            return;
        };
        self.emit(PlaybackEvent::PositionChanged {
            path: item.path_string(),
            position_ms: position.as_millis() as u64,
            duration_ms: item.duration().map_or(0, |d| d.as_millis() as u64),
        });
    }

    // ------------------------------------------------------------------
    // Publication
    // ------------------------------------------------------------------

    /// Fan out whatever changed since the last command.
    async fn publish(&mut self) {
        let item = self.cursor.current_item();
        let track_changed = item != self.last_item;
        if track_changed {
            self.last_item = item.clone();
            let index = self.cursor.current_index();
            let path = item.as_ref().map(|item| item.path_string());
            debug!(file = path.as_deref().map(strip_path), ?index, "Current item changed");

            self.listeners
                .notify("on_track_changed", |listener| listener.on_track_changed(item.clone()));
            self.emit(PlaybackEvent::TrackChanged {
                path,
                title: item.as_ref().map(|item| item.display_title()),
                index,
            });
        }

        let state = self.state.public();
        let state_changed = state != self.last_state;
        if state_changed {
            self.last_state = state;
            if state.is_stopped() {
                self.resources.release_wake_token().await;
            }
        }

        if state_changed || track_changed {
            self.refresh_notification().await;
        }

        if state_changed {
            info!(%state, "Playback state changed");
            self.listeners
                .notify("on_state_changed", |listener| listener.on_state_changed(state));
            self.emit(PlaybackEvent::StateChanged {
                status: state.into(),
                path: self.state.item().map(|item| item.path_string()),
            });
        }
    }

    async fn refresh_notification(&mut self) {
        let item = self
            .state
            .item()
            .cloned()
            .or_else(|| self.cursor.current_item());
        let playlist_name = self.cursor.playlist().map(|p| p.name().to_string());
        self.presenter
            .update(
                self.backgrounded,
                self.state.public(),
                item.as_deref(),
                playlist_name.as_deref(),
            )
            .await;
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is not an error
        let _ = self.events.emit(CoreEvent::Playback(event));
    }

    /// Report a failure that stopped playback.
    fn emit_error(&self, item: Option<&PlayableItem>, failure: &PlaybackError) {
        self.emit(PlaybackEvent::Error {
            path: item.map(|item| item.path_string()),
            message: failure.to_string(),
            recoverable: false,
        });
    }

    async fn teardown(&mut self) {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(id) = self.lifecycle_listener.take() {
            self.lifecycle.remove_listener(id);
        }
        self.reset().await;
        self.publish().await;
        info!("Playback engine stopped");
    }
}
