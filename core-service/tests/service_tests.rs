//! Service wiring tests
//!
//! Verifies that `CoreService` connects the configured bridges to a running
//! engine and lifecycle signal, resolves attachments, and shuts down cleanly.

use async_trait::async_trait;
use bridge_desktop::{
    DesktopAudioFocus, DesktopLifecycleObserver, DesktopPowerManager, FsAttachmentStore,
    TracingNotificationHost,
};
use bridge_traits::{
    error::Result as BridgeResult, AdapterEventStream, BridgeError, LifecycleState,
    NotificationId, PlaybackAdapter, PlaybackRequest, PlaybackSessionId, PreparedSession,
};
use core_playback::{PlaybackError, PlaybackState};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, LifecycleEvent};
use core_service::{CoreError, CoreService};
use mockall::mock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

mock! {
    Adapter {}

    #[async_trait]
    impl PlaybackAdapter for Adapter {
        async fn prepare(&self, request: PlaybackRequest) -> BridgeResult<PreparedSession>;
        async fn play(&self, session: PlaybackSessionId) -> BridgeResult<()>;
        async fn pause(&self, session: PlaybackSessionId) -> BridgeResult<()>;
        async fn seek(&self, session: PlaybackSessionId, position: Duration) -> BridgeResult<()>;
        async fn get_position(&self, session: PlaybackSessionId) -> BridgeResult<Duration>;
        async fn unload(&self, session: PlaybackSessionId) -> BridgeResult<()>;
        async fn subscribe_events(&self) -> BridgeResult<Box<dyn AdapterEventStream>>;
    }
}

/// An adapter that accepts everything and never reports events.
fn permissive_adapter() -> MockAdapter {
    let mut adapter = MockAdapter::new();
    adapter
        .expect_prepare()
        .returning(|_| Ok(PreparedSession::new(PlaybackSessionId::new(), None)));
    adapter.expect_play().returning(|_| Ok(()));
    adapter.expect_pause().returning(|_| Ok(()));
    adapter.expect_seek().returning(|_, _| Ok(()));
    adapter
        .expect_get_position()
        .returning(|_| Ok(Duration::ZERO));
    adapter.expect_unload().returning(|_| Ok(()));
    adapter
        .expect_subscribe_events()
        .returning(|| Err(BridgeError::NotAvailable("events".into())));
    adapter
}

struct Bridges {
    observer: Arc<DesktopLifecycleObserver>,
    host: Arc<TracingNotificationHost>,
}

fn config(adapter: MockAdapter, attachments: Option<PathBuf>) -> (CoreConfig, Bridges) {
    let bridges = Bridges {
        observer: Arc::new(DesktopLifecycleObserver::new()),
        host: Arc::new(TracingNotificationHost::new()),
    };
    let mut builder = CoreConfig::builder()
        .playback_adapter(Arc::new(adapter))
        .audio_focus(Arc::new(DesktopAudioFocus::new()))
        .power_manager(Arc::new(DesktopPowerManager::new()))
        .notification_host(bridges.host.clone())
        .lifecycle_observer(bridges.observer.clone())
        .background_debounce(Duration::from_millis(20));
    if let Some(dir) = attachments {
        builder = builder.attachment_store(Arc::new(FsAttachmentStore::new(dir)));
    }
    (builder.build().expect("valid config"), bridges)
}

async fn wait_for_state(service: &CoreService, expected: PlaybackState) {
    timeout(Duration::from_secs(2), async {
        while service.playback().state().await.unwrap() != expected {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("engine never reached {}", expected));
}

async fn temp_attachments() -> PathBuf {
    let root = std::env::temp_dir().join(format!("core-service-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&root).await.unwrap();
    root
}

#[test]
fn test_new_requires_runtime() {
    let (config, _bridges) = config(permissive_adapter(), None);
    let err = CoreService::new(config).err().expect("no runtime");
    assert!(matches!(err, CoreError::InitializationFailed(_)));
}

#[tokio::test]
async fn test_resolve_without_store_is_capability_missing() {
    let (config, _bridges) = config(permissive_adapter(), None);
    let service = CoreService::new(config).unwrap();

    let err = service.resolve_item("t-1").await.unwrap_err();
    assert!(matches!(err, CoreError::CapabilityMissing { .. }));

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_play_attachment_resolves_and_plays() {
    let root = temp_attachments().await;
    tokio::fs::write(root.join("t-7.ogg"), b"not really audio")
        .await
        .unwrap();

    let (config, _bridges) = config(permissive_adapter(), Some(root.clone()));
    let service = CoreService::new(config).unwrap();

    let item = service.play_attachment("t-7").await.unwrap();
    assert_eq!(item.path(), root.join("t-7.ogg"));
    assert_eq!(item.transfer_id(), Some("t-7"));
    wait_for_state(&service, PlaybackState::Playing).await;

    let missing = service.resolve_item("t-404").await.unwrap_err();
    assert!(matches!(
        missing,
        CoreError::Playback(PlaybackError::Bridge(BridgeError::AttachmentNotFound(_)))
    ));

    service.shutdown().await.unwrap();
    tokio::fs::remove_dir_all(&root).await.unwrap();
}

#[tokio::test]
async fn test_observer_transitions_reach_notification() {
    let root = temp_attachments().await;
    tokio::fs::write(root.join("t-1.mp3"), b"not really audio")
        .await
        .unwrap();

    let (config, bridges) = config(permissive_adapter(), Some(root.clone()));
    let notification_id = NotificationId(config.settings.notification_id);
    let service = CoreService::new(config).unwrap();
    let mut events = service
        .subscribe()
        .filter(|event| matches!(event, CoreEvent::Lifecycle(_)));

    service.play_attachment("t-1").await.unwrap();
    wait_for_state(&service, PlaybackState::Playing).await;

    bridges.observer.set_state(LifecycleState::Background);
    let event = timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("no lifecycle event")
        .unwrap();
    assert_eq!(event, CoreEvent::Lifecycle(LifecycleEvent::BecameBackground));

    timeout(Duration::from_secs(2), async {
        while bridges.host.visible(notification_id).await.is_none() {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("notification never shown");
    let content = bridges.host.visible(notification_id).await.unwrap();
    assert_eq!(content.title, "t-1.mp3");

    bridges.observer.set_state(LifecycleState::Foreground);
    timeout(Duration::from_secs(2), async {
        while bridges.host.visible(notification_id).await.is_some() {
            sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("notification never removed");

    service.shutdown().await.unwrap();
    tokio::fs::remove_dir_all(&root).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_engine() {
    let (config, _bridges) = config(permissive_adapter(), None);
    let service = CoreService::new(config).unwrap();
    assert!(service.playback().is_running());

    service.shutdown().await.unwrap();
    // A second shutdown is harmless
    service.shutdown().await.unwrap();

    assert!(matches!(
        service.playback().play(),
        Err(PlaybackError::EngineShutdown)
    ));
}
