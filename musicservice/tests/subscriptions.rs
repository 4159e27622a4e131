mod common;

use common::{connected_manager, idle_manager, settle, FakeBrowser};
use musicservice::{ConnectionBuilder, MediaItem, ServiceError, SubscriptionCallback};
use std::sync::{Arc, Mutex};

fn recording_callback(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> SubscriptionCallback {
    let loaded = log.clone();
    let failed = log.clone();
    SubscriptionCallback::new()
        .on_children_loaded(move |parent_id, children| {
            loaded
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", tag, parent_id, children.len()));
        })
        .on_error(move |parent_id| {
            failed
                .lock()
                .unwrap()
                .push(format!("{}:error:{}", tag, parent_id));
        })
}

#[tokio::test]
async fn test_non_root_subscribe_plays_once_per_call() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;

    let first = manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await
        .unwrap();
    assert_eq!(browser.controller.count("play"), 1);

    let second = manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await
        .unwrap();
    assert_eq!(browser.controller.count("play"), 2);
    assert_ne!(first, second);

    // The browser only hears about the node once
    assert_eq!(browser.subscribed(), vec!["album:1"]);
}

#[tokio::test]
async fn test_root_subscribe_never_plays() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;

    manager
        .subscribe(manager.root_id().to_string(), SubscriptionCallback::new())
        .await
        .unwrap();

    assert_eq!(browser.controller.count("play"), 0);
    assert_eq!(browser.subscribed(), vec!["root_id"]);
}

#[tokio::test]
async fn test_custom_root_id() {
    let browser = FakeBrowser::new();
    let manager = ConnectionBuilder::new(browser.clone())
        .with_auto_connect(false)
        .with_root_id("__ROOT__")
        .start()
        .unwrap();
    manager.connect().await.unwrap();
    browser.sink().on_connected();
    manager.wait_connected().await.unwrap();

    manager
        .subscribe("__ROOT__", SubscriptionCallback::new())
        .await
        .unwrap();
    assert_eq!(browser.controller.count("play"), 0);

    manager
        .subscribe("root_id", SubscriptionCallback::new())
        .await
        .unwrap();
    assert_eq!(browser.controller.count("play"), 1);
}

#[tokio::test]
async fn test_subscribe_requires_connection() {
    let browser = FakeBrowser::new();
    let manager = idle_manager(&browser);

    let result = manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await;
    assert_eq!(
        result,
        Err(ServiceError::NotConnected {
            command: "subscribe"
        })
    );
    assert!(browser.subscribed().is_empty());
}

#[tokio::test]
async fn test_failed_auto_play_still_subscribes() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;
    browser.controller.reject_play(true);

    let result = manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await;
    assert!(result.is_ok());
    assert_eq!(browser.controller.count("play"), 1);
}

#[tokio::test]
async fn test_children_are_routed_to_matching_subscribers() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;
    let log = Arc::new(Mutex::new(Vec::new()));

    manager
        .subscribe("album:1", recording_callback(&log, "a"))
        .await
        .unwrap();
    manager
        .subscribe("album:1", recording_callback(&log, "b"))
        .await
        .unwrap();
    manager
        .subscribe("album:2", recording_callback(&log, "c"))
        .await
        .unwrap();

    let sink = browser.sink();
    sink.on_children_loaded(
        "album:1",
        vec![
            MediaItem::playable("track:1", "One"),
            MediaItem::playable("track:2", "Two"),
        ],
    );
    sink.on_children_error("album:2");
    settle(&manager).await;

    assert_eq!(
        *log.lock().unwrap(),
        vec!["a:album:1:2", "b:album:1:2", "c:error:album:2"]
    );
}

#[tokio::test]
async fn test_unsubscribe_removes_every_subscription_on_node() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;
    let log = Arc::new(Mutex::new(Vec::new()));

    manager
        .subscribe("album:1", recording_callback(&log, "a"))
        .await
        .unwrap();
    manager
        .subscribe("album:1", recording_callback(&log, "b"))
        .await
        .unwrap();

    manager.unsubscribe("album:1").await.unwrap();
    assert_eq!(browser.unsubscribed(), vec!["album:1"]);

    browser
        .sink()
        .on_children_loaded("album:1", vec![MediaItem::playable("track:1", "One")]);
    settle(&manager).await;
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsubscribe_unknown_node_is_noop() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;

    manager.unsubscribe("album:404").await.unwrap();
    assert!(browser.unsubscribed().is_empty());

    // Also fine without a connection
    let idle = idle_manager(&browser);
    idle.unsubscribe("album:404").await.unwrap();
}

#[tokio::test]
async fn test_subscriptions_restored_after_suspension() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;

    manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await
        .unwrap();
    assert_eq!(browser.controller.count("play"), 1);

    browser.sink().on_connection_suspended();
    settle(&manager).await;

    manager.connect().await.unwrap();
    browser.sink().on_connected();
    manager.wait_connected().await.unwrap();

    assert_eq!(browser.subscribed(), vec!["album:1", "album:1"]);
    // Restoring is not a new selection
    assert_eq!(browser.controller.count("play"), 1);
}

#[tokio::test]
async fn test_disconnect_drops_subscriptions() {
    let browser = FakeBrowser::new();
    let manager = connected_manager(&browser).await;

    manager
        .subscribe("album:1", SubscriptionCallback::new())
        .await
        .unwrap();
    manager.disconnect().await.unwrap();

    manager.connect().await.unwrap();
    browser.sink().on_connected();
    manager.wait_connected().await.unwrap();

    assert_eq!(browser.subscribed(), vec!["album:1"]);
}
