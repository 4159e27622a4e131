#![allow(dead_code)]

use musicservice::transport::{CallbackSink, MediaBrowser, SessionController};
use musicservice::{
    ConnectionBuilder, ConnectionEvent, ConnectionManager, RepeatMode, Result, ServiceError,
    SessionActivity, ShuffleMode,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

pub const ACTIVITY_TARGET: &str = "player://now-playing";

/// Session controller that records every command it receives
#[derive(Default)]
pub struct FakeController {
    commands: Mutex<Vec<String>>,
    shuffle: Mutex<ShuffleMode>,
    repeat: Mutex<RepeatMode>,
    reject_play: AtomicBool,
}

impl FakeController {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub fn reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    fn record(&self, command: impl Into<String>) -> Result<()> {
        self.commands.lock().unwrap().push(command.into());
        Ok(())
    }
}

impl SessionController for FakeController {
    fn play(&self) -> Result<()> {
        self.record("play")?;
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(ServiceError::remote("nothing queued"));
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record("pause")
    }

    fn stop(&self) -> Result<()> {
        self.record("stop")
    }

    fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.record(format!("seek_to:{}", position_ms))
    }

    fn skip_to_next(&self) -> Result<()> {
        self.record("skip_to_next")
    }

    fn skip_to_previous(&self) -> Result<()> {
        self.record("skip_to_previous")
    }

    fn fast_forward(&self) -> Result<()> {
        self.record("fast_forward")
    }

    fn rewind(&self) -> Result<()> {
        self.record("rewind")
    }

    fn play_from_media_id(&self, media_id: &str) -> Result<()> {
        self.record(format!("play_from_media_id:{}", media_id))
    }

    fn set_shuffle_mode(&self, mode: ShuffleMode) -> Result<()> {
        *self.shuffle.lock().unwrap() = mode;
        self.record("set_shuffle_mode")
    }

    fn set_repeat_mode(&self, mode: RepeatMode) -> Result<()> {
        *self.repeat.lock().unwrap() = mode;
        self.record("set_repeat_mode")
    }

    fn shuffle_mode(&self) -> ShuffleMode {
        *self.shuffle.lock().unwrap()
    }

    fn repeat_mode(&self) -> RepeatMode {
        *self.repeat.lock().unwrap()
    }

    fn session_activity(&self) -> Option<SessionActivity> {
        Some(SessionActivity::new(ACTIVITY_TARGET))
    }
}

/// Media browser that hands the callback sink to the test instead of binding
#[derive(Default)]
pub struct FakeBrowser {
    pub controller: Arc<FakeController>,
    sink: Mutex<Option<CallbackSink>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    subscribed: Mutex<Vec<String>>,
    unsubscribed: Mutex<Vec<String>>,
    fail_bind: AtomicBool,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink of the most recent bind attempt
    pub fn sink(&self) -> CallbackSink {
        self.sink
            .lock()
            .unwrap()
            .clone()
            .expect("connect() has not been called")
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.unsubscribed.lock().unwrap().clone()
    }

    pub fn fail_bind(&self, fail: bool) {
        self.fail_bind.store(fail, Ordering::SeqCst);
    }
}

impl MediaBrowser for FakeBrowser {
    fn connect(&self, callbacks: CallbackSink) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_bind.load(Ordering::SeqCst) {
            return Err(ServiceError::BindFailure("service not installed".to_string()));
        }
        *self.sink.lock().unwrap() = Some(callbacks);
        Ok(())
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn session(&self) -> Result<Arc<dyn SessionController>> {
        Ok(self.controller.clone())
    }

    fn subscribe(&self, parent_id: &str) -> Result<()> {
        self.subscribed.lock().unwrap().push(parent_id.to_string());
        Ok(())
    }

    fn unsubscribe(&self, parent_id: &str) -> Result<()> {
        self.unsubscribed.lock().unwrap().push(parent_id.to_string());
        Ok(())
    }
}

/// Manager that waits for an explicit `connect()`
pub fn idle_manager(browser: &Arc<FakeBrowser>) -> ConnectionManager {
    ConnectionBuilder::new(browser.clone())
        .with_auto_connect(false)
        .start()
        .unwrap()
}

/// Manager whose bind has completed
pub async fn connected_manager(browser: &Arc<FakeBrowser>) -> ConnectionManager {
    let manager = idle_manager(browser);
    manager.connect().await.unwrap();
    browser.sink().on_connected();
    manager.wait_connected().await.unwrap();
    manager
}

/// Round trip through the manager task; every earlier callback has been applied afterwards
pub async fn settle(manager: &ConnectionManager) {
    let _ = manager.shuffle_mode().await;
}

pub async fn next_event(rx: &mut broadcast::Receiver<ConnectionEvent>) -> ConnectionEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a connection event")
        .expect("event stream closed")
}
