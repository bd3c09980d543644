#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use cabal_client::backend::LogEntry;
use cabal_client::memory::MemoryStore;
use cabal_client::{
    ClientConfig, DesktopNotification, Dispatcher, Host, LogBackend, MemoryBackend, MessageType,
    SessionEvent, StateEvent,
};
use cabal_shared::Address;

/// Host that records everything asked of it.
#[derive(Default)]
pub struct RecordingHost {
    pub focused: AtomicBool,
    pub refuse: AtomicBool,
    pub badges: Mutex<Vec<u64>>,
    pub notifications: Mutex<Vec<DesktopNotification>>,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn last_badge(&self) -> Option<u64> {
        self.badges.lock().unwrap().last().copied()
    }

    pub fn notifications(&self) -> Vec<DesktopNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for RecordingHost {
    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    fn update_badge(&self, badge_count: u64, _show_count: bool) {
        self.badges.lock().unwrap().push(badge_count);
    }

    fn show_notification(&self, notification: DesktopNotification) {
        self.notifications.lock().unwrap().push(notification);
    }

    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        !self.refuse.load(Ordering::SeqCst)
    }
}

/// A dispatcher over the in-memory backend, driven by hand.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub backend: Arc<MemoryBackend>,
    pub host: Arc<RecordingHost>,
    pub ui_rx: mpsc::UnboundedReceiver<StateEvent>,
    pub log_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Harness {
    pub fn new(data_dir: &Path) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let host = Arc::new(RecordingHost::default());
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (dispatcher, log_rx) = Dispatcher::new(
            ClientConfig::with_data_dir(data_dir),
            backend.clone() as Arc<dyn LogBackend>,
            host.clone() as Arc<dyn Host>,
            ui_tx,
        );
        Self {
            dispatcher,
            backend,
            host,
            ui_rx,
            log_rx,
        }
    }

    /// Apply every queued store event.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.log_rx.try_recv() {
            self.dispatcher.handle_log_event(event).await;
        }
    }

    /// UI events emitted since the last call.
    pub fn ui_events(&mut self) -> Vec<StateEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.ui_rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn store(&self, addr: &Address) -> Arc<MemoryStore> {
        self.backend.store(addr).expect("store opened")
    }

    pub async fn add(&mut self, username: &str) -> Address {
        self.dispatcher
            .add_session(None, None, Some(username.to_string()), None)
            .await
            .expect("add session")
    }
}

pub fn entry(key: &str, channel: &str, timestamp: i64, text: &str) -> LogEntry {
    LogEntry {
        key: key.into(),
        channel: channel.into(),
        kind: MessageType::Text,
        timestamp,
        text: text.into(),
    }
}
