//! The single owner of all client state.
//!
//! A [`Dispatcher`] holds the session registry, the handles to the log
//! library and the host, and the UI event channel. Both UI [`Action`]s and
//! live [`SessionEvent`]s from the stores are processed one at a time by
//! [`Dispatcher::run`], so handlers take `&mut self` and never lock.
//!
//! The handlers themselves live in [`crate::commands`], grouped by domain.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use cabal_shared::Address;
use cabal_store::StateStore;

use crate::actions::Action;
use crate::backend::{CabalStore, EventSender, LogBackend, LogEvent, SessionEvent};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{EventEmitter, StateEvent};
use crate::host::Host;
use crate::session::SessionManager;

pub struct Dispatcher {
    pub(crate) config: ClientConfig,
    pub(crate) backend: Arc<dyn LogBackend>,
    pub(crate) host: Arc<dyn Host>,
    pub(crate) state: StateStore,
    pub(crate) sessions: SessionManager,
    pub(crate) events: EventEmitter,
    /// Cloned into every store opened, so their events come back here.
    pub(crate) log_tx: EventSender,
}

/// Channels to talk to a dispatcher running on its own task.
pub struct ClientHandle {
    pub actions: mpsc::UnboundedSender<Action>,
    pub events: mpsc::UnboundedReceiver<StateEvent>,
    pub task: JoinHandle<()>,
}

/// Spawn a dispatcher on the current tokio runtime.
///
/// The loop stops once every clone of `ClientHandle::actions` is dropped.
pub fn spawn(config: ClientConfig, backend: Arc<dyn LogBackend>, host: Arc<dyn Host>) -> ClientHandle {
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (dispatcher, log_rx) = Dispatcher::new(config, backend, host, ui_tx);
    let task = tokio::spawn(dispatcher.run(action_rx, log_rx));
    ClientHandle {
        actions: action_tx,
        events: ui_rx,
        task,
    }
}

impl Dispatcher {
    /// Build a dispatcher emitting into `ui_tx`.
    ///
    /// Returns the receiver for store events; feed it to [`Dispatcher::run`]
    /// or drain it into [`Dispatcher::handle_log_event`] by hand.
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn LogBackend>,
        host: Arc<dyn Host>,
        ui_tx: mpsc::UnboundedSender<StateEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        let state = StateStore::new(config.data_dir.clone());
        let dispatcher = Self {
            config,
            backend,
            host,
            state,
            sessions: SessionManager::new(),
            events: EventEmitter::new(ui_tx),
            log_tx,
        };
        (dispatcher, log_rx)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Process actions and store events until the action channel closes.
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<Action>,
        mut log_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        info!(data_dir = %self.config.data_dir.display(), "Dispatcher started");

        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => {
                        if let Err(e) = self.dispatch(action).await {
                            warn!(error = %e, "Action failed");
                        }
                    }
                    None => break,
                },
                Some(event) = log_rx.recv() => self.handle_log_event(event).await,
            }
        }

        info!(sessions = self.sessions.len(), "Dispatcher stopped");
    }

    /// Route one UI action to its handler.
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        debug!(?action, "Dispatching action");

        match action {
            Action::LoadFromDisk => self.load_from_disk().await.map(|_| ()),
            Action::AddCabal {
                addr,
                input,
                username,
                settings,
            } => self
                .add_session(addr, input, username, settings)
                .await
                .map(|_| ()),
            Action::ViewCabal { addr, channel } => {
                self.view_session(&addr, channel.as_deref()).await
            }
            Action::RemoveCabal { addr } => self.remove_session(&addr).await.map(|_| ()),
            Action::ConfirmRemoveCabal { addr } => self.confirm_remove_session(&addr).await,
            Action::ShowCabalSettings { addr } => self.show_session_settings(&addr),
            Action::HideCabalSettings => {
                self.hide_session_settings();
                Ok(())
            }
            Action::SaveCabalSettings { addr, settings } => {
                self.save_session_settings(&addr, settings).await
            }
            Action::ChangeUsername { addr, username } => {
                self.change_username(&addr, &username).await
            }
            Action::JoinChannel { addr, channel } => self.join_channel(&addr, &channel).await,
            Action::LeaveChannel { addr, channel } => self.leave_channel(&addr, &channel),
            Action::ViewChannel { addr, channel } => self.view_channel(&addr, &channel).await,
            Action::ViewNextChannel { addr } => self.view_next_channel(&addr).await,
            Action::ViewPreviousChannel { addr } => self.view_previous_channel(&addr).await,
            Action::GetMessages {
                addr,
                channel,
                count,
            } => self.fetch_recent_messages(&addr, &channel, count).await,
            Action::AddMessage { addr, message } => self.add_message(&addr, message).await,
            Action::AddLocalSystemMessage {
                addr,
                channel,
                content,
            } => {
                self.add_local_system_message(&addr, channel.as_deref(), content)
                    .await
            }
            Action::SetChannelTopic {
                addr,
                channel,
                topic,
            } => self.set_channel_topic(&addr, &channel, &topic).await,
            Action::Command { addr, input } => self.submit_input(&addr, &input).await,
            Action::UpdateAppIconBadge { badge_count } => {
                self.update_app_icon_badge(badge_count);
                Ok(())
            }
            Action::ShowEmojiPicker => {
                self.show_emoji_picker();
                Ok(())
            }
            Action::HideEmojiPicker => {
                self.hide_emoji_picker();
                Ok(())
            }
            Action::ChangeScreen { screen, addr } => {
                self.change_screen(screen, addr);
                Ok(())
            }
        }
    }

    /// Apply a live event from one of the stores.
    ///
    /// Events for sessions that are gone or not ready yet are dropped.
    pub async fn handle_log_event(&mut self, event: SessionEvent) {
        let SessionEvent { addr, event } = event;

        match self.sessions.get(&addr) {
            Some(session) if session.ready => {}
            Some(_) => {
                debug!(addr = %addr.short(), "Dropping event for a cabal that is not ready");
                return;
            }
            None => {
                debug!(addr = %addr.short(), "Dropping event for an unknown cabal");
                return;
            }
        }

        let result = match event {
            LogEvent::ChannelAdded(channel) => self.add_channel_listener(&addr, &channel).map(|_| ()),
            LogEvent::Message(entry) => self.handle_incoming_message(&addr, entry),
            LogEvent::UserUpdated(key) => self.user_updated(&addr, &key).await,
            LogEvent::PeerAdded(key) => self.peer_added(&addr, &key),
            LogEvent::PeerDropped(key) => self.peer_dropped(&addr, &key),
        };

        if let Err(e) = result {
            warn!(addr = %addr.short(), error = %e, "Failed to apply log event");
        }
    }

    /// Store handle of a session that finished loading.
    pub(crate) fn ready_store(&self, addr: &Address) -> Result<Arc<dyn CabalStore>> {
        let session = self.sessions.require(addr)?;
        if !session.ready {
            return Err(ClientError::NotReady(addr.clone()));
        }
        Ok(session.store.clone())
    }

    /// Rewrite the state file from the registry. Failures are logged only.
    pub(crate) async fn persist(&self) {
        let cabals = self.sessions.persisted();
        if let Err(e) = self.state.write(&cabals).await {
            error!(error = %e, path = %self.state.state_path().display(), "Failed to save cabals");
        }
    }
}
