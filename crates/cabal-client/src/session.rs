//! Open cabals and which one is current.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use cabal_shared::Address;
use cabal_store::{CabalSettings, PersistedCabal};

use crate::backend::{CabalStore, Swarm};
use crate::error::{ClientError, Result};
use crate::events::CabalSnapshot;
use crate::view::SessionView;

/// One joined cabal.
pub struct Session {
    pub addr: Address,
    pub username: String,
    pub settings: CabalSettings,
    pub store: Arc<dyn CabalStore>,
    /// Set once the store is ready and has joined the swarm.
    pub swarm: Option<Arc<dyn Swarm>>,
    /// `false` until the store finished loading. A store that failed to
    /// load stays registered but never becomes ready.
    pub ready: bool,
    pub view: SessionView,
}

impl Session {
    pub fn new(
        addr: Address,
        username: String,
        settings: CabalSettings,
        store: Arc<dyn CabalStore>,
        default_channel: &str,
    ) -> Self {
        Self {
            addr,
            username,
            settings,
            store,
            swarm: None,
            ready: false,
            view: SessionView::new(default_channel),
        }
    }

    pub fn persisted(&self) -> PersistedCabal {
        PersistedCabal {
            username: self.username.clone(),
            addr: self.addr.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn snapshot(&self) -> CabalSnapshot {
        let view = &self.view;
        CabalSnapshot {
            addr: self.addr.clone(),
            all_channels_unread_count: view.all_unread(),
            channel: view.channel.clone(),
            channel_messages_unread: view.unread_counts().clone(),
            channels: view.channels().to_vec(),
            messages: view.messages(&view.channel).to_vec(),
            settings: self.settings.clone(),
            username: self.username.clone(),
            users: view.users().clone(),
        }
    }

    /// Stop all callbacks into this session: detach every peer
    /// connection's listeners and unwatch every channel.
    ///
    /// Returns the number of connections detached.
    pub fn teardown(&mut self) -> usize {
        let mut detached = 0;
        if let Some(swarm) = self.swarm.take() {
            for conn in swarm.connections() {
                conn.remove_all_listeners();
                detached += 1;
            }
        }
        for channel in self.view.take_listeners() {
            self.store.unwatch_channel(&channel);
        }
        self.ready = false;
        debug!(addr = %self.addr.short(), connections = detached, "Session torn down");
        detached
    }
}

/// Registry of open sessions, in the order they were added.
#[derive(Default)]
pub struct SessionManager {
    sessions: IndexMap<Address, Session>,
    current: Option<Address>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.addr.clone(), session);
    }

    /// Remove a session, keeping the order of the others.
    pub fn remove(&mut self, addr: &Address) -> Option<Session> {
        let removed = self.sessions.shift_remove(addr);
        if self.current.as_ref() == Some(addr) {
            self.current = None;
        }
        removed
    }

    pub fn get(&self, addr: &Address) -> Option<&Session> {
        self.sessions.get(addr)
    }

    pub fn require(&self, addr: &Address) -> Result<&Session> {
        self.sessions
            .get(addr)
            .ok_or_else(|| ClientError::UnknownCabal(addr.clone()))
    }

    pub fn require_mut(&mut self, addr: &Address) -> Result<&mut Session> {
        self.sessions
            .get_mut(addr)
            .ok_or_else(|| ClientError::UnknownCabal(addr.clone()))
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.sessions.contains_key(addr)
    }

    pub fn current(&self) -> Option<&Address> {
        self.current.as_ref()
    }

    /// Make `addr` current. Unknown addresses are ignored.
    pub fn set_current(&mut self, addr: &Address) -> bool {
        if self.sessions.contains_key(addr) {
            self.current = Some(addr.clone());
            true
        } else {
            false
        }
    }

    pub fn first(&self) -> Option<&Session> {
        self.sessions.values().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn persisted(&self) -> Vec<PersistedCabal> {
        self.sessions.values().map(Session::persisted).collect()
    }

    /// Unread messages across every session, for the window badge.
    pub fn total_unread(&self) -> u64 {
        self.sessions.values().map(|s| s.view.all_unread()).sum()
    }
}
