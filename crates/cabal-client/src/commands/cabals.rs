//! Adding, viewing, restoring and removing cabals.

use tracing::{debug, error, info, warn};

use cabal_shared::constants::APP_NAME;
use cabal_shared::identity::generate_address;
use cabal_shared::invite::decode_invite;
use cabal_shared::Address;
use cabal_store::{CabalSettings, PersistedCabal};

use crate::backend::OpenOptions;
use crate::dispatcher::Dispatcher;
use crate::error::{ClientError, Result};
use crate::events::{Screen, StateEvent};
use crate::session::Session;

impl Dispatcher {
    /// Add a cabal, join one by address or invite, or create a new one.
    ///
    /// An address that is already open is viewed instead, and renamed when
    /// `username` is given. Returns the address of the session.
    pub async fn add_session(
        &mut self,
        addr: Option<Address>,
        input: Option<String>,
        username: Option<String>,
        settings: Option<CabalSettings>,
    ) -> Result<Address> {
        let addr = addr.or_else(|| {
            let raw = input.as_deref()?;
            match decode_invite(raw) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    debug!(error = %e, "Input is not an invite, creating a new cabal");
                    None
                }
            }
        });

        if let Some(existing) = addr.as_ref().filter(|a| self.sessions.contains(a)) {
            let existing = existing.clone();
            info!(addr = %existing.short(), "Cabal already open, viewing it");
            self.view_session(&existing, None).await?;
            if let Some(username) = username {
                self.change_username(&existing, &username).await?;
            }
            return Ok(existing);
        }

        let addr = addr.unwrap_or_else(generate_address);
        self.register_session(addr.clone(), username, settings.unwrap_or_default())
            .await?;
        self.persist().await;
        self.start_session(&addr).await?;
        Ok(addr)
    }

    /// Open the store for `addr` and make it the current session.
    async fn register_session(
        &mut self,
        addr: Address,
        username: Option<String>,
        settings: CabalSettings,
    ) -> Result<()> {
        let username = username.unwrap_or_else(|| self.config.default_username.clone());
        let dir = self.state.cabal_dir(&addr);
        let options = OpenOptions {
            max_feeds: self.config.max_feeds,
            username: username.clone(),
        };

        let store = self
            .backend
            .open(&dir, &addr, options, self.log_tx.clone())
            .await?;

        info!(addr = %addr.short(), username = %username, "Cabal registered");

        self.sessions.insert(Session::new(
            addr.clone(),
            username,
            settings,
            store,
            &self.config.default_channel,
        ));
        self.sessions.set_current(&addr);
        Ok(())
    }

    /// Wait for the store, join the swarm and run the initial sync.
    ///
    /// A store that never becomes ready leaves its session registered but
    /// unusable.
    async fn start_session(&mut self, addr: &Address) -> Result<()> {
        let store = self.sessions.require(addr)?.store.clone();

        if let Err(e) = store.ready().await {
            error!(addr = %addr.short(), error = %e, "Cabal failed to load");
            return Err(e.into());
        }

        let swarm = match store.join_swarm().await {
            Ok(swarm) => Some(swarm),
            Err(e) => {
                warn!(addr = %addr.short(), error = %e, "Failed to join swarm");
                None
            }
        };

        {
            let session = self.sessions.require_mut(addr)?;
            session.swarm = swarm;
            session.ready = true;
        }

        match store.get_channels().await {
            Ok(channels) => {
                for channel in &channels {
                    self.add_channel_listener(addr, channel)?;
                }
                debug!(addr = %addr.short(), count = channels.len(), "Channels loaded");
            }
            Err(e) => warn!(addr = %addr.short(), error = %e, "Failed to list channels"),
        }

        match store.get_users().await {
            Ok(users) => {
                self.sessions.require_mut(addr)?.view.load_users(users);
                self.resolve_local_identity(addr).await?;
                let default_channel = self.config.default_channel.clone();
                self.join_channel(addr, &default_channel).await?;
            }
            Err(e) => warn!(addr = %addr.short(), error = %e, "Failed to load users"),
        }

        info!(addr = %addr.short(), "Cabal ready");
        Ok(())
    }

    /// Make `addr` current, optionally switching its channel first.
    /// Unknown addresses are ignored.
    pub async fn view_session(&mut self, addr: &Address, channel: Option<&str>) -> Result<()> {
        if !self.sessions.set_current(addr) {
            debug!(addr = %addr.short(), "Ignoring view of an unknown cabal");
            return Ok(());
        }

        if let Some(channel) = channel {
            self.view_channel(addr, channel).await?;
        }

        let channel = self.sessions.require(addr)?.view.channel.clone();
        self.events.emit(StateEvent::ViewCabal {
            addr: addr.clone(),
            channel,
        });
        self.persist().await;
        Ok(())
    }

    /// Ask the user, then remove the cabal. Returns whether it was removed.
    pub async fn remove_session(&mut self, addr: &Address) -> Result<bool> {
        self.sessions.require(addr)?;

        let prompt = format!(
            "Are you sure you want to remove this cabal ({}...) from {APP_NAME}?",
            addr.short()
        );
        if !self.host.confirm(&prompt).await {
            debug!(addr = %addr.short(), "Removal cancelled");
            return Ok(false);
        }

        self.confirm_remove_session(addr).await?;
        Ok(true)
    }

    /// Remove a cabal without asking.
    pub async fn confirm_remove_session(&mut self, addr: &Address) -> Result<()> {
        let mut session = self
            .sessions
            .remove(addr)
            .ok_or_else(|| ClientError::UnknownCabal(addr.clone()))?;
        let detached = session.teardown();
        drop(session);

        info!(addr = %addr.short(), connections = detached, "Cabal removed");

        self.persist().await;
        self.events.emit(StateEvent::DeleteCabal { addr: addr.clone() });

        let next = self
            .sessions
            .first()
            .map(|s| (s.addr.clone(), s.view.channel.clone()));
        match next {
            Some((next_addr, channel)) => {
                self.sessions.set_current(&next_addr);
                self.events.emit(StateEvent::ViewCabal {
                    addr: next_addr,
                    channel,
                });
            }
            None => self.events.emit(StateEvent::ChangeScreen {
                screen: Screen::AddCabal,
                addr: None,
            }),
        }
        Ok(())
    }

    /// Restore every cabal from the state file. Returns how many were read.
    ///
    /// All sessions are registered before any of them starts, so the state
    /// file is never rewritten with a partial registry.
    pub async fn load_from_disk(&mut self) -> Result<usize> {
        let cabals = self.state.read().await;
        self.log_orphaned_identities(&cabals).await;

        let count = cabals.len();
        info!(count, path = %self.state.state_path().display(), "Restoring cabals");

        let mut registered = Vec::with_capacity(count);
        for cabal in cabals {
            let PersistedCabal {
                username,
                addr,
                settings,
            } = cabal;
            if self.sessions.contains(&addr) {
                continue;
            }
            match self
                .register_session(addr.clone(), Some(username), settings)
                .await
            {
                Ok(()) => registered.push(addr),
                Err(e) => warn!(addr = %addr.short(), error = %e, "Failed to open cabal"),
            }
        }

        for addr in &registered {
            if let Err(e) = self.start_session(addr).await {
                warn!(addr = %addr.short(), error = %e, "Failed to start cabal");
            }
        }

        let screen = if count > 0 { Screen::Main } else { Screen::AddCabal };
        self.events.emit(StateEvent::ChangeScreen { screen, addr: None });
        Ok(count)
    }

    async fn log_orphaned_identities(&self, cabals: &[PersistedCabal]) {
        match self.state.list_identity_dirs().await {
            Ok(dirs) => {
                let orphaned = dirs
                    .iter()
                    .filter(|dir| !cabals.iter().any(|c| c.addr.as_str() == dir.as_str()))
                    .count();
                if orphaned > 0 {
                    debug!(orphaned, "Identity directories without saved settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to list identity directories"),
        }
    }
}
