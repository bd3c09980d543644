//! User directory and peer presence.

use tracing::{debug, warn};

use cabal_shared::Address;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{CabalUpdate, StateEvent};

impl Dispatcher {
    /// Find this client's own key and make sure the directory has exactly
    /// one local entry for it, then republish the nickname.
    ///
    /// Fails when the store cannot report the local key; nothing is
    /// emitted in that case.
    pub(crate) async fn resolve_local_identity(&mut self, addr: &Address) -> Result<()> {
        let store = self.ready_store(addr)?;
        let key = store.local_key().await.map_err(|e| {
            warn!(addr = %addr.short(), error = %e, "Own key unavailable");
            e
        })?;

        let (username, users) = {
            let session = self.sessions.require_mut(addr)?;
            let username = session.view.resolve_local(&key, &session.username);
            session.username = username.clone();
            (username, session.view.users().clone())
        };

        if let Err(e) = store.publish_nick(&username).await {
            warn!(addr = %addr.short(), error = %e, "Failed to publish nickname");
        }

        debug!(addr = %addr.short(), username = %username, "Local identity resolved");
        self.events.emit(StateEvent::UpdateCabal(
            CabalUpdate::new(addr.clone()).users(users).username(username),
        ));
        Ok(())
    }

    /// A directory entry changed in the log.
    pub(crate) async fn user_updated(&mut self, addr: &Address, key: &str) -> Result<()> {
        let store = self.ready_store(addr)?;
        let info = match store.get_user(key).await {
            Ok(info) => info,
            Err(e) => {
                debug!(addr = %addr.short(), error = %e, "Updated user not found");
                return Ok(());
            }
        };

        let needs_local = {
            let session = self.sessions.require_mut(addr)?;
            session.view.merge_user(info);
            session.view.local_key().is_none()
        };
        if needs_local {
            if let Err(e) = self.resolve_local_identity(addr).await {
                debug!(addr = %addr.short(), error = %e, "Local entry still unresolved");
            }
        }

        self.emit_users(addr)
    }

    pub(crate) fn peer_added(&mut self, addr: &Address, key: &str) -> Result<()> {
        self.sessions.require_mut(addr)?.view.peer_connected(key);
        debug!(addr = %addr.short(), peer = %key, "Peer online");
        self.emit_users(addr)
    }

    pub(crate) fn peer_dropped(&mut self, addr: &Address, key: &str) -> Result<()> {
        if self.sessions.require_mut(addr)?.view.peer_disconnected(key) {
            debug!(addr = %addr.short(), peer = %key, "Peer offline");
            self.emit_users(addr)?;
        }
        Ok(())
    }

    fn emit_users(&self, addr: &Address) -> Result<()> {
        let users = self.sessions.require(addr)?.view.users().clone();
        self.events.emit(StateEvent::UpdateCabal(
            CabalUpdate::new(addr.clone()).users(users),
        ));
        Ok(())
    }
}
