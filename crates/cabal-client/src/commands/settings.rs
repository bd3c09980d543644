//! Session metadata and UI panels.

use tracing::{info, warn};

use cabal_shared::Address;
use cabal_store::CabalSettings;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{CabalUpdate, Screen, StateEvent};

impl Dispatcher {
    /// Merge username and settings from `update` into the session, persist
    /// and forward the update to the UI.
    pub async fn update_session(&mut self, update: CabalUpdate) -> Result<()> {
        let session = self.sessions.require_mut(&update.addr)?;
        if let Some(username) = &update.username {
            session.username = username.clone();
        }
        if let Some(settings) = &update.settings {
            session.settings = settings.clone();
        }

        self.persist().await;
        self.events.emit(StateEvent::UpdateCabal(update));
        Ok(())
    }

    pub async fn save_session_settings(
        &mut self,
        addr: &Address,
        settings: CabalSettings,
    ) -> Result<()> {
        self.update_session(CabalUpdate::new(addr.clone()).settings(settings))
            .await
    }

    pub async fn change_username(&mut self, addr: &Address, username: &str) -> Result<()> {
        let store = {
            let session = self.sessions.require_mut(addr)?;
            session.username = username.to_string();
            session.store.clone()
        };

        if let Err(e) = store.publish_nick(username).await {
            warn!(addr = %addr.short(), error = %e, "Failed to publish nickname");
        }
        info!(addr = %addr.short(), username, "Username changed");

        self.events.emit(StateEvent::UpdateCabal(
            CabalUpdate::new(addr.clone()).username(username),
        ));
        self.add_local_system_message(addr, None, format!("Nick set to: {username}"))
            .await
    }

    pub fn show_session_settings(&self, addr: &Address) -> Result<()> {
        self.sessions.require(addr)?;
        self.events
            .emit(StateEvent::ShowCabalSettings { addr: addr.clone() });
        Ok(())
    }

    pub fn hide_session_settings(&self) {
        self.events.emit(StateEvent::HideCabalSettings);
    }

    pub fn show_emoji_picker(&self) {
        self.events.emit(StateEvent::ShowEmojiPicker);
    }

    pub fn hide_emoji_picker(&self) {
        self.events.emit(StateEvent::HideEmojiPicker);
    }

    pub fn change_screen(&self, screen: Screen, addr: Option<Address>) {
        self.events.emit(StateEvent::ChangeScreen { screen, addr });
    }
}
