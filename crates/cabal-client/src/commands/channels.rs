//! Joining, viewing and cycling through channels, and unread counters.

use tracing::{debug, info};

use cabal_shared::Address;

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{CabalUpdate, StateEvent};

impl Dispatcher {
    /// Join `channel` and switch to it. Empty names are ignored.
    pub async fn join_channel(&mut self, addr: &Address, channel: &str) -> Result<()> {
        if channel.is_empty() {
            return Ok(());
        }
        self.add_channel_listener(addr, channel)?;
        self.view_channel(addr, channel).await
    }

    /// Accepted for completeness; the log library cannot leave a channel.
    pub fn leave_channel(&mut self, addr: &Address, channel: &str) -> Result<()> {
        if channel.is_empty() {
            return Ok(());
        }
        self.sessions.require(addr)?;
        debug!(addr = %addr.short(), channel, "Leaving channels is not supported");
        Ok(())
    }

    /// Show `channel`, reset its unread counter and load its history.
    pub async fn view_channel(&mut self, addr: &Address, channel: &str) -> Result<()> {
        if channel.is_empty() {
            return Ok(());
        }

        let snapshot = {
            let session = self.sessions.require_mut(addr)?;
            session.view.channel = channel.to_string();
            session.view.set_unread(channel, Some(0));
            session.snapshot()
        };

        self.persist().await;
        self.events.emit(StateEvent::AddCabal(Box::new(snapshot)));
        self.events.emit(StateEvent::ViewCabal {
            addr: addr.clone(),
            channel: channel.to_string(),
        });

        let limit = self.config.history_limit;
        if let Err(e) = self.fetch_recent_messages(addr, channel, limit).await {
            debug!(addr = %addr.short(), channel, error = %e, "Keeping cached history");
        }

        self.update_channel_unread(addr, channel, Some(0))
    }

    pub async fn view_next_channel(&mut self, addr: &Address) -> Result<()> {
        let next = self
            .sessions
            .require(addr)?
            .view
            .next_channel()
            .map(str::to_string);
        match next {
            Some(channel) => self.view_channel(addr, &channel).await,
            None => Ok(()),
        }
    }

    pub async fn view_previous_channel(&mut self, addr: &Address) -> Result<()> {
        let previous = self
            .sessions
            .require(addr)?
            .view
            .previous_channel()
            .map(str::to_string);
        match previous {
            Some(channel) => self.view_channel(addr, &channel).await,
            None => Ok(()),
        }
    }

    /// Subscribe to live messages on `channel`. Idempotent; returns whether
    /// a new listener was added.
    pub fn add_channel_listener(&mut self, addr: &Address, channel: &str) -> Result<bool> {
        let session = self.sessions.require_mut(addr)?;
        if !session.view.add_listener(channel) {
            return Ok(false);
        }
        session.store.watch_channel(channel);
        info!(addr = %addr.short(), channel, "Watching channel");
        Ok(true)
    }

    /// Set the unread counter of `channel`, or bump it when `count` is
    /// `None`, then publish the counters and refresh the badge.
    pub fn update_channel_unread(
        &mut self,
        addr: &Address,
        channel: &str,
        count: Option<u64>,
    ) -> Result<()> {
        let session = self.sessions.require_mut(addr)?;
        let total = session.view.set_unread(channel, count);
        let per_channel = session.view.unread_counts().clone();

        self.events.emit(StateEvent::UpdateCabal(
            CabalUpdate::new(addr.clone()).unread(per_channel, total),
        ));
        self.update_app_icon_badge(None);
        Ok(())
    }

    /// Push a badge count to the host and the UI. A missing or zero count
    /// means the unread total across every cabal.
    pub fn update_app_icon_badge(&self, count: Option<u64>) {
        let badge_count = count
            .filter(|n| *n > 0)
            .unwrap_or_else(|| self.sessions.total_unread());
        self.host.update_badge(badge_count, false);
        self.events
            .emit(StateEvent::UpdateWindowBadge { badge_count });
    }
}
