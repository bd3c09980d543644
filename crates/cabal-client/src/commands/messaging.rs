//! Message history, live messages, publishing and composer input.

use tracing::{debug, warn};

use cabal_shared::Address;

use crate::backend::{LogEntry, OutgoingMessage};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::{CabalUpdate, StateEvent};
use crate::host::DesktopNotification;
use crate::models::Message;
use crate::slash::{self, Command, CommandInfo};

impl Dispatcher {
    /// Replace the buffer of `channel` with its `count` newest messages,
    /// oldest first, then refresh its topic.
    ///
    /// A failed read leaves the cached buffer untouched.
    pub async fn fetch_recent_messages(
        &mut self,
        addr: &Address,
        channel: &str,
        count: usize,
    ) -> Result<()> {
        if channel.is_empty() {
            return Ok(());
        }

        let store = self.ready_store(addr)?;
        let mut entries = store.read_messages(channel, count).await?;
        entries.truncate(count);
        entries.reverse();

        let messages = {
            let session = self.sessions.require_mut(addr)?;
            let messages: Vec<Message> = entries
                .iter()
                .map(|entry| Message::from_entry(entry, session.view.author_name(&entry.key)))
                .collect();
            session.view.replace_messages(channel, messages.clone());
            messages
        };

        debug!(addr = %addr.short(), channel, count = messages.len(), "History loaded");
        self.events.emit(StateEvent::UpdateCabal(
            CabalUpdate::new(addr.clone()).messages(messages),
        ));

        match store.get_topic(channel).await {
            Ok(Some(topic)) if !topic.is_empty() => {
                self.sessions.require_mut(addr)?.view.set_topic(channel, topic.clone());
                self.events.emit(StateEvent::UpdateTopic {
                    addr: addr.clone(),
                    topic,
                });
            }
            Ok(_) => {}
            Err(e) => debug!(addr = %addr.short(), channel, error = %e, "No topic"),
        }
        Ok(())
    }

    /// A message arrived on a watched channel.
    pub(crate) fn handle_incoming_message(&mut self, addr: &Address, entry: LogEntry) -> Result<()> {
        let is_current_session = self.sessions.current() == Some(addr);
        let session = self.sessions.require_mut(addr)?;
        let channel = entry.channel.clone();

        let author = session.view.author_name(&entry.key);
        let message = Message::from_entry(&entry, author.clone());
        session.view.push_message(&channel, message);

        let is_current_channel = session.view.channel == channel;
        let notify = session.settings.enable_notifications;
        let messages = is_current_channel.then(|| session.view.messages(&channel).to_vec());

        if let Some(messages) = messages {
            self.events.emit(StateEvent::UpdateCabal(
                CabalUpdate::new(addr.clone()).messages(messages),
            ));
        }

        if !(is_current_channel && is_current_session) {
            self.update_channel_unread(addr, &channel, None)?;
        }

        if notify && !self.host.has_focus() {
            self.host.show_notification(DesktopNotification {
                title: author,
                body: entry.text,
                addr: addr.clone(),
                channel,
            });
        }
        Ok(())
    }

    /// Publish a message from the local identity.
    pub async fn add_message(&mut self, addr: &Address, message: OutgoingMessage) -> Result<()> {
        let store = self.ready_store(addr)?;
        store.publish(message).await?;
        Ok(())
    }

    /// Append a client-generated notice to `channel` (or the current
    /// channel). It is never published.
    ///
    /// The UI only receives the buffer when `channel` is the one on screen.
    pub async fn add_local_system_message(
        &mut self,
        addr: &Address,
        channel: Option<&str>,
        content: String,
    ) -> Result<()> {
        let messages = {
            let session = self.sessions.require_mut(addr)?;
            let channel = channel
                .map(str::to_string)
                .unwrap_or_else(|| session.view.channel.clone());
            session.view.push_message(&channel, Message::local_system(content));
            (session.view.channel == channel).then(|| session.view.messages(&channel).to_vec())
        };

        match messages {
            Some(messages) => {
                self.update_session(CabalUpdate::new(addr.clone()).messages(messages))
                    .await
            }
            None => {
                self.persist().await;
                Ok(())
            }
        }
    }

    pub async fn set_channel_topic(
        &mut self,
        addr: &Address,
        channel: &str,
        topic: &str,
    ) -> Result<()> {
        let store = self.ready_store(addr)?;
        store.publish_topic(channel, topic).await?;

        self.sessions.require_mut(addr)?.view.set_topic(channel, topic);
        self.add_local_system_message(addr, Some(channel), format!("Topic set to: {topic}"))
            .await?;

        if self.sessions.require(addr)?.view.channel == channel {
            self.events.emit(StateEvent::UpdateTopic {
                addr: addr.clone(),
                topic: topic.to_string(),
            });
        }
        Ok(())
    }

    /// Handle a line typed into the composer.
    pub async fn submit_input(&mut self, addr: &Address, input: &str) -> Result<()> {
        let Some(command) = slash::parse(input) else {
            return Ok(());
        };
        let channel = self.sessions.require(addr)?.view.channel.clone();

        match command {
            Command::Say(text) => {
                self.add_message(addr, OutgoingMessage::text(channel, text))
                    .await
            }
            Command::Emote(text) => {
                self.add_message(addr, OutgoingMessage::emote(channel, text))
                    .await
            }
            Command::Nick(name) => self.change_username(addr, &name).await,
            Command::Join(name) => self.join_channel(addr, &name).await,
            Command::Topic(topic) => self.set_channel_topic(addr, &channel, &topic).await,
            Command::Help => {
                for line in slash::help_lines() {
                    self.add_local_system_message(addr, None, line).await?;
                }
                Ok(())
            }
            Command::Usage(cmd) => {
                self.add_local_system_message(addr, None, format!("Usage: {}", cmd.usage))
                    .await
            }
            Command::Unknown(name) => {
                warn!(addr = %addr.short(), command = %name, "Unknown command");
                self.add_local_system_message(addr, None, format!("Unknown command: /{name}"))
                    .await
            }
        }
    }

    /// The commands understood by [`Dispatcher::submit_input`].
    pub fn list_commands(&self) -> &'static [CommandInfo] {
        slash::COMMANDS
    }
}
