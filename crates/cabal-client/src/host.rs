//! Integration with the desktop shell hosting the client.

use async_trait::async_trait;

use cabal_shared::Address;

use crate::actions::Action;

/// Services provided by the host process.
#[async_trait]
pub trait Host: Send + Sync {
    /// Whether the application window currently has focus.
    fn has_focus(&self) -> bool;

    /// Update the dock / taskbar badge.
    fn update_badge(&self, badge_count: u64, show_count: bool);

    fn show_notification(&self, notification: DesktopNotification);

    /// Ask the user a yes/no question, blocking until they answer.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// A desktop notification for an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotification {
    pub title: String,
    pub body: String,
    pub addr: Address,
    pub channel: String,
}

impl DesktopNotification {
    /// Action to dispatch when the user clicks the notification.
    pub fn on_click(&self) -> Action {
        Action::ViewCabal {
            addr: self.addr.clone(),
            channel: Some(self.channel.clone()),
        }
    }
}
