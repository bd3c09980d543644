//! # cabal-client
//!
//! State layer of the Cabal desktop client.
//!
//! The [`Dispatcher`] owns every open cabal. It takes UI [`Action`]s and
//! live events from the log library ([`LogBackend`]) and answers with
//! [`StateEvent`]s describing how the UI should change. The desktop shell
//! is reached through the [`Host`] trait.

pub mod actions;
pub mod backend;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod host;
pub mod memory;
pub mod models;
pub mod render;
pub mod session;
pub mod slash;
pub mod view;

use tracing_subscriber::{fmt, EnvFilter};

pub use actions::Action;
pub use backend::{CabalStore, LogBackend, LogEntry, LogEvent, OutgoingMessage, SessionEvent};
pub use config::ClientConfig;
pub use dispatcher::{spawn, ClientHandle, Dispatcher};
pub use error::{BackendError, ClientError, Result};
pub use events::{CabalSnapshot, CabalUpdate, Screen, StateEvent};
pub use host::{DesktopNotification, Host};
pub use memory::MemoryBackend;
pub use models::{Message, MessageType, User};
pub use render::{render_messages, MessagesView};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cabal_client=debug,cabal_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting {}", cabal_shared::constants::APP_NAME);
    }
}
