//! # cabal-store
//!
//! On-disk persistence for the Cabal desktop client.
//!
//! Only lightweight client settings live here: one JSON document mapping
//! each cabal address to its username and per-cabal settings. Message
//! history is never persisted by this crate; it lives in each cabal's own
//! log directory, which the log library manages.

pub mod models;
pub mod state_file;

mod error;

pub use error::{Result, StoreError};
pub use models::*;
pub use state_file::{default_data_dir, filter_for_keys, StateStore};
