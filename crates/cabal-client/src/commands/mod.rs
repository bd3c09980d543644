//! Action handlers.
//!
//! Each sub-module adds an `impl Dispatcher` block for one domain. Handlers
//! are public so hosts (and tests) can call them directly instead of going
//! through [`crate::actions::Action`].

pub mod cabals;
pub mod channels;
pub mod messaging;
pub mod settings;
pub mod users;
