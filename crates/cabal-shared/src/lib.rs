//! Types shared by the Cabal desktop crates: cabal addresses, key
//! generation, invite decoding and application constants.

pub mod constants;
pub mod error;
pub mod identity;
pub mod invite;
pub mod types;

pub use error::AddressError;
pub use types::Address;
