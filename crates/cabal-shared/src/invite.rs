//! Decoding of user-supplied cabal invites.
//!
//! An invite is the cabal key, optionally wrapped in a URL:
//! `cabal://<key>`, `dat://<key>/some/path`, or the bare 64-char hex key.

use crate::constants::INVITE_SCHEMES;
use crate::error::AddressError;
use crate::types::Address;

/// Decode an invite into the cabal address it points at.
pub fn decode_invite(input: &str) -> Result<Address, AddressError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AddressError::Empty);
    }

    let without_scheme = INVITE_SCHEMES
        .iter()
        .find_map(|scheme| strip_prefix_ignore_case(trimmed, scheme))
        .unwrap_or(trimmed);

    // Anything after the key (path, query, trailing slash) is ignored.
    let key = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    Address::from_hex(key)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
