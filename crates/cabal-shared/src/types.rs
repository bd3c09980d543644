use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{KEY_HEX_LEN, KEY_SIZE};
use crate::error::AddressError;

/// Address of a cabal: its 32-byte public key as 64 lowercase hex chars.
///
/// The address doubles as the name of the cabal's directory on disk and
/// as the key of its entry in the state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn from_bytes(bytes: &[u8; KEY_SIZE]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a bare hex key. Uppercase input is normalised.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        if s.len() != KEY_HEX_LEN {
            return Err(AddressError::InvalidLength {
                expected: KEY_HEX_LEN,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_bytes(&arr))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex chars, used in prompts and logs.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
