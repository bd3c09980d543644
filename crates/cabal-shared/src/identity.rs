use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use crate::types::Address;

/// A freshly generated cabal keypair.
///
/// Only the public half leaves this module; it becomes the address of a
/// new cabal. The secret stays with the log library, which creates its own
/// writer keys when the store is opened.
pub struct CabalKeypair {
    signing_key: SigningKey,
}

impl CabalKeypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Get the raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn address(&self) -> Address {
        Address::from_bytes(&self.public_key_bytes())
    }
}

/// Address for a brand-new cabal.
pub fn generate_address() -> Address {
    CabalKeypair::generate().address()
}
