//! Ed25519 keypair loaded from a Solana CLI keypair file.

use crate::error::{Error, Result};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::path::Path;

pub struct Wallet {
    key: SigningKey,
}

impl Wallet {
    /// Load a keypair file: a JSON array of 64 (secret ‖ public) or 32
    /// (secret seed) byte values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Wallet(format!("cannot read keypair {}: {e}", path.display()))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&content).map_err(|e| {
            Error::Wallet(format!("keypair {} is not a byte array: {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key = match bytes.len() {
            64 => {
                let mut pair = [0u8; 64];
                pair.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&pair).map_err(|_| {
                    Error::Wallet("public half of keypair does not match secret".into())
                })?
            }
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                SigningKey::from_bytes(&seed)
            }
            n => {
                return Err(Error::Wallet(format!(
                    "keypair must hold 64 or 32 bytes, found {n}"
                )));
            }
        };
        Ok(Self { key })
    }

    pub fn pubkey(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Base58 public key, as Solana tools display it.
    pub fn address(&self) -> String {
        bs58::encode(self.pubkey()).into_string()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
