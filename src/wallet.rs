//! Wallet session collaborator
//!
//! Supplies the connected owner address and the keypair backing the local
//! signing capability. Keypair files are accepted in raw-bytes or JSON
//! format; all-zero keys are rejected outright.

use std::sync::Arc;

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

/// An established wallet session around a local keypair.
pub struct WalletSession {
    keypair: Arc<Keypair>,
}

impl WalletSession {
    /// Create a session from a keypair file
    pub fn from_file(path: &str) -> Result<Self> {
        let keypair_bytes =
            std::fs::read(path).with_context(|| format!("Failed to read keypair file: {}", path))?;

        let keypair = if keypair_bytes.len() == 64 {
            // Raw bytes format - validate before conversion
            if keypair_bytes.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(keypair_bytes.as_slice()).context("Invalid keypair bytes")?
        } else {
            // JSON format
            let json: Vec<u8> =
                serde_json::from_slice(&keypair_bytes).context("Failed to parse keypair JSON")?;
            if json.len() != 64 {
                anyhow::bail!(
                    "Invalid keypair length: expected 64 bytes, got {}",
                    json.len()
                );
            }
            if json.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(json.as_slice()).context("Invalid keypair from JSON")?
        };

        Ok(Self {
            keypair: Arc::new(keypair),
        })
    }

    /// Create a session from an in-memory keypair
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// The connected owner address
    pub fn owner(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// The keypair backing the signing capability
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl Clone for WalletSession {
    fn clone(&self) -> Self {
        Self {
            keypair: Arc::clone(&self.keypair),
        }
    }
}
