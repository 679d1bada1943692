//! Wallet signing gateway
//!
//! Hands the unsigned envelope to an external signer the user controls. The
//! call suspends until the user approves or declines, or until the signer
//! becomes unreachable. A decline is a deliberate user decision and is
//! surfaced immediately; the gateway never retries it.

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use crate::transfer::builder::{SignedEnvelope, TransactionEnvelope};
use crate::transfer::errors::TransferError;
use crate::wallet::WalletSession;

/// The external signing capability supplied by the wallet session
/// collaborator.
#[async_trait]
pub trait TransferSigner: Send + Sync {
    /// The connected owner address, or `None` when no wallet session exists.
    fn connected_owner(&self) -> Option<Pubkey>;

    /// Present the envelope for authorization.
    ///
    /// Fails with [`TransferError::UserRejected`] on explicit decline or
    /// [`TransferError::SignerUnavailable`] when the signer cannot be
    /// reached.
    async fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, TransferError>;
}

/// Local keypair signer, the crate's stand-in for a browser wallet adapter.
pub struct KeypairSigner {
    session: WalletSession,
}

impl KeypairSigner {
    pub fn new(session: WalletSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl TransferSigner for KeypairSigner {
    fn connected_owner(&self) -> Option<Pubkey> {
        Some(self.session.owner())
    }

    async fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, TransferError> {
        let TransactionEnvelope { mut tx, anchor } = envelope;

        tx.try_sign(&[self.session.keypair()], anchor.blockhash)
            .map_err(|e| TransferError::signer_unavailable(format!("local signing failed: {e}")))?;

        Ok(SignedEnvelope { tx, anchor })
    }
}

/// Gateway in front of the external signer.
pub struct SigningGateway {
    signer: Arc<dyn TransferSigner>,
}

impl SigningGateway {
    pub fn new(signer: Arc<dyn TransferSigner>) -> Self {
        Self { signer }
    }

    pub fn connected_owner(&self) -> Option<Pubkey> {
        self.signer.connected_owner()
    }

    /// Delegate signing and verify the result carries a full signature set.
    pub async fn sign(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, TransferError> {
        debug!("handing envelope to wallet signer");
        let signed = self.signer.sign_envelope(envelope).await?;

        if !signed.tx.is_signed() {
            return Err(TransferError::signer_unavailable(
                "signer returned an unsigned envelope",
            ));
        }

        Ok(signed)
    }
}
