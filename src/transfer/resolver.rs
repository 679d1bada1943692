//! Account resolution for token transfers
//!
//! Derives the deterministic token-holding accounts for both parties of a
//! transfer and probes whether the recipient's exists. The recipient account
//! is never assumed to exist; a missing one requires an extra creation
//! instruction in the plan.

use std::str::FromStr;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use tracing::debug;

use crate::rpc::LedgerRpc;
use crate::transfer::errors::TransferError;
use crate::types::TransferRequest;

/// Fully resolved accounts for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTransfer {
    /// Sender owner address (also the fee payer)
    pub sender: Pubkey,

    /// Recipient owner address
    pub recipient: Pubkey,

    /// Mint of the token being moved
    pub mint: Pubkey,

    /// Sender's token-holding account
    pub sender_token_account: Pubkey,

    /// Recipient's token-holding account
    pub recipient_token_account: Pubkey,

    /// The recipient's token account does not exist yet and must be created
    pub recipient_account_missing: bool,
}

/// Parse a base58 string into the ledger's address format.
pub fn parse_address(value: &str, field: &'static str) -> Result<Pubkey, TransferError> {
    Pubkey::from_str(value).map_err(|_| TransferError::invalid_address(field, value))
}

pub struct AccountResolver {
    rpc: Arc<dyn LedgerRpc>,
}

impl AccountResolver {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Whether the owner's token account for `mint` exists on the ledger.
    pub async fn token_account_exists(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<bool, TransferError> {
        let token_account = get_associated_token_address(owner, mint);
        self.rpc.account_exists(&token_account).await
    }

    /// Resolve every account one transfer touches.
    pub async fn resolve(&self, request: &TransferRequest) -> Result<ResolvedTransfer, TransferError> {
        let sender = parse_address(&request.sender_address, "sender")?;
        let recipient = parse_address(&request.recipient_address, "recipient")?;

        let mint_address = request.token.mint().ok_or_else(|| {
            TransferError::invalid_request(format!(
                "token '{}' is not transferable on this network",
                request.token.symbol
            ))
        })?;
        let mint = parse_address(mint_address, "mint")?;

        let sender_token_account = get_associated_token_address(&sender, &mint);
        let recipient_token_account = get_associated_token_address(&recipient, &mint);
        let recipient_account_missing = !self.token_account_exists(&recipient, &mint).await?;

        debug!(
            %sender_token_account,
            %recipient_token_account,
            recipient_account_missing,
            "resolved transfer accounts"
        );

        Ok(ResolvedTransfer {
            sender,
            recipient,
            mint,
            sender_token_account,
            recipient_token_account,
            recipient_account_missing,
        })
    }
}
