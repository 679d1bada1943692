//! Network endpoint capability
//!
//! The pipeline drives the ledger through exactly three operations: fetch a
//! liveness anchor, broadcast a signed envelope, and read a transaction's
//! status (plus the account-existence probe the resolver needs and the
//! block-height read the expiry check needs). [`LedgerRpc`] is that
//! capability as a trait so every stage is testable against a scripted
//! ledger; [`NodeRpc`] is the JSON-RPC implementation.

use std::time::Duration;

use async_trait::async_trait;
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::InstructionError,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use tracing::debug;

use crate::config::RpcConfig;
use crate::transfer::errors::{LedgerError, LedgerErrorKind, TransferError};

/// Liveness anchor for a transaction envelope: a recent blockhash and the
/// last block height at which the network will still accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashAnchor {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Status of a broadcast transaction as observed through the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet at the required commitment level
    Pending,
    /// Reached the required commitment level
    Confirmed,
    /// Executed and failed on the ledger
    Failed(LedgerError),
}

/// The network endpoint as a capability.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetch a fresh liveness anchor.
    async fn latest_blockhash(&self) -> Result<BlockhashAnchor, TransferError>;

    /// Whether an account exists on the ledger at the required commitment.
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, TransferError>;

    /// Broadcast a signed transaction. Acceptance returns the signature but
    /// is NOT settlement.
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError>;

    /// Read the status of a broadcast transaction.
    async fn signature_status(&self, signature: &Signature)
        -> Result<SignatureStatus, TransferError>;

    /// Current block height, used to detect anchor expiry.
    async fn block_height(&self) -> Result<u64, TransferError>;
}

/// JSON-RPC node client.
pub struct NodeRpc {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl NodeRpc {
    pub fn new(url: String, timeout: Duration, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url, timeout, commitment),
            commitment,
        }
    }

    pub fn from_config(config: &RpcConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.url.clone(),
            config.timeout(),
            config.commitment()?,
        ))
    }
}

#[async_trait]
impl LedgerRpc for NodeRpc {
    async fn latest_blockhash(&self) -> Result<BlockhashAnchor, TransferError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| TransferError::rpc("get_latest_blockhash", e))?;

        debug!(%blockhash, last_valid_block_height, "fetched liveness anchor");
        Ok(BlockhashAnchor {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, TransferError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| TransferError::rpc("get_account", e))?;

        Ok(response.value.is_some())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError> {
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };

        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(classify_send_error)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, TransferError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| TransferError::rpc("get_signature_statuses", e))?;

        let status: Option<solana_transaction_status::TransactionStatus> =
            response.value.into_iter().next().flatten();

        Ok(match status {
            None => SignatureStatus::Pending,
            Some(status) => {
                if let Some(err) = status.err {
                    SignatureStatus::Failed(classify_transaction_error(&err))
                } else if status.satisfies_commitment(self.commitment) {
                    SignatureStatus::Confirmed
                } else {
                    SignatureStatus::Pending
                }
            }
        })
    }

    async fn block_height(&self) -> Result<u64, TransferError> {
        self.client
            .get_block_height_with_commitment(self.commitment)
            .await
            .map_err(|e| TransferError::rpc("get_block_height", e))
    }
}

/// Map a broadcast failure onto the taxonomy: execution failures surfaced by
/// preflight become [`TransferError::Ledger`], everything else is transport.
fn classify_send_error(err: ClientError) -> TransferError {
    if let Some(tx_err) = err.get_transaction_error() {
        return TransferError::Ledger(classify_transaction_error(&tx_err));
    }

    let message = err.to_string();
    let classified = LedgerError::classify(&message);
    match classified.kind {
        LedgerErrorKind::Other => TransferError::rpc("send_transaction", message),
        _ => TransferError::Ledger(classified),
    }
}

/// Map a typed ledger execution error onto the well-defined error kinds,
/// keeping the node's wording for display.
pub fn classify_transaction_error(err: &TransactionError) -> LedgerError {
    let kind = match err {
        TransactionError::InsufficientFundsForFee
        | TransactionError::InsufficientFundsForRent { .. }
        | TransactionError::InstructionError(_, InstructionError::InsufficientFunds) => {
            LedgerErrorKind::InsufficientFunds
        }
        TransactionError::AccountNotFound | TransactionError::ProgramAccountNotFound => {
            LedgerErrorKind::AccountNotFound
        }
        TransactionError::AlreadyProcessed => LedgerErrorKind::AlreadyProcessed,
        TransactionError::BlockhashNotFound => LedgerErrorKind::BlockhashExpired,
        other => return LedgerError::classify(&other.to_string()),
    };

    LedgerError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_typed_transaction_errors() {
        assert_eq!(
            classify_transaction_error(&TransactionError::InsufficientFundsForFee).kind,
            LedgerErrorKind::InsufficientFunds
        );
        assert_eq!(
            classify_transaction_error(&TransactionError::InstructionError(
                0,
                InstructionError::InsufficientFunds
            ))
            .kind,
            LedgerErrorKind::InsufficientFunds
        );
        assert_eq!(
            classify_transaction_error(&TransactionError::AccountNotFound).kind,
            LedgerErrorKind::AccountNotFound
        );
        assert_eq!(
            classify_transaction_error(&TransactionError::AlreadyProcessed).kind,
            LedgerErrorKind::AlreadyProcessed
        );
        assert_eq!(
            classify_transaction_error(&TransactionError::BlockhashNotFound).kind,
            LedgerErrorKind::BlockhashExpired
        );
    }

    #[test]
    fn test_classify_unknown_transaction_error_keeps_message() {
        let err = classify_transaction_error(&TransactionError::InstructionError(
            0,
            InstructionError::Custom(1),
        ));
        assert_eq!(err.kind, LedgerErrorKind::Other);
        assert!(!err.message.is_empty());
    }
}
