//! Error taxonomy for the donation transfer pipeline
//!
//! Every pipeline stage surfaces its error upward unchanged; no stage
//! silently retries or swallows a failure. The orchestrator maps terminal
//! cases onto [`crate::types::SettlementOutcome`] and propagates the rest.

use std::time::Duration;

use solana_sdk::signature::Signature;
use thiserror::Error;

/// Classified ledger-side execution failure.
///
/// Produced when a broadcast transaction executes and fails on the ledger,
/// or when the entry node rejects it during preflight simulation. The kind
/// is derived from the node's well-defined error codes; the message keeps
/// the node's original wording for display and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerError {
    pub kind: LedgerErrorKind,
    pub message: String,
}

/// Error codes the network endpoint is known to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// Source account cannot cover the transfer (or the fee)
    InsufficientFunds,
    /// A referenced account does not exist on the ledger
    AccountNotFound,
    /// The node has already seen this exact transaction
    AlreadyProcessed,
    /// The liveness anchor expired before the node accepted the transaction
    BlockhashExpired,
    /// Any other execution failure
    Other,
}

impl LedgerError {
    pub fn new(kind: LedgerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a node-reported error message into a known kind.
    ///
    /// Matching is message-based because the JSON-RPC boundary surfaces most
    /// execution failures as strings; unknown messages fall through to
    /// [`LedgerErrorKind::Other`] with the wording preserved.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        let kind = if lower.contains("insufficient funds") || lower.contains("insufficient lamports")
        {
            LedgerErrorKind::InsufficientFunds
        } else if lower.contains("account not found")
            || lower.contains("accountnotfound")
            || lower.contains("could not find account")
        {
            LedgerErrorKind::AccountNotFound
        } else if lower.contains("already processed") || lower.contains("alreadyprocessed") {
            LedgerErrorKind::AlreadyProcessed
        } else if lower.contains("blockhash not found")
            || lower.contains("blockhash expired")
            || lower.contains("block height exceeded")
        {
            LedgerErrorKind::BlockhashExpired
        } else {
            LedgerErrorKind::Other
        };

        Self::new(kind, message)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Failure cases of the donation transfer pipeline.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Pre-flight validation failure; rejected before any network call
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// An address could not be parsed into the ledger's address format
    #[error("Invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    /// The user explicitly declined to sign; never retried automatically
    #[error("Signing rejected by user: {reason}")]
    UserRejected { reason: String },

    /// No wallet session, or communication with the signer broke down
    #[error("Wallet signer unavailable: {reason}")]
    SignerUnavailable { reason: String },

    /// The ledger accepted the transaction but execution failed
    #[error("Ledger execution failed: {0}")]
    Ledger(LedgerError),

    /// The anchor's validity window elapsed without a terminal status.
    /// The transaction may still confirm; callers must present this as
    /// "unknown", never as "failed".
    #[error("Confirmation window elapsed for {signature} after {waited:?}")]
    ConfirmationTimedOut {
        signature: Signature,
        waited: Duration,
    },

    /// Transport-level RPC failure
    #[error("RPC error during {operation}: {message}")]
    Rpc {
        operation: &'static str,
        message: String,
    },

    /// Another transfer is already pending in this session
    #[error("A transfer is already in flight for this session")]
    InFlight,

    /// Internal invariant violation; indicates a bug rather than bad input
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn invalid_address(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            field,
            value: value.into(),
        }
    }

    pub fn user_rejected(reason: impl Into<String>) -> Self {
        Self::UserRejected {
            reason: reason.into(),
        }
    }

    pub fn signer_unavailable(reason: impl Into<String>) -> Self {
        Self::SignerUnavailable {
            reason: reason.into(),
        }
    }

    pub fn rpc(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Rpc {
            operation,
            message: err.to_string(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// Stable label for logs and counters.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::UserRejected { .. } => "user_rejected",
            Self::SignerUnavailable { .. } => "signer_unavailable",
            Self::Ledger(_) => "ledger",
            Self::ConfirmationTimedOut { .. } => "timed_out",
            Self::Rpc { .. } => "rpc",
            Self::InFlight => "in_flight",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether a caller may retry with a brand-new envelope.
    ///
    /// `ConfirmationTimedOut` is deliberately non-retryable: the original
    /// transaction may still land, and resubmitting before its window closes
    /// risks a double transfer from the user's perspective.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc { .. } => true,
            Self::SignerUnavailable { .. } => true,
            Self::InvalidRequest { .. }
            | Self::InvalidAddress { .. }
            | Self::UserRejected { .. }
            | Self::Ledger(_)
            | Self::ConfirmationTimedOut { .. }
            | Self::InFlight
            | Self::Internal(_) => false,
        }
    }
}
