//! Submission and confirmation monitoring
//!
//! Broadcasts the signed envelope exactly once and watches it to a terminal
//! status. Node acceptance of the broadcast is NOT settlement; only the
//! status poll decides. The wait is bounded twice: by the anchor's
//! `last_valid_block_height` and by a wall-clock budget sized to the
//! anchor's validity window, so the loop can never block indefinitely.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::signature::Signature;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::rpc::{LedgerRpc, SignatureStatus};
use crate::transfer::builder::SignedEnvelope;
use crate::transfer::errors::TransferError;

pub struct ConfirmationMonitor {
    rpc: Arc<dyn LedgerRpc>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ConfirmationMonitor {
    pub fn new(rpc: Arc<dyn LedgerRpc>, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            rpc,
            poll_interval,
            max_wait,
        }
    }

    /// Broadcast the envelope and poll until a terminal status.
    ///
    /// Exactly one broadcast per call. After a ledger-reported failure the
    /// envelope is never resubmitted; a retry requires a brand-new envelope
    /// with a fresh anchor.
    pub async fn submit_and_confirm(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<Signature, TransferError> {
        let signature = self.rpc.send_transaction(&envelope.tx).await?;
        info!(%signature, "transaction accepted by node; awaiting confirmation");

        let started = Instant::now();
        let deadline = started + self.max_wait;

        loop {
            match self.rpc.signature_status(&signature).await {
                Ok(SignatureStatus::Confirmed) => {
                    info!(%signature, "transfer confirmed");
                    return Ok(signature);
                }
                Ok(SignatureStatus::Failed(ledger_error)) => {
                    warn!(%signature, error = %ledger_error, "transfer failed on ledger");
                    return Err(TransferError::Ledger(ledger_error));
                }
                Ok(SignatureStatus::Pending) => {
                    debug!(%signature, "not yet at the required commitment");
                }
                // A failed status read is not a failed transaction; the
                // expiry window still bounds the loop
                Err(e) => {
                    warn!(%signature, error = %e, "status poll failed");
                }
            }

            if let Ok(height) = self.rpc.block_height().await {
                if height > envelope.anchor.last_valid_block_height {
                    warn!(
                        %signature,
                        height,
                        last_valid_block_height = envelope.anchor.last_valid_block_height,
                        "anchor expired without a terminal status"
                    );
                    return Err(TransferError::ConfirmationTimedOut {
                        signature,
                        waited: started.elapsed(),
                    });
                }
            }

            if Instant::now() >= deadline {
                warn!(%signature, waited = ?started.elapsed(), "confirmation window exhausted");
                return Err(TransferError::ConfirmationTimedOut {
                    signature,
                    waited: started.elapsed(),
                });
            }

            sleep(self.poll_interval).await;
        }
    }
}
