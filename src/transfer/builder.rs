//! Transaction envelope assembly
//!
//! Compiles an instruction plan into a single unsigned transaction envelope.
//! The liveness anchor is fetched immediately before the envelope leaves the
//! builder; anchors expire, and a stale one gets the submission rejected by
//! the network.

use std::sync::Arc;

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, transaction::Transaction};
use tracing::debug;

use crate::rpc::{BlockhashAnchor, LedgerRpc};
use crate::transfer::errors::TransferError;
use crate::transfer::instructions::{sanity_check_plan, InstructionPlan};

/// An unsigned transaction envelope: ordered instructions, fee payer, and
/// the liveness anchor bounding its validity.
#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub anchor: BlockhashAnchor,
}

/// The same envelope after exactly one signing pass.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub tx: Transaction,
    pub anchor: BlockhashAnchor,
}

pub struct EnvelopeBuilder {
    rpc: Arc<dyn LedgerRpc>,
}

impl EnvelopeBuilder {
    pub fn new(rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { rpc }
    }

    /// Assemble the unsigned envelope for one plan.
    ///
    /// Fee payer is the sender owner. The returned envelope is
    /// self-contained and order-preserving; its instructions execute
    /// atomically on the ledger.
    pub async fn build(
        &self,
        plan: &InstructionPlan,
        fee_payer: &Pubkey,
    ) -> Result<TransactionEnvelope, TransferError> {
        sanity_check_plan(plan)?;

        let instructions: Vec<Instruction> = plan
            .instructions
            .iter()
            .map(|ix| ix.compile())
            .collect::<Result<_, _>>()?;

        // Anchor last: instruction compilation must not age the blockhash
        let anchor = self.rpc.latest_blockhash().await?;

        let mut tx = Transaction::new_with_payer(&instructions, Some(fee_payer));
        tx.message.recent_blockhash = anchor.blockhash;

        debug!(
            instructions = instructions.len(),
            blockhash = %anchor.blockhash,
            last_valid_block_height = anchor.last_valid_block_height,
            "assembled unsigned envelope"
        );

        Ok(TransactionEnvelope { tx, anchor })
    }
}
