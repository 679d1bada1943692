//! Instruction planning and ordering validation
//!
//! The plan is expressed over an abstract tagged-variant instruction type so
//! planning and ordering stay testable without a live ledger client; the
//! variants lower to real SPL instructions at envelope-build time.
//!
//! Required order:
//! 1. recipient token-account creation (only when the resolver reported it
//!    absent)
//! 2. the transfer itself, owner-authorized by the sender

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_associated_token_account::instruction::create_associated_token_account;
use spl_token::instruction::transfer_checked;

use crate::transfer::errors::TransferError;
use crate::transfer::resolver::ResolvedTransfer;

/// One planned instruction of a donation transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedInstruction {
    /// Create the recipient's token account; rent funded by the sender
    CreateTokenAccount {
        funder: Pubkey,
        owner: Pubkey,
        mint: Pubkey,
    },

    /// Move raw base units between token accounts
    TransferTokens {
        source: Pubkey,
        destination: Pubkey,
        mint: Pubkey,
        authority: Pubkey,
        amount: u64,
        decimals: u8,
    },
}

impl PlannedInstruction {
    /// Lower the variant to a real ledger instruction.
    pub fn compile(&self) -> Result<Instruction, TransferError> {
        match self {
            Self::CreateTokenAccount { funder, owner, mint } => Ok(
                create_associated_token_account(funder, owner, mint, &spl_token::id()),
            ),
            Self::TransferTokens {
                source,
                destination,
                mint,
                authority,
                amount,
                decimals,
            } => transfer_checked(
                &spl_token::id(),
                source,
                mint,
                destination,
                authority,
                &[],
                *amount,
                *decimals,
            )
            .map_err(|e| TransferError::internal(format!("transfer instruction build: {e}"))),
        }
    }
}

/// Ordered plan of instructions for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPlan {
    /// The ordered instruction list
    pub instructions: Vec<PlannedInstruction>,

    /// Whether the plan creates the recipient's token account
    pub creates_destination: bool,
}

/// Plan the instructions for one resolved transfer.
///
/// The creation instruction is included only when the resolver reported the
/// recipient's token account absent, and always precedes the transfer. The
/// resulting envelope executes atomically on the ledger.
pub fn plan_transfer_instructions(
    resolved: &ResolvedTransfer,
    raw_amount: u64,
    decimals: u8,
) -> Result<InstructionPlan, TransferError> {
    if raw_amount == 0 {
        return Err(TransferError::invalid_request(
            "transfer of zero base units",
        ));
    }

    let mut instructions = Vec::with_capacity(2);

    if resolved.recipient_account_missing {
        instructions.push(PlannedInstruction::CreateTokenAccount {
            funder: resolved.sender,
            owner: resolved.recipient,
            mint: resolved.mint,
        });
    }

    instructions.push(PlannedInstruction::TransferTokens {
        source: resolved.sender_token_account,
        destination: resolved.recipient_token_account,
        mint: resolved.mint,
        authority: resolved.sender,
        amount: raw_amount,
        decimals,
    });

    Ok(InstructionPlan {
        instructions,
        creates_destination: resolved.recipient_account_missing,
    })
}

/// Validate plan ordering (debug/test builds only).
///
/// Checks:
/// - the plan is not empty
/// - exactly one transfer instruction, in last position
/// - a creation instruction appears only in first position, and only when
///   the plan says it creates the destination
#[cfg(debug_assertions)]
pub fn sanity_check_plan(plan: &InstructionPlan) -> Result<(), TransferError> {
    if plan.instructions.is_empty() {
        return Err(TransferError::internal("instruction plan is empty"));
    }

    let transfer_count = plan
        .instructions
        .iter()
        .filter(|ix| matches!(ix, PlannedInstruction::TransferTokens { .. }))
        .count();
    if transfer_count != 1 {
        return Err(TransferError::internal(format!(
            "expected exactly one transfer instruction, found {transfer_count}"
        )));
    }

    if !matches!(
        plan.instructions.last(),
        Some(PlannedInstruction::TransferTokens { .. })
    ) {
        return Err(TransferError::internal(
            "transfer instruction must be last",
        ));
    }

    for (idx, ix) in plan.instructions.iter().enumerate() {
        if matches!(ix, PlannedInstruction::CreateTokenAccount { .. }) {
            if idx != 0 {
                return Err(TransferError::internal(format!(
                    "creation instruction must come first, found at position {idx}"
                )));
            }
            if !plan.creates_destination {
                return Err(TransferError::internal(
                    "creation instruction present but plan does not create the destination",
                ));
            }
        }
    }

    Ok(())
}

/// No-op version for release builds.
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_plan(_plan: &InstructionPlan) -> Result<(), TransferError> {
    Ok(())
}
