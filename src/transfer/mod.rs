//! Donation transfer supercomponent
//!
//! The pipeline that turns a validated transfer request into a terminal
//! settlement outcome:
//!
//! - **errors**: failure taxonomy shared by every stage
//! - **resolver**: deterministic token-account resolution and existence
//!   probing
//! - **instructions**: abstract instruction planning with ordering
//!   validation
//! - **builder**: unsigned envelope assembly with a fresh liveness anchor
//! - **signer**: wallet signing gateway over an external signer
//! - **monitor**: single broadcast plus bounded confirmation polling
//! - **orchestrator**: sequences the stages, owns the in-flight guard and
//!   the error-mapping policy

pub mod errors;

pub mod builder;
pub mod instructions;
pub mod monitor;
pub mod orchestrator;
pub mod resolver;
pub mod signer;

pub use builder::{EnvelopeBuilder, SignedEnvelope, TransactionEnvelope};
pub use errors::{LedgerError, LedgerErrorKind, TransferError};
pub use instructions::{plan_transfer_instructions, InstructionPlan, PlannedInstruction};
pub use monitor::ConfirmationMonitor;
pub use orchestrator::TransferOrchestrator;
pub use resolver::{AccountResolver, ResolvedTransfer};
pub use signer::{KeypairSigner, SigningGateway, TransferSigner};
