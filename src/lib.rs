//! Donation transfer pipeline library
//!
//! Exposes the core modules for the CLI driver and for integration tests:
//! validating a transfer request, building the ledger transaction, signing
//! it through the wallet gateway, and monitoring it to settlement.

pub mod catalog;
pub mod config;
pub mod observability;
pub mod rpc;
pub mod transfer;
pub mod types;
pub mod wallet;

// Re-export commonly used ledger types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
