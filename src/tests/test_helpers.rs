//! Shared test fixtures: scripted ledger and signer mocks
//!
//! The mocks count every network-shaped call so tests can assert zero-cost
//! pre-flight rejection and exactly-one-broadcast behavior.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use tokio::sync::oneshot;

use crate::rpc::{BlockhashAnchor, LedgerRpc, SignatureStatus};
use crate::transfer::builder::{EnvelopeBuilder, SignedEnvelope, TransactionEnvelope};
use crate::transfer::errors::TransferError;
use crate::transfer::instructions::plan_transfer_instructions;
use crate::transfer::resolver::ResolvedTransfer;
use crate::transfer::signer::TransferSigner;
use crate::types::Token;

pub fn test_token(decimals: u8) -> Token {
    Token {
        id: "bonk".to_string(),
        symbol: "BONK".to_string(),
        name: "Bonk".to_string(),
        mint_address: Some(Pubkey::new_unique().to_string()),
        decimals,
    }
}

/// Scripted ledger endpoint.
///
/// Status reads consume a script front-to-back and report `Pending` once it
/// runs dry; block-height reads do the same with `0` (the anchor never
/// expires unless scripted).
pub struct MockLedger {
    anchor: BlockhashAnchor,
    recipient_account_exists: bool,
    status_script: Mutex<VecDeque<Result<SignatureStatus, TransferError>>>,
    block_heights: Mutex<VecDeque<u64>>,
    send_error: Mutex<Option<TransferError>>,
    last_sent: Mutex<Option<Transaction>>,

    pub blockhash_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub height_calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            anchor: BlockhashAnchor {
                blockhash: Hash::new_unique(),
                last_valid_block_height: 1_000,
            },
            recipient_account_exists: true,
            status_script: Mutex::new(VecDeque::new()),
            block_heights: Mutex::new(VecDeque::new()),
            send_error: Mutex::new(None),
            last_sent: Mutex::new(None),
            blockhash_calls: AtomicUsize::new(0),
            exists_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            height_calls: AtomicUsize::new(0),
        }
    }

    /// The recipient's token account does not exist yet
    pub fn with_recipient_missing(mut self) -> Self {
        self.recipient_account_exists = false;
        self
    }

    /// Append statuses to the script, consumed one per poll
    pub fn with_statuses(self, statuses: Vec<SignatureStatus>) -> Self {
        self.status_script
            .lock()
            .unwrap()
            .extend(statuses.into_iter().map(Ok));
        self
    }

    /// Append one failing status read to the script
    pub fn with_status_error(self, error: TransferError) -> Self {
        self.status_script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Script the block heights returned by successive expiry checks
    pub fn with_block_heights(self, heights: Vec<u64>) -> Self {
        self.block_heights.lock().unwrap().extend(heights);
        self
    }

    /// Fail the next broadcast with this error
    pub fn with_send_error(self, error: TransferError) -> Self {
        *self.send_error.lock().unwrap() = Some(error);
        self
    }

    /// Total network-shaped calls observed
    pub fn network_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
            + self.exists_calls.load(Ordering::SeqCst)
            + self.send_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.height_calls.load(Ordering::SeqCst)
    }

    /// The most recently broadcast transaction
    pub fn last_sent_tx(&self) -> Option<Transaction> {
        self.last_sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn latest_blockhash(&self) -> Result<BlockhashAnchor, TransferError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.anchor)
    }

    async fn account_exists(&self, _address: &Pubkey) -> Result<bool, TransferError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.recipient_account_exists)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.send_error.lock().unwrap().take() {
            return Err(error);
        }
        *self.last_sent.lock().unwrap() = Some(tx.clone());
        Ok(tx.signatures[0])
    }

    async fn signature_status(
        &self,
        _signature: &Signature,
    ) -> Result<SignatureStatus, TransferError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SignatureStatus::Pending))
    }

    async fn block_height(&self) -> Result<u64, TransferError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.block_heights.lock().unwrap().pop_front().unwrap_or(0))
    }
}

/// Scripted wallet signer.
pub struct MockSigner {
    keypair: Keypair,
    connected: bool,
    rejection: Option<String>,
    pub sign_calls: AtomicUsize,
}

impl MockSigner {
    pub fn approving() -> Self {
        Self {
            keypair: Keypair::new(),
            connected: true,
            rejection: None,
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            rejection: Some(reason.to_string()),
            ..Self::approving()
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::approving()
        }
    }

    pub fn owner_address(&self) -> String {
        self.keypair.pubkey().to_string()
    }
}

#[async_trait]
impl TransferSigner for MockSigner {
    fn connected_owner(&self) -> Option<Pubkey> {
        self.connected.then(|| self.keypair.pubkey())
    }

    async fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, TransferError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        if !self.connected {
            return Err(TransferError::signer_unavailable("no wallet session"));
        }
        if let Some(reason) = &self.rejection {
            return Err(TransferError::user_rejected(reason.clone()));
        }

        let TransactionEnvelope { mut tx, anchor } = envelope;
        tx.try_sign(&[&self.keypair], anchor.blockhash)
            .map_err(|e| TransferError::signer_unavailable(e.to_string()))?;
        Ok(SignedEnvelope { tx, anchor })
    }
}

/// Signer that parks inside the signing call until released, for exercising
/// the orchestrator's in-flight guard deterministically.
pub struct BlockingSigner {
    keypair: Keypair,
    entered: Mutex<Option<oneshot::Sender<()>>>,
    release: Mutex<Option<oneshot::Receiver<()>>>,
}

impl BlockingSigner {
    pub fn new(entered: oneshot::Sender<()>, release: oneshot::Receiver<()>) -> Self {
        Self {
            keypair: Keypair::new(),
            entered: Mutex::new(Some(entered)),
            release: Mutex::new(Some(release)),
        }
    }

    pub fn owner_address(&self) -> String {
        self.keypair.pubkey().to_string()
    }
}

#[async_trait]
impl TransferSigner for BlockingSigner {
    fn connected_owner(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    async fn sign_envelope(
        &self,
        envelope: TransactionEnvelope,
    ) -> Result<SignedEnvelope, TransferError> {
        if let Some(entered) = self.entered.lock().unwrap().take() {
            let _ = entered.send(());
        }

        let release = self.release.lock().unwrap().take();
        if let Some(release) = release {
            let _ = release.await;
        }

        let TransactionEnvelope { mut tx, anchor } = envelope;
        tx.try_sign(&[&self.keypair], anchor.blockhash)
            .map_err(|e| TransferError::signer_unavailable(e.to_string()))?;
        Ok(SignedEnvelope { tx, anchor })
    }
}

/// Build and sign an envelope against the mock ledger's anchor.
pub async fn signed_test_envelope(ledger: &Arc<MockLedger>) -> SignedEnvelope {
    let keypair = Keypair::new();
    let resolved = ResolvedTransfer {
        sender: keypair.pubkey(),
        recipient: Pubkey::new_unique(),
        mint: Pubkey::new_unique(),
        sender_token_account: Pubkey::new_unique(),
        recipient_token_account: Pubkey::new_unique(),
        recipient_account_missing: false,
    };
    let plan = plan_transfer_instructions(&resolved, 100, 9).unwrap();

    let builder = EnvelopeBuilder::new(ledger.clone() as Arc<dyn LedgerRpc>);
    let TransactionEnvelope { mut tx, anchor } =
        builder.build(&plan, &resolved.sender).await.unwrap();
    tx.try_sign(&[&keypair], anchor.blockhash).unwrap();

    SignedEnvelope { tx, anchor }
}
