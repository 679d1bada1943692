//! Transfer orchestration
//!
//! Composes resolution, envelope building, signing and confirmation into
//! one request/response call. The orchestrator owns the request and its
//! envelope end-to-end, performs no automatic retries across stage
//! boundaries, and produces exactly one [`SettlementOutcome`] per call.
//! Each call builds a brand-new envelope; anchors and signatures are
//! single-use.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::observability::RequestId;
use crate::rpc::LedgerRpc;
use crate::transfer::builder::EnvelopeBuilder;
use crate::transfer::errors::TransferError;
use crate::transfer::instructions::plan_transfer_instructions;
use crate::transfer::monitor::ConfirmationMonitor;
use crate::transfer::resolver::AccountResolver;
use crate::transfer::signer::{SigningGateway, TransferSigner};
use crate::types::{to_raw_amount, SettlementOutcome, TransferRequest};

pub struct TransferOrchestrator {
    resolver: AccountResolver,
    builder: EnvelopeBuilder,
    gateway: SigningGateway,
    monitor: ConfirmationMonitor,

    /// Single-slot guard: at most one pending transfer per session
    in_flight: Mutex<()>,
}

impl TransferOrchestrator {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        signer: Arc<dyn TransferSigner>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            resolver: AccountResolver::new(rpc.clone()),
            builder: EnvelopeBuilder::new(rpc.clone()),
            gateway: SigningGateway::new(signer),
            monitor: ConfirmationMonitor::new(rpc, poll_interval, max_wait),
            in_flight: Mutex::new(()),
        }
    }

    /// Run one donation transfer to its terminal outcome.
    ///
    /// Pre-flight failures surface as errors at zero network cost; terminal
    /// pipeline results map onto the outcome variants. A second call while
    /// one is pending fails fast with [`TransferError::InFlight`].
    pub async fn execute(
        &self,
        request: TransferRequest,
    ) -> Result<SettlementOutcome, TransferError> {
        let _slot = self
            .in_flight
            .try_lock()
            .map_err(|_| TransferError::InFlight)?;

        let request_id = RequestId::new();
        info!(
            %request_id,
            token = %request.token.symbol,
            amount = %request.amount,
            recipient = %request.recipient_address,
            "starting donation transfer"
        );

        let raw_amount = self.preflight(&request)?;
        let resolved = self.resolver.resolve(&request).await?;
        let plan = plan_transfer_instructions(&resolved, raw_amount, request.token.decimals)?;
        debug!(
            %request_id,
            raw_amount,
            creates_destination = plan.creates_destination,
            "planned transfer instructions"
        );

        let envelope = self.builder.build(&plan, &resolved.sender).await?;

        let signed = match self.gateway.sign(envelope).await {
            Ok(signed) => signed,
            Err(TransferError::UserRejected { reason }) => {
                info!(%request_id, "user declined signing");
                return Ok(SettlementOutcome::Rejected { reason });
            }
            Err(e) => return Err(e),
        };

        let outcome = match self.monitor.submit_and_confirm(&signed).await {
            Ok(signature) => SettlementOutcome::Confirmed { signature },
            Err(TransferError::Ledger(ledger_error)) => SettlementOutcome::Failed { ledger_error },
            Err(TransferError::ConfirmationTimedOut { .. }) => SettlementOutcome::TimedOut,
            Err(e) => return Err(e),
        };

        info!(%request_id, outcome = outcome.label(), "donation transfer finished");
        Ok(outcome)
    }

    /// Validate request invariants before touching the network.
    fn preflight(&self, request: &TransferRequest) -> Result<u64, TransferError> {
        let owner = self
            .gateway
            .connected_owner()
            .ok_or_else(|| TransferError::signer_unavailable("no wallet session"))?;

        if !request.token.is_transferable() {
            return Err(TransferError::invalid_request(format!(
                "token '{}' is not transferable on this network",
                request.token.symbol
            )));
        }

        let raw_amount = to_raw_amount(request.amount, request.token.decimals)?;

        if request.sender_address != owner.to_string() {
            return Err(TransferError::invalid_request(
                "sender does not match the connected wallet",
            ));
        }

        Ok(raw_amount)
    }
}
