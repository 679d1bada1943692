//! Common types used throughout the donation pipeline

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;

use crate::transfer::errors::{LedgerError, TransferError};

/// A fungible token from the catalog collaborator.
///
/// Immutable once loaded. `mint_address` is the token's on-chain mint; a
/// missing or empty value means the token is not transferable on this
/// network and any request for it is rejected at pre-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Catalog identifier (e.g. "bonk")
    pub id: String,

    /// Ticker symbol (e.g. "BONK")
    pub symbol: String,

    /// Display name
    pub name: String,

    /// SPL mint address, if the token exists on this network
    #[serde(default)]
    pub mint_address: Option<String>,

    /// Number of base-unit decimals of the mint
    pub decimals: u8,
}

impl Token {
    /// The mint address, if the token is transferable on this network.
    pub fn mint(&self) -> Option<&str> {
        self.mint_address.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_transferable(&self) -> bool {
        self.mint().is_some()
    }
}

/// A single donation transfer request, created per user action.
///
/// The orchestrator owns the request and its resulting envelope end-to-end;
/// no other component retains references after returning control.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub token: Token,

    /// Human-entered amount in whole-token units (e.g. "1.5")
    pub amount: Decimal,

    /// Owner address the tokens move from; must match the connected wallet
    pub sender_address: String,

    /// Owner address the tokens move to
    pub recipient_address: String,
}

/// Convert a human-entered amount into the mint's base units.
///
/// `round(amount * 10^decimals)`, midpoints away from zero. Amounts that are
/// not strictly positive, round to zero base units, or do not fit the
/// ledger's u64 width are rejected rather than silently wrapped.
pub fn to_raw_amount(amount: Decimal, decimals: u8) -> Result<u64, TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::invalid_request("amount must be positive"));
    }

    let mut factor = Decimal::ONE;
    for _ in 0..decimals {
        factor = factor
            .checked_mul(Decimal::from(10u64))
            .ok_or_else(|| TransferError::invalid_request("token decimals out of range"))?;
    }

    let raw = amount
        .checked_mul(factor)
        .ok_or_else(|| {
            TransferError::invalid_request("amount exceeds the ledger's integer width")
        })?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    if raw.is_zero() {
        return Err(TransferError::invalid_request(
            "amount rounds to zero base units",
        ));
    }

    raw.to_u64().ok_or_else(|| {
        TransferError::invalid_request("amount exceeds the ledger's integer width")
    })
}

/// Terminal result of one orchestrated transfer, as observed by this core.
///
/// Exactly one outcome is produced per orchestrator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The transaction reached the required commitment level
    Confirmed { signature: Signature },

    /// The user declined signing; nothing was broadcast
    Rejected { reason: String },

    /// The node accepted the transaction but execution failed on the ledger
    Failed { ledger_error: LedgerError },

    /// The anchor's validity window elapsed without a terminal status.
    /// The transfer may still confirm; this is "unknown", not "failed".
    TimedOut,
}

impl SettlementOutcome {
    /// Stable label for logs and counters.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed { .. } => "confirmed",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for SettlementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed { signature } => write!(f, "confirmed ({signature})"),
            Self::Rejected { reason } => write!(f, "rejected by user ({reason})"),
            Self::Failed { ledger_error } => write!(f, "failed on ledger ({ledger_error})"),
            Self::TimedOut => write!(f, "status unknown; confirmation window elapsed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_raw_amount_scales_by_decimals() {
        let amount = Decimal::from_str("1.5").unwrap();
        assert_eq!(to_raw_amount(amount, 9).unwrap(), 1_500_000_000);

        let amount = Decimal::from_str("0.000001").unwrap();
        assert_eq!(to_raw_amount(amount, 6).unwrap(), 1);

        let amount = Decimal::from_str("42").unwrap();
        assert_eq!(to_raw_amount(amount, 0).unwrap(), 42);
    }

    #[test]
    fn test_raw_amount_rounds_midpoint_away_from_zero() {
        // 0.0000000015 * 10^9 = 1.5 -> 2
        let amount = Decimal::from_str("0.0000000015").unwrap();
        assert_eq!(to_raw_amount(amount, 9).unwrap(), 2);

        // 1.4 base units round down
        let amount = Decimal::from_str("0.0000000014").unwrap();
        assert_eq!(to_raw_amount(amount, 9).unwrap(), 1);
    }

    #[test]
    fn test_raw_amount_rejects_non_positive() {
        assert!(to_raw_amount(Decimal::ZERO, 9).is_err());
        assert!(to_raw_amount(Decimal::from_str("-1.5").unwrap(), 9).is_err());
    }

    #[test]
    fn test_raw_amount_rejects_zero_base_units() {
        // 0.1 base units round to zero
        let amount = Decimal::from_str("0.0000000001").unwrap();
        let err = to_raw_amount(amount, 9).unwrap_err();
        assert!(matches!(err, TransferError::InvalidRequest { .. }));
    }

    #[test]
    fn test_raw_amount_rejects_overflow() {
        // u64::MAX fits exactly at zero decimals; one more does not
        let max = Decimal::from(u64::MAX);
        assert_eq!(to_raw_amount(max, 0).unwrap(), u64::MAX);

        let over = max.checked_add(Decimal::ONE).unwrap();
        assert!(to_raw_amount(over, 0).is_err());

        // Scaling pushes a fitting amount past the width
        assert!(to_raw_amount(max, 9).is_err());
    }

    #[test]
    fn test_token_transferability() {
        let mut token = Token {
            id: "bonk".to_string(),
            symbol: "BONK".to_string(),
            name: "Bonk".to_string(),
            mint_address: Some("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string()),
            decimals: 5,
        };
        assert!(token.is_transferable());

        token.mint_address = Some(String::new());
        assert!(!token.is_transferable());

        token.mint_address = None;
        assert!(!token.is_transferable());
        assert_eq!(token.mint(), None);
    }

    proptest! {
        /// Exact base-unit amounts survive the human-amount round trip.
        #[test]
        fn prop_raw_amount_round_trips(units in 1u64..=u64::MAX / 1_000_000_000, decimals in 0u8..=9) {
            let human = Decimal::from_i128_with_scale(units as i128, decimals as u32);
            prop_assert_eq!(to_raw_amount(human, decimals).unwrap(), units);
        }

        /// The inverse conversion lands within one base unit of the input.
        #[test]
        fn prop_raw_amount_within_one_unit(numer in 1u64..=1_000_000_000_000u64, decimals in 0u8..=9) {
            // Arbitrary fractional amounts with more precision than the mint
            let human = Decimal::from_i128_with_scale(numer as i128, 12);
            match to_raw_amount(human, decimals) {
                Ok(raw) => {
                    let mut factor = Decimal::ONE;
                    for _ in 0..decimals {
                        factor *= Decimal::from(10u64);
                    }
                    let diff = (Decimal::from(raw) - human * factor).abs();
                    prop_assert!(diff <= Decimal::from_str("0.5").unwrap());
                }
                // Sub-half-unit amounts legitimately round to zero and are rejected
                Err(err) => {
                    prop_assert!(
                        matches!(err, TransferError::InvalidRequest { .. }),
                        "unexpected error: {}",
                        err
                    );
                }
            }
        }
    }
}
