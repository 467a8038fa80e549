//! Swap Types
//!
//! Chain identifiers, swap requests, quotes and results shared across the
//! pipeline. Requests carry human-unit amounts; everything downstream of
//! validation works in smallest units.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::amounts::BPS_DENOMINATOR;

/// Supported chains. Both use 9-decimal native assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Ton,
}

impl Chain {
    /// Native asset ticker for display
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Solana => "SOL",
            Chain::Ton => "TON",
        }
    }

    /// Block explorer URL for a transaction id
    pub fn explorer_tx_url(&self, tx_id: &str) -> String {
        match self {
            Chain::Solana => format!("https://solscan.io/tx/{}", tx_id),
            Chain::Ton => format!("https://tonviewer.com/transaction/{}", tx_id),
        }
    }

    /// Guess the chain from a token address shape.
    ///
    /// TON jetton masters are 48 characters and start with "EQ"/"UQ"; Solana
    /// mints are 32-44 character Base58 strings. Returns `None` when neither
    /// shape matches; callers must still run the adapter's full validation.
    pub fn detect(address: &str) -> Option<Chain> {
        if address.len() == 48 && (address.starts_with("EQ") || address.starts_with("UQ")) {
            Some(Chain::Ton)
        } else if (32..=44).contains(&address.len())
            && bs58::decode(address).into_vec().is_ok()
        {
            Some(Chain::Solana)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Solana => write!(f, "solana"),
            Chain::Ton => write!(f, "ton"),
        }
    }
}

/// Direction of a swap relative to the chain's native asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Spend native (SOL/TON), receive the counter asset
    NativeToToken,
    /// Spend the counter asset, receive native
    TokenToNative,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("slippage {0} bps out of range (0-10000)")]
    SlippageOutOfRange(u16),

    #[error("invalid {chain} address: {address}")]
    InvalidAddress { chain: Chain, address: String },

    #[error("amount {0} is not representable in smallest units")]
    UnrepresentableAmount(Decimal),
}

/// One user-initiated swap. Constructed per action, discarded after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequest {
    pub chain: Chain,
    pub direction: SwapDirection,
    /// Token mint (Solana) or jetton master (TON) on the non-native side
    pub counter_asset: String,
    /// Human units of the asset being spent
    pub amount: Decimal,
    /// Slippage tolerance in basis points (1 bps = 0.01%)
    pub slippage_bps: u16,
}

impl SwapRequest {
    /// Local field checks. Runs before any network call; address validation is
    /// the chain adapter's job and happens in the executor.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.amount <= Decimal::ZERO {
            return Err(InputError::NonPositiveAmount(self.amount));
        }
        if self.slippage_bps as u64 > BPS_DENOMINATOR {
            return Err(InputError::SlippageOutOfRange(self.slippage_bps));
        }
        Ok(())
    }
}

/// Market metadata a price provider may attach to a quote. Display-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price_usd: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
}

/// A provider's output estimate for one swap. Ephemeral: fetched fresh per
/// request, never cached or persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    /// Estimated output in smallest units of the receiving asset
    pub output_amount_raw: u64,
    /// Estimated price impact percentage (0-100), if known
    pub price_impact_pct: Option<f64>,
    /// Provider that produced the quote
    pub source: &'static str,
    pub fetched_at: DateTime<Utc>,
    pub market: MarketSnapshot,
}

/// Outcome of the broadcast step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Broadcast acknowledged and the balance delta was observed
    Confirmed,
    /// Broadcast outcome ambiguous (e.g. RPC timeout after send); resolve by
    /// querying status with the submission reference — never re-broadcast
    Unknown,
}

/// Result of a submitted swap. Created only after broadcast; persistence is
/// the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResult {
    pub chain: Chain,
    pub direction: SwapDirection,
    /// Transaction signature (Solana) or external-message hash (TON)
    pub tx_id: String,
    /// Client-generated submission reference, recorded before broadcast
    pub reference: String,
    pub status: SwapStatus,
    /// Quoted output in smallest units of the receiving asset
    pub output_amount_raw: Option<u64>,
    /// Native units consumed by fees (buys), when reconciliation could tell
    pub gas_consumed_raw: Option<u64>,
    /// Net native received (sells), after fees
    pub native_received_raw: Option<u64>,
}

impl SwapResult {
    pub fn explorer_url(&self) -> String {
        self.chain.explorer_tx_url(&self.tx_id)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == SwapStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, slippage_bps: u16) -> SwapRequest {
        SwapRequest {
            chain: Chain::Solana,
            direction: SwapDirection::NativeToToken,
            counter_asset: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            amount,
            slippage_bps,
        }
    }

    #[test]
    fn test_validate_accepts_sane_request() {
        assert!(request(dec!(0.5), 50).validate().is_ok());
        assert!(request(dec!(1), 0).validate().is_ok());
        assert!(request(dec!(1), 10_000).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        assert!(matches!(
            request(dec!(0), 50).validate(),
            Err(InputError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_validate_rejects_excess_slippage() {
        assert!(matches!(
            request(dec!(1), 10_001).validate(),
            Err(InputError::SlippageOutOfRange(10_001))
        ));
    }

    #[test]
    fn test_detect_ton_address() {
        let addr = "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs";
        assert_eq!(addr.len(), 48);
        assert_eq!(Chain::detect(addr), Some(Chain::Ton));
        let uq = "UQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs";
        assert_eq!(Chain::detect(uq), Some(Chain::Ton));
    }

    #[test]
    fn test_detect_solana_address() {
        assert_eq!(
            Chain::detect("So11111111111111111111111111111111111111112"),
            Some(Chain::Solana)
        );
    }

    #[test]
    fn test_detect_rejects_garbage() {
        assert_eq!(Chain::detect(""), None);
        assert_eq!(Chain::detect("0xdeadbeef"), None);
        assert_eq!(Chain::detect("not an address at all, far too long to be base58"), None);
    }

    #[test]
    fn test_explorer_urls() {
        assert_eq!(
            Chain::Solana.explorer_tx_url("abc"),
            "https://solscan.io/tx/abc"
        );
        assert_eq!(
            Chain::Ton.explorer_tx_url("def"),
            "https://tonviewer.com/transaction/def"
        );
    }
}
