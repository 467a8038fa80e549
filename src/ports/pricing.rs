//! Price Provider Port
//!
//! One interface over the external price/quote sources. The quote router
//! walks an ordered list of these and keeps the first usable answer, which
//! replaces a try/except chain per provider with something testable.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Chain, Quote, SwapDirection};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    BadStatus { provider: &'static str, status: u16 },

    #[error("{provider} response malformed: {detail}")]
    Malformed {
        provider: &'static str,
        detail: String,
    },
}

/// What the router asks a provider: estimate the output for spending
/// `amount_raw` (smallest units) of one side of the pair.
#[derive(Debug, Clone)]
pub struct QuoteQuery {
    pub chain: Chain,
    pub direction: SwapDirection,
    /// Token mint / jetton master on the non-native side
    pub counter_asset: String,
    /// Amount being spent, smallest units
    pub amount_raw: u64,
    pub slippage_bps: u16,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Stable name used in logs and `Quote::source`
    fn name(&self) -> &'static str;

    fn supports(&self, chain: Chain) -> bool;

    /// Attempt a quote. `Ok(None)` means the provider answered but has no
    /// usable data for this pair (delisted, zero price); the router treats it
    /// the same as an error and falls through.
    async fn try_quote(&self, query: &QuoteQuery) -> Result<Option<Quote>, ProviderError>;
}

/// Constant-product style price-impact approximation:
/// `trade_usd / (liquidity_usd + trade_usd) * 100`, capped at 100%.
///
/// Used when the provider does not report impact directly. Display/warning
/// only — slippage enforcement uses the quoted amounts.
pub fn approximate_price_impact_pct(trade_usd: f64, liquidity_usd: f64) -> Option<f64> {
    if !trade_usd.is_finite() || !liquidity_usd.is_finite() {
        return None;
    }
    if trade_usd <= 0.0 || liquidity_usd < 0.0 {
        return None;
    }
    let impact = trade_usd / (liquidity_usd + trade_usd) * 100.0;
    Some(impact.min(100.0))
}
