//! STON.fi Simulation Provider
//!
//! Last in the TON fallback order, and the most accurate: the DEX itself
//! simulates the exact swap and reports expected output and price impact.

use async_trait::async_trait;
use chrono::Utc;

use crate::adapters::stonfi::{StonfiClient, PTON_MAINNET};
use crate::domain::{Chain, MarketSnapshot, Quote, SwapDirection};
use crate::ports::pricing::{PriceProvider, ProviderError, QuoteQuery};

const PROVIDER_NAME: &str = "stonfi";

pub struct StonfiSimulateProvider {
    client: StonfiClient,
}

impl StonfiSimulateProvider {
    pub fn new(client: StonfiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceProvider for StonfiSimulateProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, chain: Chain) -> bool {
        chain == Chain::Ton
    }

    async fn try_quote(&self, query: &QuoteQuery) -> Result<Option<Quote>, ProviderError> {
        let (offer, ask) = match query.direction {
            SwapDirection::NativeToToken => (PTON_MAINNET, query.counter_asset.as_str()),
            SwapDirection::TokenToNative => (query.counter_asset.as_str(), PTON_MAINNET),
        };

        let simulation = self
            .client
            .simulate_swap(offer, ask, query.amount_raw, query.slippage_bps)
            .await
            .map_err(|e| ProviderError::Malformed {
                provider: PROVIDER_NAME,
                detail: e.to_string(),
            })?;

        let output_amount_raw = simulation.ask_units_raw();
        if output_amount_raw == 0 {
            return Ok(None);
        }

        Ok(Some(Quote {
            output_amount_raw,
            price_impact_pct: simulation.price_impact_pct(),
            source: PROVIDER_NAME,
            fetched_at: Utc::now(),
            market: MarketSnapshot::default(),
        }))
    }
}
