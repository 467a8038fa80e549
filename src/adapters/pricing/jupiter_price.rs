//! Jupiter Price Provider
//!
//! price/v2 lookups with wSOL as the vs-token, so prices come back in SOL
//! per token. Instantiated twice in the fallback order: keyless first, then
//! an authenticated instance when an API key is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::adapters::jupiter::WSOL_MINT;
use crate::domain::{Chain, MarketSnapshot, Quote, SwapDirection};
use crate::ports::pricing::{PriceProvider, ProviderError, QuoteQuery};

#[derive(Debug, Clone)]
pub struct JupiterPriceConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for JupiterPriceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.jup.ag".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct JupiterPriceProvider {
    config: JupiterPriceConfig,
    http: Client,
    name: &'static str,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    data: HashMap<String, Option<PriceEntry>>,
}

#[derive(Debug, Deserialize)]
struct PriceEntry {
    /// Price as a decimal string, in units of the vs token
    price: String,
}

impl JupiterPriceProvider {
    pub fn new(config: JupiterPriceConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let name = if config.api_key.is_some() {
            "jupiter-price-auth"
        } else {
            "jupiter-price"
        };
        Ok(Self { config, http, name })
    }

    fn output_from_price(query: &QuoteQuery, price_in_sol: Decimal) -> Option<u64> {
        if price_in_sol <= Decimal::ZERO {
            return None;
        }
        let amount = Decimal::from(query.amount_raw);
        let output = match query.direction {
            SwapDirection::NativeToToken => amount.checked_div(price_in_sol)?,
            SwapDirection::TokenToNative => amount.checked_mul(price_in_sol)?,
        };
        output.to_u64().filter(|raw| *raw > 0)
    }
}

#[async_trait]
impl PriceProvider for JupiterPriceProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, chain: Chain) -> bool {
        chain == Chain::Solana
    }

    async fn try_quote(&self, query: &QuoteQuery) -> Result<Option<Quote>, ProviderError> {
        let url = format!("{}/price/v2", self.config.api_url);
        let mut req = self.http.get(&url).query(&[
            ("ids", query.counter_asset.as_str()),
            ("vsToken", WSOL_MINT),
        ]);
        if let Some(key) = &self.config.api_key {
            req = req.header("x-api-key", key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                provider: self.name,
                status: status.as_u16(),
            });
        }
        let body: PriceResponse = response.json().await.map_err(|e| ProviderError::Malformed {
            provider: self.name,
            detail: e.to_string(),
        })?;

        let Some(Some(entry)) = body.data.get(&query.counter_asset) else {
            return Ok(None);
        };
        let Ok(price) = entry.price.parse::<Decimal>() else {
            return Ok(None);
        };

        Ok(Self::output_from_price(query, price).map(|output_amount_raw| Quote {
            output_amount_raw,
            price_impact_pct: None,
            source: self.name,
            fetched_at: Utc::now(),
            market: MarketSnapshot::default(),
        }))
    }
}
