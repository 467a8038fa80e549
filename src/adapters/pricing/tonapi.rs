//! TonAPI Provider
//!
//! Jetton rates from TonAPI's /v2/rates endpoint, quoted against TON. Second
//! in the TON fallback order after Dexscreener.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{Chain, MarketSnapshot, Quote, SwapDirection};
use crate::ports::pricing::{PriceProvider, ProviderError, QuoteQuery};

const PROVIDER_NAME: &str = "tonapi";

#[derive(Debug, Clone)]
pub struct TonapiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for TonapiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://tonapi.io".to_string(),
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct TonapiProvider {
    config: TonapiConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: std::collections::HashMap<String, RateEntry>,
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    #[serde(default)]
    prices: std::collections::HashMap<String, f64>,
}

impl TonapiProvider {
    pub fn new(config: TonapiConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn output_from_price(query: &QuoteQuery, price_in_ton: f64) -> Option<u64> {
        let price = Decimal::from_f64(price_in_ton).filter(|p| *p > Decimal::ZERO)?;
        let amount = Decimal::from(query.amount_raw);
        let output = match query.direction {
            SwapDirection::NativeToToken => amount.checked_div(price)?,
            SwapDirection::TokenToNative => amount.checked_mul(price)?,
        };
        output.to_u64().filter(|raw| *raw > 0)
    }
}

#[async_trait]
impl PriceProvider for TonapiProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, chain: Chain) -> bool {
        chain == Chain::Ton
    }

    async fn try_quote(&self, query: &QuoteQuery) -> Result<Option<Quote>, ProviderError> {
        let url = format!("{}/v2/rates", self.config.api_url);
        let mut req = self.http.get(&url).query(&[
            ("tokens", query.counter_asset.as_str()),
            ("currencies", "ton"),
        ]);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
            });
        }
        let body: RatesResponse = response.json().await.map_err(|e| ProviderError::Malformed {
            provider: PROVIDER_NAME,
            detail: e.to_string(),
        })?;

        // TonAPI may key the response by the raw address form
        let entry = body
            .rates
            .get(&query.counter_asset)
            .or_else(|| body.rates.values().next());
        let Some(price) = entry.and_then(|e| e.prices.get("TON")).copied() else {
            return Ok(None);
        };

        Ok(Self::output_from_price(query, price).map(|output_amount_raw| Quote {
            output_amount_raw,
            price_impact_pct: None,
            source: PROVIDER_NAME,
            fetched_at: Utc::now(),
            market: MarketSnapshot::default(),
        }))
    }
}
