//! Dexscreener Provider
//!
//! First provider in the fallback order for both chains. The token endpoint
//! lists every pair a token trades in; the deepest pool's native price drives
//! the output estimate, and its liquidity feeds the impact heuristic.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::domain::amounts::to_human_unit;
use crate::domain::{Chain, MarketSnapshot, Quote, SwapDirection};
use crate::ports::pricing::{
    approximate_price_impact_pct, PriceProvider, ProviderError, QuoteQuery,
};

const PROVIDER_NAME: &str = "dexscreener";

#[derive(Debug, Clone)]
pub struct DexscreenerConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for DexscreenerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.dexscreener.com".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

pub struct DexscreenerProvider {
    config: DexscreenerConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TokensResponse {
    #[serde(default)]
    pairs: Option<Vec<Pair>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pair {
    chain_id: String,
    /// Token price in the chain's native asset, as a decimal string
    #[serde(default)]
    price_native: String,
    #[serde(default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<Liquidity>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    fdv: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct Liquidity {
    #[serde(default)]
    usd: Option<f64>,
}

impl DexscreenerProvider {
    pub fn new(config: DexscreenerConfig) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn chain_id(chain: Chain) -> &'static str {
        match chain {
            Chain::Solana => "solana",
            Chain::Ton => "ton",
        }
    }
}

/// Pick the deepest same-chain pair and turn its native price into an output
/// estimate. Separated from the HTTP call so it can be tested directly.
fn quote_from_pairs(query: &QuoteQuery, pairs: &[Pair]) -> Option<Quote> {
    let chain_id = DexscreenerProvider::chain_id(query.chain);
    let best = pairs
        .iter()
        .filter(|p| p.chain_id == chain_id)
        .max_by(|a, b| {
            let la = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            let lb = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            la.total_cmp(&lb)
        })?;

    let price_native: Decimal = best.price_native.parse().ok()?;
    if price_native <= Decimal::ZERO {
        return None;
    }

    let amount = Decimal::from(query.amount_raw);
    let output = match query.direction {
        // Spending native: tokens out = native in / price
        SwapDirection::NativeToToken => amount.checked_div(price_native)?,
        // Selling tokens: native out = tokens in * price
        SwapDirection::TokenToNative => amount.checked_mul(price_native)?,
    };
    let output_amount_raw = output.to_u64()?;
    if output_amount_raw == 0 {
        return None;
    }

    let price_usd = best.price_usd.as_deref().and_then(|s| s.parse::<f64>().ok());
    let liquidity_usd = best.liquidity.as_ref().and_then(|l| l.usd);
    let amount_human = to_human_unit(query.amount_raw).to_f64().unwrap_or(0.0);
    let trade_usd = match (query.direction, price_usd) {
        // Native spend: token USD / token native price = native USD price
        (SwapDirection::NativeToToken, Some(usd)) => price_native
            .to_f64()
            .filter(|p| *p > 0.0)
            .map(|p| amount_human * (usd / p)),
        (SwapDirection::TokenToNative, Some(usd)) => Some(amount_human * usd),
        _ => None,
    };
    let price_impact_pct = match (trade_usd, liquidity_usd) {
        (Some(t), Some(l)) => approximate_price_impact_pct(t, l),
        _ => None,
    };

    Some(Quote {
        output_amount_raw,
        price_impact_pct,
        source: PROVIDER_NAME,
        fetched_at: Utc::now(),
        market: MarketSnapshot {
            price_usd,
            liquidity_usd,
            market_cap_usd: best.market_cap.or(best.fdv),
        },
    })
}

#[async_trait]
impl PriceProvider for DexscreenerProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn supports(&self, _chain: Chain) -> bool {
        true
    }

    async fn try_quote(&self, query: &QuoteQuery) -> Result<Option<Quote>, ProviderError> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.config.api_url, query.counter_asset
        );
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::BadStatus {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
            });
        }
        let body: TokensResponse = response.json().await.map_err(|e| ProviderError::Malformed {
            provider: PROVIDER_NAME,
            detail: e.to_string(),
        })?;

        let quote = quote_from_pairs(query, body.pairs.as_deref().unwrap_or_default());
        debug!(
            token = %query.counter_asset,
            found = quote.is_some(),
            "dexscreener quote lookup"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::test_query;

    fn pair(chain_id: &str, price_native: &str, liquidity_usd: f64) -> Pair {
        Pair {
            chain_id: chain_id.to_string(),
            price_native: price_native.to_string(),
            price_usd: Some("1.5".to_string()),
            liquidity: Some(Liquidity {
                usd: Some(liquidity_usd),
            }),
            market_cap: Some(138_500.0),
            fdv: None,
        }
    }

    #[test]
    fn test_buy_quote_from_native_price() {
        // Token costs 0.001 SOL: 1 SOL buys 1000 tokens
        let query = test_query(Chain::Solana, 1_000_000_000);
        let quote = quote_from_pairs(&query, &[pair("solana", "0.001", 20_400.0)]).unwrap();
        assert_eq!(quote.output_amount_raw, 1_000_000_000_000);
        assert_eq!(quote.source, "dexscreener");
        assert_eq!(quote.market.liquidity_usd, Some(20_400.0));
    }

    #[test]
    fn test_sell_quote_multiplies() {
        let mut query = test_query(Chain::Solana, 2_000_000_000);
        query.direction = SwapDirection::TokenToNative;
        let quote = quote_from_pairs(&query, &[pair("solana", "0.5", 50_000.0)]).unwrap();
        assert_eq!(quote.output_amount_raw, 1_000_000_000);
    }

    #[test]
    fn test_deepest_pool_wins() {
        let query = test_query(Chain::Solana, 1_000_000_000);
        let shallow = pair("solana", "0.01", 1_000.0);
        let deep = pair("solana", "0.001", 90_000.0);
        let quote = quote_from_pairs(&query, &[shallow, deep]).unwrap();
        // Priced from the deep pool
        assert_eq!(quote.output_amount_raw, 1_000_000_000_000);
    }

    #[test]
    fn test_other_chain_pairs_ignored() {
        let query = test_query(Chain::Ton, 1_000_000_000);
        assert!(quote_from_pairs(&query, &[pair("solana", "0.001", 9_000.0)]).is_none());
    }

    #[test]
    fn test_zero_price_is_no_data() {
        let query = test_query(Chain::Solana, 1_000_000_000);
        assert!(quote_from_pairs(&query, &[pair("solana", "0", 9_000.0)]).is_none());
        assert!(quote_from_pairs(&query, &[pair("solana", "garbage", 9_000.0)]).is_none());
        assert!(quote_from_pairs(&query, &[]).is_none());
    }

    #[test]
    fn test_impact_present_when_liquidity_known() {
        let query = test_query(Chain::Solana, 1_000_000_000);
        let quote = quote_from_pairs(&query, &[pair("solana", "0.001", 20_400.0)]).unwrap();
        let impact = quote.price_impact_pct.unwrap();
        assert!(impact > 0.0 && impact <= 100.0);
    }

    #[test]
    fn test_response_parsing_tolerates_nulls() {
        let body: TokensResponse = serde_json::from_str(r#"{"pairs": null}"#).unwrap();
        assert!(body.pairs.is_none());

        let body: TokensResponse = serde_json::from_str(
            r#"{"pairs": [{"chainId": "ton", "priceNative": "0.8"}]}"#,
        )
        .unwrap();
        assert_eq!(body.pairs.unwrap().len(), 1);
    }
}
