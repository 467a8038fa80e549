//! Quote Router
//!
//! Walks the configured providers in priority order with a short per-provider
//! timeout and keeps the first well-formed, non-zero quote. Providers hold no
//! state between calls, so quoting is idempotent and never cached: prices
//! move, and a stale quote would bypass the slippage check.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Chain, Quote};
use crate::ports::pricing::{PriceProvider, QuoteQuery};

/// Reference timeout per provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("no liquidity data for {asset} on {chain} (providers tried: {tried})")]
    NoLiquidityData {
        chain: Chain,
        asset: String,
        tried: String,
    },
}

pub struct QuoteRouter {
    providers: Vec<Arc<dyn PriceProvider>>,
    provider_timeout: Duration,
}

impl QuoteRouter {
    /// Provider order is the fallback priority
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self {
            providers,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// First usable quote wins; remaining providers are skipped. Fails with
    /// `NoLiquidityData` only — transport/provider errors fall through to the
    /// next provider rather than aborting the swap pipeline.
    pub async fn quote(&self, query: &QuoteQuery) -> Result<Quote, QuoteError> {
        let mut tried = Vec::new();

        for provider in self.providers.iter().filter(|p| p.supports(query.chain)) {
            let name = provider.name();
            tried.push(name);

            match tokio::time::timeout(self.provider_timeout, provider.try_quote(query)).await {
                Ok(Ok(Some(quote))) if quote.output_amount_raw > 0 => {
                    info!(
                        provider = name,
                        output_raw = quote.output_amount_raw,
                        impact = ?quote.price_impact_pct,
                        "quote obtained"
                    );
                    return Ok(quote);
                }
                Ok(Ok(Some(_))) => {
                    warn!(provider = name, "provider returned a zero quote, skipping");
                }
                Ok(Ok(None)) => {
                    debug!(provider = name, "provider has no data for this pair");
                }
                Ok(Err(e)) => {
                    warn!(provider = name, error = %e, "provider failed, falling through");
                }
                Err(_) => {
                    warn!(
                        provider = name,
                        timeout_ms = self.provider_timeout.as_millis() as u64,
                        "provider timed out, falling through"
                    );
                }
            }
        }

        Err(QuoteError::NoLiquidityData {
            chain: query.chain,
            asset: query.counter_asset.clone(),
            tried: tried.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{test_query, test_quote, MockPriceProvider};

    fn router(providers: Vec<Arc<MockPriceProvider>>) -> QuoteRouter {
        QuoteRouter::new(
            providers
                .into_iter()
                .map(|p| p as Arc<dyn PriceProvider>)
                .collect(),
        )
        .with_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_first_provider_wins_and_rest_skipped() {
        let first = Arc::new(MockPriceProvider::new("first").with_quote(test_quote("first", 100)));
        let second =
            Arc::new(MockPriceProvider::new("second").with_quote(test_quote("second", 200)));

        let r = router(vec![first.clone(), second.clone()]);
        let quote = r.quote(&test_query(Chain::Solana, 1_000)).await.unwrap();

        assert_eq!(quote.source, "first");
        assert_eq!(quote.output_amount_raw, 100);
        assert_eq!(first.call_count(), 1);
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_errors_and_empty_answers() {
        let failing = Arc::new(MockPriceProvider::new("failing").with_error("http 500"));
        let empty = Arc::new(MockPriceProvider::new("empty").with_no_data());
        let good = Arc::new(MockPriceProvider::new("good").with_quote(test_quote("good", 42)));

        let r = router(vec![failing.clone(), empty.clone(), good.clone()]);
        let quote = r.quote(&test_query(Chain::Solana, 1_000)).await.unwrap();

        assert_eq!(quote.source, "good");
        assert_eq!(failing.call_count(), 1);
        assert_eq!(empty.call_count(), 1);
        assert_eq!(good.call_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_quote_is_not_usable() {
        let zero = Arc::new(MockPriceProvider::new("zero").with_quote(test_quote("zero", 0)));
        let good = Arc::new(MockPriceProvider::new("good").with_quote(test_quote("good", 7)));

        let r = router(vec![zero, good]);
        let quote = r.quote(&test_query(Chain::Solana, 1_000)).await.unwrap();
        assert_eq!(quote.output_amount_raw, 7);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let slow = Arc::new(
            MockPriceProvider::new("slow")
                .with_quote(test_quote("slow", 999))
                .with_delay(Duration::from_secs(5)),
        );
        let fast = Arc::new(MockPriceProvider::new("fast").with_quote(test_quote("fast", 1)));

        let r = router(vec![slow, fast]);
        let quote = r.quote(&test_query(Chain::Solana, 1_000)).await.unwrap();
        assert_eq!(quote.source, "fast");
    }

    #[tokio::test]
    async fn test_unsupported_chain_providers_filtered() {
        let solana_only = Arc::new(
            MockPriceProvider::new("solana-only")
                .for_chain(Chain::Solana)
                .with_quote(test_quote("solana-only", 5)),
        );
        let ton_only = Arc::new(
            MockPriceProvider::new("ton-only")
                .for_chain(Chain::Ton)
                .with_quote(test_quote("ton-only", 9)),
        );

        let r = router(vec![solana_only.clone(), ton_only.clone()]);
        let quote = r.quote(&test_query(Chain::Ton, 1_000)).await.unwrap();

        assert_eq!(quote.source, "ton-only");
        assert_eq!(solana_only.call_count(), 0);
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_no_liquidity() {
        let a = Arc::new(MockPriceProvider::new("a").with_error("500"));
        let b = Arc::new(MockPriceProvider::new("b").with_error("500"));
        let c = Arc::new(MockPriceProvider::new("c").with_error("500"));

        let r = router(vec![a, b, c]);
        let err = r.quote(&test_query(Chain::Ton, 1_000)).await.unwrap_err();
        let QuoteError::NoLiquidityData { tried, .. } = err;
        assert_eq!(tried, "a, b, c");
    }

    #[tokio::test]
    async fn test_identical_queries_identical_quotes() {
        let provider =
            Arc::new(MockPriceProvider::new("static").with_quote(test_quote("static", 123_456)));
        let r = router(vec![provider]);

        let query = test_query(Chain::Solana, 1_000_000_000);
        let q1 = r.quote(&query).await.unwrap();
        let q2 = r.quote(&query).await.unwrap();
        assert_eq!(q1.output_amount_raw, q2.output_amount_raw);
    }
}
