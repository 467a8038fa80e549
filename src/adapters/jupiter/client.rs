//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap/v1 API. Quote and build calls are
//! idempotent, so transient failures (429/5xx/transport) are retried with
//! backoff; the broadcast step lives elsewhere and never retries here.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::quote::{QuoteRequest, QuoteResponse};
use super::swap::{SwapTxRequest, SwapTxResponse};
use crate::ports::chain::ChainError;

#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for the swap API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry attempts for transient failures
    pub max_retries: u32,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.jup.ag/swap/v1".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    pub fn new() -> Result<Self, ChainError> {
        Self::with_config(JupiterConfig::default())
    }

    pub fn with_config(config: JupiterConfig) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChainError::RpcUnavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn with_api_key(api_key: String) -> Result<Self, ChainError> {
        let config = JupiterConfig {
            api_key: Some(api_key),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ChainError> {
        let url = format!("{}/quote", self.config.api_base_url);
        let amount = request.amount.to_string();
        let slippage = request.slippage_bps.to_string();
        self.execute_with_retry("jupiter quote", || {
            let req = self.http.get(&url).query(&[
                ("inputMint", request.input_mint.as_str()),
                ("outputMint", request.output_mint.as_str()),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
            ]);
            self.with_auth(req)
        })
        .await
    }

    /// Build the unsigned swap transaction for a quote
    pub async fn build_swap_transaction(
        &self,
        request: &SwapTxRequest,
    ) -> Result<SwapTxResponse, ChainError> {
        let url = format!("{}/swap", self.config.api_base_url);
        self.execute_with_retry("jupiter swap", || {
            self.with_auth(self.http.post(&url).json(request))
        })
        .await
    }

    fn with_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    /// Send with bounded retries on rate limits, server errors and transport
    /// failures. 4xx other than 429 is a router rejection and surfaces
    /// immediately.
    async fn execute_with_retry<T, F>(
        &self,
        endpoint: &'static str,
        make_request: F,
    ) -> Result<T, ChainError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = ChainError::RpcUnavailable(format!("{endpoint}: no attempt made"));

        for attempt in 0..self.config.max_retries {
            match make_request().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.json::<T>().await.map_err(|e| {
                            ChainError::BadResponse {
                                endpoint,
                                detail: format!("failed to parse response: {e}"),
                            }
                        });
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                        warn!(
                            "{} rate limited (429), backing off {:?} (attempt {}/{})",
                            endpoint, backoff, attempt + 1, self.config.max_retries
                        );
                        last_error = ChainError::RpcUnavailable(format!("{endpoint}: rate limited"));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = ChainError::RpcUnavailable(format!(
                            "{endpoint}: server error {status}"
                        ));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                        continue;
                    }

                    // 4xx: the router refused the request, retrying won't help
                    let detail = response.text().await.unwrap_or_default();
                    return Err(ChainError::RouterError(format!(
                        "{endpoint} {status}: {detail}"
                    )));
                }
                Err(e) if e.is_timeout() => {
                    last_error = ChainError::NetworkTimeout(endpoint);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
                Err(e) => {
                    last_error = ChainError::RpcUnavailable(format!("{endpoint}: {e}"));
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error)
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = JupiterConfig::default();
        assert_eq!(config.api_base_url, "https://api.jup.ag/swap/v1");
        assert!(config.api_key.is_none());
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_client_creation() {
        assert!(JupiterClient::new().is_ok());
        assert!(JupiterClient::with_api_key("test-key".to_string()).is_ok());
    }
}
