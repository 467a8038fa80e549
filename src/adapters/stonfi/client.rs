//! STON.fi API Client
//!
//! `/v1/swap/simulate` drives both quoting (expected/minimum output) and the
//! build step (which router instance will execute the swap).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::ports::chain::ChainError;

/// Proxy-TON master used as the native side of STON.fi v2 pairs
pub const PTON_MAINNET: &str = "EQBnGWMCf3-FZZq1W4IWcWiGAc3PHuZ0_H-7sad2oY00o83S";

#[derive(Debug, Clone)]
pub struct StonfiConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for StonfiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.ston.fi".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct StonfiClient {
    config: StonfiConfig,
    http: Client,
}

/// Response of /v1/swap/simulate (amounts as decimal strings)
#[derive(Debug, Clone, Deserialize)]
pub struct SwapSimulation {
    pub router_address: String,
    #[serde(default)]
    pub offer_units: String,
    #[serde(default)]
    pub ask_units: String,
    #[serde(default)]
    pub min_ask_units: String,
    /// Price impact as a fraction (0.01 = 1%)
    #[serde(default)]
    pub price_impact: Option<String>,
    #[serde(default)]
    pub swap_rate: Option<String>,
}

impl SwapSimulation {
    pub fn ask_units_raw(&self) -> u64 {
        self.ask_units.parse().unwrap_or(0)
    }

    pub fn min_ask_units_raw(&self) -> u64 {
        self.min_ask_units.parse().unwrap_or(0)
    }

    pub fn price_impact_pct(&self) -> Option<f64> {
        self.price_impact
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .map(|fraction| (fraction * 100.0).clamp(0.0, 100.0))
    }
}

impl StonfiClient {
    pub fn new(config: StonfiConfig) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChainError::RpcUnavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Simulate a swap of `units` (smallest units) of `offer_address` into
    /// `ask_address` on the v2 DEX.
    pub async fn simulate_swap(
        &self,
        offer_address: &str,
        ask_address: &str,
        units: u64,
        slippage_bps: u16,
    ) -> Result<SwapSimulation, ChainError> {
        let url = format!("{}/v1/swap/simulate", self.config.api_url);
        // The API takes slippage as a percentage figure
        let slippage_tolerance = format!("{}", slippage_bps as f64 / 100.0);
        let units = units.to_string();

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .query(&[
                ("offer_address", offer_address),
                ("ask_address", ask_address),
                ("units", units.as_str()),
                ("slippage_tolerance", slippage_tolerance.as_str()),
                ("dex_v2", "true"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::NetworkTimeout("stonfi simulate")
                } else {
                    ChainError::RpcUnavailable(format!("stonfi simulate: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChainError::RouterError(format!(
                "stonfi simulate {status}: {detail}"
            )));
        }

        let simulation: SwapSimulation =
            response.json().await.map_err(|e| ChainError::BadResponse {
                endpoint: "stonfi simulate",
                detail: e.to_string(),
            })?;
        if simulation.router_address.is_empty() {
            return Err(ChainError::BadResponse {
                endpoint: "stonfi simulate",
                detail: "router address missing from simulation".to_string(),
            });
        }
        debug!(
            router = %simulation.router_address,
            ask_units = %simulation.ask_units,
            min_ask_units = %simulation.min_ask_units,
            "stonfi swap simulation"
        );
        Ok(simulation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_parsing() {
        let json = r#"{
            "offer_address": "EQBnGWMCf3-FZZq1W4IWcWiGAc3PHuZ0_H-7sad2oY00o83S",
            "ask_address": "EQA2kCVNwVsil2EM2mB0SkXytxCqQjS4mttjDpnXmwG9T6bO",
            "router_address": "EQCS4UEa5UaJLzOyyKieqQOQ2P9M-7kXpkO5HnP3Bv250cN3",
            "offer_units": "1000000000",
            "ask_units": "987654321",
            "min_ask_units": "938271604",
            "swap_rate": "0.987654",
            "price_impact": "0.0042"
        }"#;

        let sim: SwapSimulation = serde_json::from_str(json).unwrap();
        assert_eq!(sim.ask_units_raw(), 987_654_321);
        assert_eq!(sim.min_ask_units_raw(), 938_271_604);
        assert!((sim.price_impact_pct().unwrap() - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_simulation_without_impact() {
        let json = r#"{"router_address": "EQCS4UEa5UaJLzOyyKieqQOQ2P9M-7kXpkO5HnP3Bv250cN3"}"#;
        let sim: SwapSimulation = serde_json::from_str(json).unwrap();
        assert_eq!(sim.price_impact_pct(), None);
        assert_eq!(sim.ask_units_raw(), 0);
    }

    #[test]
    fn test_client_construction() {
        assert!(StonfiClient::new(StonfiConfig::default()).is_ok());
    }
}
