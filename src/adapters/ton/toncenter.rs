//! TON RPC Client
//!
//! Balance, wallet seqno and message broadcast over toncenter's JSON API,
//! plus jetton-wallet resolution through TonAPI. Balance reads walk a
//! failover endpoint list; sendBoc goes to the primary only.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::address::TonAddress;
use crate::ports::chain::ChainError;

#[derive(Debug, Clone)]
pub struct TonClientConfig {
    /// toncenter-compatible API endpoints, primary first
    pub endpoints: Vec<String>,
    /// TonAPI base URL (jetton wallet resolution)
    pub tonapi_url: String,
    /// API key sent as X-API-Key to toncenter
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for TonClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["https://toncenter.com/api/v2".to_string()],
            tonapi_url: "https://tonapi.io".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct TonClient {
    config: TonClientConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ToncenterEnvelope {
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl TonClient {
    pub fn new(config: TonClientConfig) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChainError::RpcUnavailable(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Native balance in nanoTON, walking the failover list
    pub async fn get_balance(&self, address: &str) -> Result<u64, ChainError> {
        let mut last_error = String::from("no TON endpoints configured");
        for endpoint in &self.config.endpoints {
            match self.balance_from(endpoint, address).await {
                Ok(balance) => return Ok(balance),
                Err(ChainError::InvalidAddress { chain, address }) => {
                    return Err(ChainError::InvalidAddress { chain, address })
                }
                Err(e) => {
                    warn!("TON balance query failed on {}: {}", endpoint, e);
                    last_error = e.to_string();
                }
            }
        }
        Err(ChainError::RpcUnavailable(last_error))
    }

    async fn balance_from(&self, endpoint: &str, address: &str) -> Result<u64, ChainError> {
        let url = format!("{endpoint}/getAddressInformation");
        let result = self
            .call_toncenter_get(&url, &[("address", address)], "getAddressInformation")
            .await?;

        let balance = &result["balance"];
        let raw = balance
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .or_else(|| balance.as_u64())
            .ok_or_else(|| ChainError::BadResponse {
                endpoint: "getAddressInformation",
                detail: format!("unparseable balance: {balance}"),
            })?;
        Ok(raw)
    }

    /// Current seqno of a deployed wallet contract
    pub async fn get_seqno(&self, address: &str) -> Result<u32, ChainError> {
        let endpoint = self.primary()?;
        let url = format!("{endpoint}/runGetMethod");
        let body = json!({
            "address": address,
            "method": "seqno",
            "stack": [],
        });
        let result = self.call_toncenter_post(&url, &body, "runGetMethod").await?;

        let exit_code = result["exit_code"].as_i64().unwrap_or(-1);
        if exit_code != 0 {
            return Err(ChainError::BadResponse {
                endpoint: "runGetMethod",
                detail: format!("seqno get-method exit code {exit_code} (wallet not deployed?)"),
            });
        }
        let hex = result["stack"][0][1].as_str().ok_or_else(|| ChainError::BadResponse {
            endpoint: "runGetMethod",
            detail: "missing seqno stack entry".to_string(),
        })?;
        u32::from_str_radix(hex.trim_start_matches("0x"), 16).map_err(|_| {
            ChainError::BadResponse {
                endpoint: "runGetMethod",
                detail: format!("unparseable seqno: {hex}"),
            }
        })
    }

    /// Broadcast a serialized external message. One endpoint, one attempt.
    pub async fn send_boc(&self, boc: &[u8]) -> Result<(), ChainError> {
        let endpoint = self.primary()?;
        let url = format!("{endpoint}/sendBoc");
        let body = json!({
            "boc": base64::engine::general_purpose::STANDARD.encode(boc),
        });
        self.call_toncenter_post(&url, &body, "sendBoc").await?;
        info!("TON external message broadcast accepted");
        Ok(())
    }

    /// Resolve the jetton-wallet address `owner` holds for `jetton_master`
    pub async fn get_jetton_wallet(
        &self,
        jetton_master: &str,
        owner: &str,
    ) -> Result<TonAddress, ChainError> {
        let url = format!(
            "{}/v2/blockchain/accounts/{}/methods/get_wallet_address",
            self.config.tonapi_url, jetton_master
        );
        let response = self
            .http
            .get(&url)
            .query(&[("args", owner)])
            .send()
            .await
            .map_err(|e| map_transport_error(e, "get_wallet_address"))?;

        if !response.status().is_success() {
            return Err(ChainError::RouterError(format!(
                "get_wallet_address {}: jetton {jetton_master}",
                response.status()
            )));
        }
        let body: serde_json::Value =
            response.json().await.map_err(|e| ChainError::BadResponse {
                endpoint: "get_wallet_address",
                detail: e.to_string(),
            })?;
        let raw = body["decoded"]["jetton_wallet_address"]
            .as_str()
            .ok_or_else(|| ChainError::BadResponse {
                endpoint: "get_wallet_address",
                detail: "missing jetton_wallet_address".to_string(),
            })?;
        TonAddress::parse(raw).map_err(|_| ChainError::BadResponse {
            endpoint: "get_wallet_address",
            detail: format!("unparseable jetton wallet address: {raw}"),
        })
    }

    fn primary(&self) -> Result<&str, ChainError> {
        self.config
            .endpoints
            .first()
            .map(String::as_str)
            .ok_or_else(|| ChainError::RpcUnavailable("no TON endpoints configured".to_string()))
    }

    async fn call_toncenter_get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        endpoint_name: &'static str,
    ) -> Result<serde_json::Value, ChainError> {
        let mut req = self.http.get(url).query(query);
        if let Some(key) = &self.config.api_key {
            req = req.header("X-API-Key", key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| map_transport_error(e, endpoint_name))?;
        Self::unwrap_envelope(response, endpoint_name).await
    }

    async fn call_toncenter_post(
        &self,
        url: &str,
        body: &serde_json::Value,
        endpoint_name: &'static str,
    ) -> Result<serde_json::Value, ChainError> {
        let mut req = self.http.post(url).json(body);
        if let Some(key) = &self.config.api_key {
            req = req.header("X-API-Key", key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| map_transport_error(e, endpoint_name))?;
        Self::unwrap_envelope(response, endpoint_name).await
    }

    async fn unwrap_envelope(
        response: reqwest::Response,
        endpoint_name: &'static str,
    ) -> Result<serde_json::Value, ChainError> {
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            // toncenter reports rejected messages as 500 with a reason
            if endpoint_name == "sendBoc" {
                return Err(ChainError::SubmissionFailed(format!("{status}: {detail}")));
            }
            return Err(ChainError::RpcUnavailable(format!(
                "{endpoint_name} {status}: {detail}"
            )));
        }
        let envelope: ToncenterEnvelope =
            response.json().await.map_err(|e| ChainError::BadResponse {
                endpoint: endpoint_name,
                detail: e.to_string(),
            })?;
        if !envelope.ok {
            let detail = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            if endpoint_name == "sendBoc" {
                return Err(ChainError::SubmissionFailed(detail));
            }
            return Err(ChainError::BadResponse {
                endpoint: endpoint_name,
                detail,
            });
        }
        Ok(envelope.result)
    }
}

fn map_transport_error(err: reqwest::Error, endpoint: &'static str) -> ChainError {
    if err.is_timeout() {
        ChainError::NetworkTimeout(endpoint)
    } else {
        ChainError::RpcUnavailable(format!("{endpoint}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = TonClientConfig::default();
        assert_eq!(config.endpoints.len(), 1);
        assert!(config.endpoints[0].contains("toncenter.com"));
    }

    #[test]
    fn test_client_construction() {
        assert!(TonClient::new(TonClientConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_no_endpoints_is_unavailable() {
        let client = TonClient::new(TonClientConfig {
            endpoints: vec![],
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            client.get_balance("EQAAAA").await,
            Err(ChainError::RpcUnavailable(_))
        ));
        assert!(matches!(
            client.send_boc(&[0xb5]).await,
            Err(ChainError::RpcUnavailable(_))
        ));
    }

    #[test]
    fn test_envelope_parsing() {
        let ok: ToncenterEnvelope =
            serde_json::from_str(r#"{"ok": true, "result": {"balance": "123"}}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.result["balance"], "123");

        let err: ToncenterEnvelope =
            serde_json::from_str(r#"{"ok": false, "error": "LITE_SERVER_UNKNOWN"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("LITE_SERVER_UNKNOWN"));
    }
}
