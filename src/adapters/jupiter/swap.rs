//! Jupiter Swap Types
//!
//! Request and response structures for the swap endpoint, which turns a quote
//! into an unsigned serialized transaction.

use serde::{Deserialize, Serialize};

/// Request parameters for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTxRequest {
    /// User's public key (wallet address)
    pub user_public_key: String,
    /// The full quote response from the quote endpoint, echoed verbatim
    pub quote_response: serde_json::Value,
    /// Wrap/unwrap SOL automatically around the swap
    pub wrap_and_unwrap_sol: bool,
    /// Dynamic compute unit limit calculation
    pub dynamic_compute_unit_limit: bool,
    /// Optional prioritization fee in lamports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<u64>,
}

impl SwapTxRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            quote_response,
            wrap_and_unwrap_sol: true,
            dynamic_compute_unit_limit: true,
            prioritization_fee_lamports: None,
        }
    }

    pub fn with_priority_fee(mut self, lamports: u64) -> Self {
        self.prioritization_fee_lamports = Some(lamports);
        self
    }
}

/// Response from the swap endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTxResponse {
    /// Base64 encoded serialized versioned transaction, ready to sign
    pub swap_transaction: String,
    /// Last valid block height for this transaction
    pub last_valid_block_height: u64,
    /// Prioritization fee applied (in lamports)
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
}

impl SwapTxResponse {
    /// Decode the transaction bytes from base64
    pub fn transaction_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(&self.swap_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_request_serialization() {
        let quote = serde_json::json!({"inAmount": "1000000000"});
        let req = SwapTxRequest::new("wallet123".to_string(), quote).with_priority_fee(5000);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["userPublicKey"], "wallet123");
        assert_eq!(json["wrapAndUnwrapSol"], true);
        assert_eq!(json["dynamicComputeUnitLimit"], true);
        assert_eq!(json["prioritizationFeeLamports"], 5000);
    }

    #[test]
    fn test_priority_fee_omitted_by_default() {
        let req = SwapTxRequest::new("w".to_string(), serde_json::json!({}));
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("prioritizationFeeLamports").is_none());
    }

    #[test]
    fn test_swap_response_parsing() {
        let json = r#"{
            "swapTransaction": "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=",
            "lastValidBlockHeight": 123456789,
            "prioritizationFeeLamports": 5000
        }"#;

        let response: SwapTxResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.last_valid_block_height, 123456789);
        assert_eq!(response.prioritization_fee_lamports, 5000);
        assert!(response.transaction_bytes().is_ok());
    }
}
