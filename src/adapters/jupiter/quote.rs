//! Jupiter Quote Types
//!
//! Request and response structures for the swap/v1 quote endpoint. Amounts
//! come back as strings; helpers parse them into raw units.

use serde::{Deserialize, Serialize};

/// Wrapped SOL mint, the native side of every Solana pair we trade
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Request parameters for getting a swap quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
}

impl QuoteRequest {
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
        }
    }

    /// Quote for spending SOL into a token
    pub fn sol_to_token(token_mint: &str, lamports: u64, slippage_bps: u16) -> Self {
        Self::new(WSOL_MINT.to_string(), token_mint.to_string(), lamports, slippage_bps)
    }

    /// Quote for selling a token back into SOL
    pub fn token_to_sol(token_mint: &str, amount_raw: u64, slippage_bps: u16) -> Self {
        Self::new(token_mint.to_string(), WSOL_MINT.to_string(), amount_raw, slippage_bps)
    }
}

/// Response from the quote endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage
    pub other_amount_threshold: String,
    pub swap_mode: String,
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    /// Catch-all so the full quote can be echoed back to the swap endpoint
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

impl QuoteResponse {
    pub fn input_amount(&self) -> u64 {
        self.in_amount.parse().unwrap_or(0)
    }

    pub fn output_amount(&self) -> u64 {
        self.out_amount.parse().unwrap_or(0)
    }

    pub fn min_output_amount(&self) -> u64 {
        self.other_amount_threshold.parse().unwrap_or(0)
    }

    pub fn price_impact(&self) -> Option<f64> {
        self.price_impact_pct.parse().ok()
    }
}
