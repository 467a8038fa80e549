//! Jupiter Adapter
//!
//! HTTP client for the Jupiter DEX aggregator swap/v1 API: quote fetching and
//! swap-transaction building. The Solana chain adapter drives it during the
//! build step.

mod client;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig};
pub use quote::{QuoteRequest, QuoteResponse, WSOL_MINT};
pub use swap::{SwapTxRequest, SwapTxResponse};
