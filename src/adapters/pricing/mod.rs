//! Price Provider Adapters
//!
//! Implementations behind the quote router's fallback chains:
//! Solana: Dexscreener -> Jupiter price (free) -> Jupiter price (API key);
//! TON: Dexscreener -> TonAPI -> STON.fi simulate.

pub mod dexscreener;
pub mod jupiter_price;
pub mod stonfi_simulate;
pub mod tonapi;

pub use dexscreener::{DexscreenerConfig, DexscreenerProvider};
pub use jupiter_price::{JupiterPriceConfig, JupiterPriceProvider};
pub use stonfi_simulate::StonfiSimulateProvider;
pub use tonapi::{TonapiConfig, TonapiProvider};
