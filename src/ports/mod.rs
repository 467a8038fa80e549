//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Chain primitives (balance, transaction build/sign/submit)
//! - Price/quote providers (Dexscreener, Jupiter, TonAPI, STON.fi)
//! - Custodial secret decryption

pub mod chain;
pub mod mocks;
pub mod pricing;
pub mod secrets;

pub use chain::{
    ChainAdapter, ChainError, SignedSwapTx, SwapBuildParams, UnsignedPayload, UnsignedSwapTx,
};
pub use pricing::{approximate_price_impact_pct, PriceProvider, ProviderError, QuoteQuery};
pub use secrets::{AesGcmCodec, SecretCodec, SecretError, SecretMaterial, WalletHandle};
