//! Application Layer - Swap orchestration
//!
//! The quote router (provider fallback) and the swap executor (the
//! per-invocation state machine with per-wallet serialization).

pub mod executor;
pub mod quote_router;

pub use executor::{ExecutorConfig, SwapError, SwapExecutor, WalletLocks};
pub use quote_router::{QuoteError, QuoteRouter, DEFAULT_PROVIDER_TIMEOUT};
