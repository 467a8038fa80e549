//! Domain Layer - Core swap pipeline logic
//!
//! Pure types and arithmetic with no I/O: amount-unit conversion, swap
//! requests/results, the gas-reserve policy and post-trade balance
//! reconciliation. External interactions happen through the ports layer.

pub mod amounts;
pub mod reconcile;
pub mod reserve;
pub mod swap;

pub use amounts::{min_output_raw, to_human_unit, to_smallest_unit, AmountError};
pub use reconcile::{settle, Settlement};
pub use reserve::{check_funds, gas_reserve, Shortfall};
pub use swap::{
    Chain, InputError, MarketSnapshot, Quote, SwapDirection, SwapRequest, SwapResult, SwapStatus,
};
