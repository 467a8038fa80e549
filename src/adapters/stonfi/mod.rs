//! STON.fi Adapter
//!
//! Swap simulation client and router v2 message payloads for the TON chain
//! adapter's build step.

pub mod client;
pub mod payload;

pub use client::{StonfiClient, StonfiConfig, SwapSimulation, PTON_MAINNET};
pub use payload::{jetton_transfer_body, swap_body, ton_transfer_body};
