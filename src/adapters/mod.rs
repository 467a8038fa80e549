//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: DEX aggregator API client (Solana swap build)
//! - Solana: RPC failover client and chain adapter
//! - TON: cell/BOC plumbing, wallet-v4 signer, toncenter client, chain adapter
//! - STON.fi: swap simulation and router payloads
//! - Pricing: Dexscreener / Jupiter price / TonAPI / STON.fi quote providers

pub mod jupiter;
pub mod pricing;
pub mod solana;
pub mod stonfi;
pub mod ton;

pub use jupiter::JupiterClient;
pub use solana::{SolanaAdapter, SolanaRpc};
pub use stonfi::StonfiClient;
pub use ton::TonAdapter;
