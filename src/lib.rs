//! Cotrader Engine - Custodial Multi-Chain Swap Library
//!
//! Swap execution and quoting pipeline for custodial wallets on Solana
//! (Jupiter) and TON (STON.fi).
//!
//! # Modules
//!
//! - `domain`: Core business logic (amounts, requests, reserves, reconciliation)
//! - `ports`: Trait abstractions (ChainAdapter, PriceProvider, SecretCodec)
//! - `adapters`: External implementations (Jupiter, Solana RPC, TON, STON.fi, pricing)
//! - `config`: Configuration loading and validation
//! - `application`: QuoteRouter and SwapExecutor

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
