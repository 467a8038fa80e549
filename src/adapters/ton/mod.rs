//! TON Adapter
//!
//! Chain primitives for TON: address forms, a minimal cell/BOC writer for
//! wallet-v4 messages, mnemonic key derivation and signing, and the toncenter
//! client used for balances, seqno and broadcast.

pub mod address;
pub mod adapter;
pub mod cell;
pub mod toncenter;
pub mod wallet;

pub use adapter::TonAdapter;
pub use address::TonAddress;
pub use toncenter::{TonClient, TonClientConfig};
