//! Chain Adapter Port
//!
//! Per-chain primitives behind one trait: address validation, native balance,
//! DEX transaction building, signing and broadcast. Signing is split from
//! submission so the executor can record the transaction id before anything
//! hits the network.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Chain, SwapDirection};
use crate::ports::secrets::SecretMaterial;

#[derive(Debug, Error, Clone)]
pub enum ChainError {
    #[error("invalid {chain} address: {address}")]
    InvalidAddress { chain: Chain, address: String },

    #[error("all RPC endpoints unreachable: {0}")]
    RpcUnavailable(String),

    #[error("network timeout during {0}")]
    NetworkTimeout(&'static str),

    #[error("transaction rejected by the network: {0}")]
    SubmissionFailed(String),

    #[error("DEX router error: {0}")]
    RouterError(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("malformed response from {endpoint}: {detail}")]
    BadResponse {
        endpoint: &'static str,
        detail: String,
    },
}

impl ChainError {
    /// Whether the executor may rebuild and retry. Only explicit rejections
    /// qualify: timeouts after broadcast are ambiguous and must never lead to
    /// a second broadcast.
    pub fn is_retryable_rejection(&self) -> bool {
        matches!(self, ChainError::SubmissionFailed(_))
    }
}

/// Inputs for building a swap transaction via the chain's DEX router
#[derive(Debug, Clone)]
pub struct SwapBuildParams {
    pub direction: SwapDirection,
    /// The custodial wallet's public address
    pub wallet_address: String,
    /// Token mint / jetton master on the non-native side
    pub counter_asset: String,
    /// Amount being spent, smallest units of the spent asset
    pub amount_raw: u64,
    /// Slippage-adjusted minimum acceptable output, smallest units
    pub min_output_raw: u64,
    pub slippage_bps: u16,
}

/// Chain-specific unsigned transaction payload
#[derive(Debug, Clone)]
pub enum UnsignedPayload {
    /// Base64 serialized versioned transaction from Jupiter's swap endpoint
    Solana { tx_base64: String },
    /// Wallet-v4 transfer parameters assembled from STON.fi router data.
    /// `body_boc` is the serialized message body to forward to `dest`;
    /// `wallet_address` is the sending wallet contract the external message
    /// targets at signing time.
    Ton {
        wallet_address: String,
        dest: String,
        bounce: bool,
        body_boc: Vec<u8>,
        seqno: u32,
    },
}

/// An unsigned swap transaction plus the native value it will move.
///
/// `attached_value_raw` is the protocol-level transfer value: for TON it
/// includes the forwarded gas payment the router dictates and must be
/// re-checked against the balance before signing.
#[derive(Debug, Clone)]
pub struct UnsignedSwapTx {
    pub chain: Chain,
    pub attached_value_raw: u64,
    pub payload: UnsignedPayload,
}

/// A signed transaction ready for broadcast. `tx_id` is derivable before
/// submission (first signature on Solana, external-message hash on TON), so
/// intent can be recorded ahead of the broadcast.
#[derive(Debug, Clone)]
pub struct SignedSwapTx {
    pub chain: Chain,
    pub tx_id: String,
    /// Wire form: bincode bytes (Solana) or BOC bytes (TON)
    pub raw: Vec<u8>,
}

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> Chain;

    /// Chain-specific address format check. Returns false instead of
    /// erroring; callers decide what an invalid address means.
    fn validate_address(&self, address: &str) -> bool;

    /// Native-asset balance in smallest units, queried fresh. Walks the
    /// configured endpoint failover list before giving up with
    /// `RpcUnavailable`.
    async fn native_balance(&self, address: &str) -> Result<u64, ChainError>;

    /// Ask the chain's DEX router (Jupiter / STON.fi) for swap transaction
    /// parameters. No signing, nothing broadcast.
    async fn build_swap_tx(&self, params: &SwapBuildParams) -> Result<UnsignedSwapTx, ChainError>;

    /// Sign with decrypted key material. Pure — all network inputs (blockhash,
    /// seqno) were captured at build time.
    fn sign(
        &self,
        tx: &UnsignedSwapTx,
        secret: &SecretMaterial,
    ) -> Result<SignedSwapTx, ChainError>;

    /// Broadcast. Exactly one attempt: the caller owns the retry policy and
    /// must never re-broadcast after an ambiguous timeout.
    async fn submit(&self, tx: &SignedSwapTx) -> Result<String, ChainError>;
}
