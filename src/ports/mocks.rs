//! Recording mocks for the port traits. Call counts and scripted responses
//! let tests assert both outcomes and the exact sequence of side effects
//! (e.g. "no balance or signing calls after all providers failed").

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use zeroize::Zeroizing;

use crate::domain::{Chain, MarketSnapshot, Quote, SwapDirection};
use crate::ports::chain::{
    ChainAdapter, ChainError, SignedSwapTx, SwapBuildParams, UnsignedPayload, UnsignedSwapTx,
};
use crate::ports::pricing::{PriceProvider, ProviderError, QuoteQuery};
use crate::ports::secrets::{SecretCodec, SecretError, SecretMaterial};

/// Build a plain quote for scripting mocks
pub fn test_quote(source: &'static str, output_amount_raw: u64) -> Quote {
    Quote {
        output_amount_raw,
        price_impact_pct: Some(0.1),
        source,
        fetched_at: Utc::now(),
        market: MarketSnapshot::default(),
    }
}

/// Scripted price provider: returns its responses in order, repeating the
/// last one, and records every query it sees.
pub struct MockPriceProvider {
    name: &'static str,
    chain: Option<Chain>,
    responses: Mutex<VecDeque<Result<Option<Quote>, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPriceProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            chain: None,
            responses: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Restrict the provider to one chain (default: supports all)
    pub fn for_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_quote(self, quote: Quote) -> Self {
        self.responses.lock().unwrap().push_back(Ok(Some(quote)));
        self
    }

    pub fn with_no_data(self) -> Self {
        self.responses.lock().unwrap().push_back(Ok(None));
        self
    }

    pub fn with_error(self, detail: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(detail.to_string()));
        self
    }

    /// Delay every response; used to drive the router's timeout path
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supports(&self, chain: Chain) -> bool {
        self.chain.map_or(true, |c| c == chain)
    }

    async fn try_quote(&self, _query: &QuoteQuery) -> Result<Option<Quote>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        };
        match scripted {
            Some(Ok(quote)) => Ok(quote),
            Some(Err(detail)) => Err(ProviderError::Malformed {
                provider: self.name,
                detail,
            }),
            None => Ok(None),
        }
    }
}

/// Scripted chain adapter with per-method call counters.
///
/// Balances and submit results are consumed as sequences (front first, last
/// repeats) so a test can model pre/post-swap snapshots and flaky RPC.
pub struct MockChainAdapter {
    chain: Chain,
    accept_any_address: bool,
    balances: Mutex<VecDeque<Result<u64, ChainError>>>,
    build_result: Mutex<Option<Result<UnsignedSwapTx, ChainError>>>,
    last_build_params: Mutex<Option<SwapBuildParams>>,
    sign_result: Mutex<Option<Result<String, ChainError>>>,
    submit_results: Mutex<VecDeque<Result<String, ChainError>>>,
    pub balance_calls: AtomicUsize,
    pub build_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
}

impl MockChainAdapter {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            accept_any_address: true,
            balances: Mutex::new(VecDeque::new()),
            build_result: Mutex::new(None),
            last_build_params: Mutex::new(None),
            sign_result: Mutex::new(None),
            submit_results: Mutex::new(VecDeque::new()),
            balance_calls: AtomicUsize::new(0),
            build_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_addresses(mut self) -> Self {
        self.accept_any_address = false;
        self
    }

    pub fn with_balance(self, raw: u64) -> Self {
        self.balances.lock().unwrap().push_back(Ok(raw));
        self
    }

    pub fn with_balance_error(self, err: ChainError) -> Self {
        self.balances.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_build(self, tx: UnsignedSwapTx) -> Self {
        *self.build_result.lock().unwrap() = Some(Ok(tx));
        self
    }

    pub fn with_build_error(self, err: ChainError) -> Self {
        *self.build_result.lock().unwrap() = Some(Err(err));
        self
    }

    pub fn with_sign_error(self, err: ChainError) -> Self {
        *self.sign_result.lock().unwrap() = Some(Err(err));
        self
    }

    pub fn with_submit_ok(self, tx_id: &str) -> Self {
        self.submit_results
            .lock()
            .unwrap()
            .push_back(Ok(tx_id.to_string()));
        self
    }

    pub fn with_submit_error(self, err: ChainError) -> Self {
        self.submit_results.lock().unwrap().push_back(Err(err));
        self
    }

    /// Parameters the executor handed to the most recent build call
    pub fn last_build_params(&self) -> Option<SwapBuildParams> {
        self.last_build_params.lock().unwrap().clone()
    }

    /// A plausible unsigned tx for tests
    pub fn test_unsigned(chain: Chain, attached_value_raw: u64) -> UnsignedSwapTx {
        let payload = match chain {
            Chain::Solana => UnsignedPayload::Solana {
                tx_base64: "AQAB".to_string(),
            },
            Chain::Ton => UnsignedPayload::Ton {
                wallet_address: "UQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs".to_string(),
                dest: "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs".to_string(),
                bounce: true,
                body_boc: vec![0xb5, 0xee, 0x9c, 0x72],
                seqno: 7,
            },
        };
        UnsignedSwapTx {
            chain,
            attached_value_raw,
            payload,
        }
    }
}

#[async_trait]
impl ChainAdapter for MockChainAdapter {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn validate_address(&self, address: &str) -> bool {
        self.accept_any_address && !address.is_empty()
    }

    async fn native_balance(&self, _address: &str) -> Result<u64, ChainError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let mut balances = self.balances.lock().unwrap();
        let next = if balances.len() > 1 {
            balances.pop_front()
        } else {
            balances.front().cloned()
        };
        next.unwrap_or(Err(ChainError::RpcUnavailable(
            "no balance scripted".to_string(),
        )))
    }

    async fn build_swap_tx(&self, params: &SwapBuildParams) -> Result<UnsignedSwapTx, ChainError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_build_params.lock().unwrap() = Some(params.clone());
        // Native value only moves on buys; sells spend the token side
        let attached = match params.direction {
            SwapDirection::NativeToToken => params.amount_raw,
            SwapDirection::TokenToNative => 0,
        };
        self.build_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Self::test_unsigned(self.chain, attached)))
    }

    fn sign(
        &self,
        tx: &UnsignedSwapTx,
        _secret: &SecretMaterial,
    ) -> Result<SignedSwapTx, ChainError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        match self.sign_result.lock().unwrap().clone() {
            Some(Err(e)) => Err(e),
            Some(Ok(tx_id)) => Ok(SignedSwapTx {
                chain: tx.chain,
                tx_id,
                raw: vec![1, 2, 3],
            }),
            None => Ok(SignedSwapTx {
                chain: tx.chain,
                tx_id: "mock-tx-id".to_string(),
                raw: vec![1, 2, 3],
            }),
        }
    }

    async fn submit(&self, _tx: &SignedSwapTx) -> Result<String, ChainError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.submit_results.lock().unwrap();
        let next = if results.len() > 1 {
            results.pop_front()
        } else {
            results.front().cloned()
        };
        next.unwrap_or(Err(ChainError::SubmissionFailed(
            "no submit result scripted".to_string(),
        )))
    }
}

/// Identity codec: "ciphertext" is the plaintext. Flip `fail` to model a
/// corrupted store / wrong cipher key.
pub struct MockSecretCodec {
    pub fail: bool,
}

impl MockSecretCodec {
    pub fn new() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockSecretCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretCodec for MockSecretCodec {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, SecretError> {
        if self.fail {
            return Err(SecretError::DecryptionFailed);
        }
        Ok(Zeroizing::new(ciphertext.to_vec()))
    }
}

/// Query helper for provider tests
pub fn test_query(chain: Chain, amount_raw: u64) -> QuoteQuery {
    QuoteQuery {
        chain,
        direction: SwapDirection::NativeToToken,
        counter_asset: match chain {
            Chain::Solana => "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            Chain::Ton => "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs".to_string(),
        },
        amount_raw,
        slippage_bps: 50,
    }
}
