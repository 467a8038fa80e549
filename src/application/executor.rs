//! Swap Executor
//!
//! The orchestrator. One invocation walks
//! Validated -> Quoted -> BalanceChecked -> TxBuilt -> Signed -> Submitted ->
//! Reconciled, failing fast from any state with a typed error. Nothing is
//! persisted across invocations; requests for the same wallet are serialized
//! so concurrent swaps cannot both pass the balance check on stale data.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use rand::RngCore;
use thiserror::Error;
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use super::quote_router::{QuoteError, QuoteRouter};
use crate::domain::amounts::AmountError;
use crate::domain::{
    check_funds, gas_reserve, min_output_raw, settle, to_smallest_unit, Chain, InputError,
    Shortfall, SwapDirection, SwapRequest, SwapResult, SwapStatus,
};
use crate::ports::chain::{ChainAdapter, ChainError, SwapBuildParams};
use crate::ports::pricing::QuoteQuery;
use crate::ports::secrets::{SecretCodec, SecretMaterial, WalletHandle};

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error(transparent)]
    NoLiquidityData(#[from] QuoteError),

    #[error(transparent)]
    InsufficientFunds(#[from] Shortfall),

    /// Corrupted storage or wrong cipher key; never retried silently
    #[error("key decryption failed: {0}")]
    KeyDecryptionFailed(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("no adapter configured for chain {0}")]
    UnsupportedChain(Chain),
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Broadcast + acknowledgement deadline
    pub submit_timeout: Duration,
    /// Total build/sign/submit attempts on explicit network rejection
    pub max_submit_attempts: u32,
    /// Pause before the reconciliation balance read
    pub settle_delay: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            max_submit_attempts: 3,
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// At-most-one in-flight swap per wallet address. Waiters queue rather than
/// fail; the balance is read fresh inside the critical section.
#[derive(Default)]
pub struct WalletLocks {
    inner: StdMutex<HashMap<String, Arc<TokioMutex<()>>>>,
}

impl WalletLocks {
    pub async fn acquire(&self, address: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("wallet lock map poisoned");
            map.entry(address.to_string())
                .or_insert_with(|| Arc::new(TokioMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub struct SwapExecutor {
    adapters: HashMap<Chain, Arc<dyn ChainAdapter>>,
    router: QuoteRouter,
    codec: Arc<dyn SecretCodec>,
    locks: WalletLocks,
    config: ExecutorConfig,
}

impl SwapExecutor {
    pub fn new(router: QuoteRouter, codec: Arc<dyn SecretCodec>, config: ExecutorConfig) -> Self {
        Self {
            adapters: HashMap::new(),
            router,
            codec,
            locks: WalletLocks::default(),
            config,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.adapters.insert(adapter.chain(), adapter);
        self
    }

    /// Execute one swap end to end. Steps run strictly in order; every
    /// failure before broadcast leaves no on-chain side effects.
    ///
    /// Cancellation: dropping this future is safe through the balance check
    /// (nothing has been sent anywhere). Once submission starts, callers must
    /// let it finish and read the result — a broadcast cannot be called back,
    /// so "cancel" after that point means awaiting the eventual outcome.
    pub async fn execute(
        &self,
        wallet: &WalletHandle,
        request: &SwapRequest,
    ) -> Result<SwapResult, SwapError> {
        let adapter = self
            .adapters
            .get(&request.chain)
            .ok_or(SwapError::UnsupportedChain(request.chain))?
            .clone();

        let _guard = self.locks.acquire(&wallet.address).await;

        // Validated: all local checks before the first network call
        request.validate()?;
        if !adapter.validate_address(&request.counter_asset) {
            return Err(InputError::InvalidAddress {
                chain: request.chain,
                address: request.counter_asset.clone(),
            }
            .into());
        }
        if !adapter.validate_address(&wallet.address) {
            return Err(InputError::InvalidAddress {
                chain: request.chain,
                address: wallet.address.clone(),
            }
            .into());
        }
        let amount_raw = to_smallest_unit(request.amount).map_err(map_amount_error)?;

        // Quoted: no side effects yet, safe to retry from scratch
        let query = QuoteQuery {
            chain: request.chain,
            direction: request.direction,
            counter_asset: request.counter_asset.clone(),
            amount_raw,
            slippage_bps: request.slippage_bps,
        };
        let quote = self.router.quote(&query).await?;
        let min_output = min_output_raw(quote.output_amount_raw, request.slippage_bps);
        info!(
            chain = %request.chain,
            source = quote.source,
            quoted_raw = quote.output_amount_raw,
            min_output_raw = min_output,
            "swap quoted"
        );

        // BalanceChecked: native spend plus the chain's gas reserve
        let balance_before = adapter.native_balance(&wallet.address).await?;
        let native_spend = match request.direction {
            SwapDirection::NativeToToken => amount_raw,
            SwapDirection::TokenToNative => 0,
        };
        check_funds(
            request.chain,
            balance_before,
            native_spend,
            gas_reserve(request.chain),
        )?;

        // Decrypted once; rejection retries reuse the same material. A
        // decryption failure is a data-integrity problem, not a retry
        // candidate.
        let secret_bytes = self.codec.decrypt(&wallet.encrypted_secret).map_err(|e| {
            error!(wallet = %wallet.address, "custodial secret decryption failed: {e}");
            SwapError::KeyDecryptionFailed(e.to_string())
        })?;
        let secret = SecretMaterial::for_chain(request.chain, secret_bytes).map_err(|e| {
            error!(wallet = %wallet.address, "custodial secret malformed: {e}");
            SwapError::KeyDecryptionFailed(e.to_string())
        })?;

        let build_params = SwapBuildParams {
            direction: request.direction,
            wallet_address: wallet.address.clone(),
            counter_asset: request.counter_asset.clone(),
            amount_raw,
            min_output_raw: min_output,
            slippage_bps: request.slippage_bps,
        };

        // TxBuilt -> Signed -> Submitted, with bounded retries only on
        // explicit rejection (fresh transaction each attempt). A timeout
        // after broadcast is ambiguous: never re-broadcast, let
        // reconciliation decide what happened.
        let mut attempt = 0u32;
        let (tx_id, reference, ambiguous) = loop {
            attempt += 1;

            let unsigned = adapter.build_swap_tx(&build_params).await?;
            // The build step knows the exact value the transaction moves
            // (TON forwarded gas exceeds the static reserve estimate).
            if unsigned.attached_value_raw > balance_before {
                return Err(Shortfall {
                    chain: request.chain,
                    required_raw: unsigned.attached_value_raw,
                    available_raw: balance_before,
                    shortfall_raw: unsigned.attached_value_raw - balance_before,
                }
                .into());
            }

            let signed = adapter.sign(&unsigned, &secret)?;
            let reference = new_reference();
            // Intent recorded before anything reaches the network, so the
            // outcome stays queryable even if the broadcast response is lost.
            info!(
                reference = %reference,
                tx_id = %signed.tx_id,
                attempt,
                "submission intent recorded"
            );

            match tokio::time::timeout(self.config.submit_timeout, adapter.submit(&signed)).await {
                Ok(Ok(tx_id)) => break (tx_id, reference, false),
                Ok(Err(e)) if e.is_retryable_rejection() => {
                    if attempt >= self.config.max_submit_attempts {
                        return Err(e.into());
                    }
                    warn!(
                        attempt,
                        error = %e,
                        "submission rejected, rebuilding transaction"
                    );
                }
                Ok(Err(ChainError::NetworkTimeout(stage))) => {
                    warn!(reference = %reference, stage, "broadcast outcome unknown after timeout");
                    break (signed.tx_id.clone(), reference, true);
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(reference = %reference, "broadcast outcome unknown after deadline");
                    break (signed.tx_id.clone(), reference, true);
                }
            }
        };

        // Reconciled: the swap already happened (or may have, if ambiguous);
        // an unreachable RPC here degrades the result, never fails it.
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        let result = match adapter.native_balance(&wallet.address).await {
            Ok(balance_after) => {
                let settlement =
                    settle(request.direction, balance_before, balance_after, native_spend);
                let status = if ambiguous && !settlement.balance_moved {
                    SwapStatus::Unknown
                } else {
                    SwapStatus::Confirmed
                };
                SwapResult {
                    chain: request.chain,
                    direction: request.direction,
                    tx_id,
                    reference,
                    status,
                    output_amount_raw: Some(quote.output_amount_raw),
                    gas_consumed_raw: settlement.gas_consumed_raw,
                    native_received_raw: settlement.native_received_raw,
                }
            }
            Err(e) => {
                warn!(reference = %reference, "reconciliation skipped, RPC unavailable: {e}");
                SwapResult {
                    chain: request.chain,
                    direction: request.direction,
                    tx_id,
                    reference,
                    status: if ambiguous {
                        SwapStatus::Unknown
                    } else {
                        SwapStatus::Confirmed
                    },
                    output_amount_raw: Some(quote.output_amount_raw),
                    gas_consumed_raw: None,
                    native_received_raw: None,
                }
            }
        };

        info!(
            tx_id = %result.tx_id,
            status = ?result.status,
            gas = ?result.gas_consumed_raw,
            "swap finished"
        );
        Ok(result)
    }
}

fn map_amount_error(err: AmountError) -> InputError {
    match err {
        AmountError::NonPositive(amount) => InputError::NonPositiveAmount(amount),
        AmountError::TooPrecise(amount) | AmountError::Overflow(amount) => {
            InputError::UnrepresentableAmount(amount)
        }
    }
}

/// Client-generated submission reference (logged before broadcast)
fn new_reference() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("swap-{}", bs58::encode(bytes).into_string())
}
