//! End-to-end pipeline tests over mocked providers and chain adapters:
//! the full Validated -> Quoted -> BalanceChecked -> TxBuilt -> Signed ->
//! Submitted -> Reconciled walk, provider fallback ordering, and the
//! broadcast-ambiguity handling.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use cotrader_engine::application::{ExecutorConfig, QuoteRouter, SwapExecutor};
use cotrader_engine::domain::{Chain, SwapDirection, SwapRequest, SwapStatus};
use cotrader_engine::ports::chain::ChainError;
use cotrader_engine::ports::mocks::{
    test_quote, MockChainAdapter, MockPriceProvider, MockSecretCodec,
};
use cotrader_engine::ports::pricing::PriceProvider;
use cotrader_engine::ports::secrets::WalletHandle;

const SOL_WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

fn config() -> ExecutorConfig {
    ExecutorConfig {
        submit_timeout: Duration::from_millis(250),
        max_submit_attempts: 3,
        settle_delay: Duration::ZERO,
    }
}

fn sol_wallet() -> WalletHandle {
    // Identity codec in tests: the ciphertext IS the 32-byte seed
    WalletHandle::new(SOL_WALLET, vec![9u8; 32])
}

fn buy_request(amount: rust_decimal::Decimal, slippage_bps: u16) -> SwapRequest {
    SwapRequest {
        chain: Chain::Solana,
        direction: SwapDirection::NativeToToken,
        counter_asset: USDC_MINT.to_string(),
        amount,
        slippage_bps,
    }
}

fn executor(
    adapter: Arc<MockChainAdapter>,
    providers: Vec<Arc<dyn PriceProvider>>,
) -> SwapExecutor {
    SwapExecutor::new(
        QuoteRouter::new(providers).with_timeout(Duration::from_millis(100)),
        Arc::new(MockSecretCodec::new()),
        config(),
    )
    .with_adapter(adapter)
}

#[tokio::test]
async fn full_buy_pipeline_propagates_slippage_adjusted_minimum() {
    // 0.5 SOL at 500 bps; the quote says 1_000_000_000 raw out
    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(2_000_000_000)
            .with_balance(1_495_000_000)
            .with_submit_ok("sig-buy"),
    );
    let provider = Arc::new(
        MockPriceProvider::new("dexscreener").with_quote(test_quote("dexscreener", 1_000_000_000)),
    );

    let executor = executor(adapter.clone(), vec![provider]);
    let result = executor
        .execute(&sol_wallet(), &buy_request(dec!(0.5), 500))
        .await
        .unwrap();

    // minOutputRaw = floor(1e9 * 9500 / 10000)
    let params = adapter.last_build_params().unwrap();
    assert_eq!(params.min_output_raw, 950_000_000);
    assert_eq!(params.amount_raw, 500_000_000);
    assert_eq!(params.wallet_address, SOL_WALLET);

    assert_eq!(result.status, SwapStatus::Confirmed);
    assert_eq!(result.tx_id, "sig-buy");
    assert_eq!(result.output_amount_raw, Some(1_000_000_000));
    assert_eq!(result.gas_consumed_raw, Some(5_000_000));
    assert_eq!(
        result.explorer_url(),
        "https://solscan.io/tx/sig-buy"
    );
}

#[tokio::test]
async fn zero_slippage_minimum_equals_quote() {
    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(2_000_000_000)
            .with_submit_ok("sig"),
    );
    let provider =
        Arc::new(MockPriceProvider::new("mock").with_quote(test_quote("mock", 123_456_789)));

    let executor = executor(adapter.clone(), vec![provider]);
    executor
        .execute(&sol_wallet(), &buy_request(dec!(0.5), 0))
        .await
        .unwrap();

    assert_eq!(adapter.last_build_params().unwrap().min_output_raw, 123_456_789);
}

#[tokio::test]
async fn provider_fallback_first_usable_quote_wins() {
    let broken = Arc::new(MockPriceProvider::new("dexscreener").with_error("HTTP 500"));
    let empty = Arc::new(MockPriceProvider::new("jupiter-price").with_no_data());
    let good = Arc::new(
        MockPriceProvider::new("jupiter-price-auth")
            .with_quote(test_quote("jupiter-price-auth", 777)),
    );

    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(2_000_000_000)
            .with_submit_ok("sig"),
    );
    let executor = executor(
        adapter,
        vec![broken.clone(), empty.clone(), good.clone()],
    );

    let result = executor
        .execute(&sol_wallet(), &buy_request(dec!(0.1), 50))
        .await
        .unwrap();

    assert_eq!(result.output_amount_raw, Some(777));
    assert_eq!(broken.call_count(), 1);
    assert_eq!(empty.call_count(), 1);
    assert_eq!(good.call_count(), 1);
}

#[tokio::test]
async fn all_providers_down_aborts_with_no_side_effects() {
    // Every provider fails -> NoLiquidityData, and neither balance nor
    // signing is ever touched
    let p1 = Arc::new(MockPriceProvider::new("dexscreener").with_error("HTTP 500"));
    let p2 = Arc::new(MockPriceProvider::new("tonapi").with_error("HTTP 500"));
    let p3 = Arc::new(MockPriceProvider::new("stonfi").with_error("HTTP 500"));

    let adapter = Arc::new(MockChainAdapter::new(Chain::Ton).with_balance(5_000_000_000));
    let executor = SwapExecutor::new(
        QuoteRouter::new(vec![
            p1.clone() as Arc<dyn PriceProvider>,
            p2.clone(),
            p3.clone(),
        ])
        .with_timeout(Duration::from_millis(100)),
        Arc::new(MockSecretCodec::new()),
        config(),
    )
    .with_adapter(adapter.clone());

    let wallet = WalletHandle::new(
        "UQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs",
        vec!["abandon"; 24].join(" ").into_bytes(),
    );
    let request = SwapRequest {
        chain: Chain::Ton,
        direction: SwapDirection::NativeToToken,
        counter_asset: "EQCxE6mUtQJKFnGfaROTKOt1lZbDiiX1kCixRv7Nw2Id_sDs".to_string(),
        amount: dec!(1),
        slippage_bps: 50,
    };

    let err = executor.execute(&wallet, &request).await.unwrap_err();
    assert!(err.to_string().contains("no liquidity data"));
    assert_eq!(p1.call_count() + p2.call_count() + p3.call_count(), 3);
    assert_eq!(adapter.balance_calls.load(Ordering::SeqCst), 0);
    assert_eq!(adapter.sign_calls.load(Ordering::SeqCst), 0);
    assert_eq!(adapter.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn insufficient_funds_never_reaches_tx_build() {
    let adapter = Arc::new(MockChainAdapter::new(Chain::Solana).with_balance(100_000));
    let provider =
        Arc::new(MockPriceProvider::new("mock").with_quote(test_quote("mock", 1_000)));

    let executor = executor(adapter.clone(), vec![provider]);
    let err = executor
        .execute(&sol_wallet(), &buy_request(dec!(0.0005), 50))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("insufficient"));
    assert_eq!(adapter.build_calls.load(Ordering::SeqCst), 0);
    assert_eq!(adapter.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn broadcast_timeout_is_surfaced_not_retried() {
    // Submission times out after broadcast: no duplicate submission, and the
    // result carries a reference for later status queries
    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(1_000_000_000)
            .with_balance(1_000_000_000)
            .with_submit_error(ChainError::NetworkTimeout("submit")),
    );
    let provider =
        Arc::new(MockPriceProvider::new("mock").with_quote(test_quote("mock", 10_000)));

    let executor = executor(adapter.clone(), vec![provider]);
    let result = executor
        .execute(&sol_wallet(), &buy_request(dec!(0.1), 50))
        .await
        .unwrap();

    assert_eq!(adapter.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.status, SwapStatus::Unknown);
    assert!(!result.reference.is_empty());
}

#[tokio::test]
async fn sell_pipeline_reports_native_received() {
    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(50_000_000) // gas reserve is enough, no native spend
            .with_balance(1_040_000_000) // proceeds arrived
            .with_submit_ok("sig-sell"),
    );
    let provider =
        Arc::new(MockPriceProvider::new("mock").with_quote(test_quote("mock", 1_000_000_000)));

    let executor = executor(adapter.clone(), vec![provider]);
    let request = SwapRequest {
        chain: Chain::Solana,
        direction: SwapDirection::TokenToNative,
        counter_asset: USDC_MINT.to_string(),
        amount: dec!(1000),
        slippage_bps: 100,
    };

    let result = executor.execute(&sol_wallet(), &request).await.unwrap();

    assert_eq!(result.status, SwapStatus::Confirmed);
    assert_eq!(result.native_received_raw, Some(990_000_000));
    assert_eq!(result.gas_consumed_raw, None);
    // The sell amount rides in token units
    assert_eq!(
        adapter.last_build_params().unwrap().amount_raw,
        1_000_000_000_000
    );
}

#[tokio::test]
async fn concurrent_swaps_on_one_wallet_serialize() {
    // Both swaps succeed, but the per-wallet lock forces them through one at
    // a time: each sees a fresh balance snapshot (scripted in sequence).
    let adapter = Arc::new(
        MockChainAdapter::new(Chain::Solana)
            .with_balance(1_000_000_000) // swap 1 before
            .with_balance(894_000_000) // swap 1 after
            .with_balance(894_000_000) // swap 2 before
            .with_balance(788_000_000) // swap 2 after
            .with_submit_ok("sig-1")
            .with_submit_ok("sig-2"),
    );
    let provider = Arc::new(MockPriceProvider::new("mock").with_quote(test_quote("mock", 5_000)));

    let executor = Arc::new(executor(adapter.clone(), vec![provider]));
    let wallet = Arc::new(sol_wallet());

    let mut handles = Vec::new();
    for _ in 0..2 {
        let executor = executor.clone();
        let wallet = wallet.clone();
        handles.push(tokio::spawn(async move {
            executor
                .execute(&wallet, &buy_request(dec!(0.1), 50))
                .await
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.status, SwapStatus::Confirmed);
        confirmed += 1;
    }
    assert_eq!(confirmed, 2);
    // Strict interleaving: 2 pre + 2 post balance reads, 2 submissions
    assert_eq!(adapter.balance_calls.load(Ordering::SeqCst), 4);
    assert_eq!(adapter.submit_calls.load(Ordering::SeqCst), 2);
}
