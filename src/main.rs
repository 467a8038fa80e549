//! Cotrader Engine - Custodial Multi-Chain Swap CLI
//!
//! Operational front end for the swap pipeline: quote a pair, check a
//! wallet balance, or execute a swap from an encrypted wallet file.

mod adapters;
mod application;
mod config;
mod domain;
mod ports;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::jupiter::{JupiterClient, JupiterConfig};
use crate::adapters::pricing::{
    DexscreenerConfig, DexscreenerProvider, JupiterPriceConfig, JupiterPriceProvider,
    StonfiSimulateProvider, TonapiConfig, TonapiProvider,
};
use crate::adapters::solana::{SolanaAdapter, SolanaRpc};
use crate::adapters::stonfi::{StonfiClient, StonfiConfig};
use crate::adapters::ton::{TonAdapter, TonClient, TonClientConfig};
use crate::application::{ExecutorConfig, QuoteRouter, SwapExecutor};
use crate::config::{load_config, Config};
use crate::domain::{
    min_output_raw, to_human_unit, to_smallest_unit, Chain, SwapDirection, SwapRequest,
};
use crate::ports::chain::ChainAdapter;
use crate::ports::pricing::{PriceProvider, QuoteQuery};
use crate::ports::secrets::{AesGcmCodec, WalletHandle};

#[derive(Parser)]
#[command(name = "cotrader-engine", about = "Custodial swap engine for Solana and TON")]
struct CliApp {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Info-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a quote for a token without executing anything
    Quote(QuoteCmd),
    /// Show a wallet's native balance
    Balance(BalanceCmd),
    /// Execute a swap from an encrypted wallet file
    Swap(SwapCmd),
}

#[derive(Args)]
struct QuoteCmd {
    /// Token mint (Solana) or jetton master (TON); the chain is inferred
    token: String,
    /// Amount to spend, in human units
    amount: Decimal,
    /// Slippage tolerance in basis points
    #[arg(long, default_value_t = 50)]
    slippage_bps: u16,
    /// Quote a sell (token -> native) instead of a buy
    #[arg(long)]
    sell: bool,
}

#[derive(Args)]
struct BalanceCmd {
    /// Wallet address (Solana or TON; the chain is inferred)
    address: String,
}

#[derive(Args)]
struct SwapCmd {
    /// Token mint (Solana) or jetton master (TON); the chain is inferred
    token: String,
    /// Amount to spend, in human units
    amount: Decimal,
    /// Slippage tolerance in basis points
    #[arg(long, default_value_t = 50)]
    slippage_bps: u16,
    /// Sell the token back into the native asset
    #[arg(long)]
    sell: bool,
    /// JSON wallet file: {"address": "...", "encrypted_secret": "<base64>"}
    #[arg(long)]
    wallet_file: String,
}

/// On-disk wallet handle as exported by the wallet-storage service
#[derive(Deserialize)]
struct WalletFile {
    address: String,
    encrypted_secret: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets live in .env, never in config.toml
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config_path = shellexpand::tilde(&app.config).to_string();
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;
    init_logging(&config, app.verbose, app.debug);

    match app.command {
        Command::Quote(cmd) => quote_command(&config, cmd).await,
        Command::Balance(cmd) => balance_command(&config, cmd).await,
        Command::Swap(cmd) => swap_command(&config, cmd).await,
    }
}

fn init_logging(config: &Config, verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new(config.logging.level.clone())
    };
    fmt().with_env_filter(filter).init();
}

/// Provider fallback order; `supports()` narrows it per chain:
/// Solana: Dexscreener -> Jupiter free -> Jupiter authenticated;
/// TON: Dexscreener -> TonAPI -> STON.fi simulate.
fn build_router(config: &Config) -> Result<QuoteRouter> {
    let timeout = config.pricing.quote_timeout();

    let mut providers: Vec<Arc<dyn PriceProvider>> = vec![
        Arc::new(DexscreenerProvider::new(DexscreenerConfig {
            timeout,
            ..Default::default()
        })?),
        Arc::new(JupiterPriceProvider::new(JupiterPriceConfig {
            api_url: config.jupiter.price_api_url.clone(),
            api_key: None,
            timeout,
        })?),
    ];
    if let Some(api_key) = config.jupiter.get_api_key() {
        providers.push(Arc::new(JupiterPriceProvider::new(JupiterPriceConfig {
            api_url: config.jupiter.price_api_url.clone(),
            api_key: Some(api_key),
            timeout,
        })?));
    }
    providers.push(Arc::new(TonapiProvider::new(TonapiConfig {
        api_url: config.ton.tonapi_url.clone(),
        api_key: config.ton.get_api_key(),
        timeout,
    })?));
    providers.push(Arc::new(StonfiSimulateProvider::new(build_stonfi(config)?)));

    Ok(QuoteRouter::new(providers).with_timeout(timeout))
}

fn build_stonfi(config: &Config) -> Result<StonfiClient> {
    StonfiClient::new(StonfiConfig {
        api_url: config.stonfi.api_url.clone(),
        ..Default::default()
    })
    .context("Failed to create STON.fi client")
}

fn build_solana_adapter(config: &Config) -> Result<Arc<SolanaAdapter>> {
    let rpc = SolanaRpc::new(config.solana.rpc_urls.clone());
    let jupiter = JupiterClient::with_config(JupiterConfig {
        api_base_url: config.jupiter.api_url.clone(),
        api_key: config.jupiter.get_api_key(),
        ..Default::default()
    })
    .context("Failed to create Jupiter client")?;
    Ok(Arc::new(SolanaAdapter::new(rpc, jupiter)))
}

fn build_ton_adapter(config: &Config) -> Result<Arc<TonAdapter>> {
    let client = TonClient::new(TonClientConfig {
        endpoints: config.ton.toncenter_urls.clone(),
        tonapi_url: config.ton.tonapi_url.clone(),
        api_key: config.ton.get_api_key(),
        ..Default::default()
    })
    .context("Failed to create TON client")?;
    Ok(Arc::new(TonAdapter::new(client, build_stonfi(config)?)))
}

fn infer_chain(address: &str) -> Result<Chain> {
    Chain::detect(address)
        .with_context(|| format!("Cannot tell which chain '{address}' belongs to"))
}

async fn quote_command(config: &Config, cmd: QuoteCmd) -> Result<()> {
    let chain = infer_chain(&cmd.token)?;
    let router = build_router(config)?;

    let direction = if cmd.sell {
        SwapDirection::TokenToNative
    } else {
        SwapDirection::NativeToToken
    };
    let amount_raw = to_smallest_unit(cmd.amount).context("Bad amount")?;
    let query = QuoteQuery {
        chain,
        direction,
        counter_asset: cmd.token.clone(),
        amount_raw,
        slippage_bps: cmd.slippage_bps,
    };

    let quote = router.quote(&query).await.context("Quote failed")?;
    let min_output = min_output_raw(quote.output_amount_raw, cmd.slippage_bps);

    println!("Chain:        {chain}");
    println!("Source:       {}", quote.source);
    println!("Spend:        {} {}", cmd.amount, spend_symbol(chain, cmd.sell));
    println!("Estimated:    {} (raw {})", to_human_unit(quote.output_amount_raw), quote.output_amount_raw);
    println!("Min output:   {} (raw {}, {} bps slippage)", to_human_unit(min_output), min_output, cmd.slippage_bps);
    if let Some(impact) = quote.price_impact_pct {
        println!("Price impact: {impact:.2}%");
    }
    if let Some(liquidity) = quote.market.liquidity_usd {
        println!("Liquidity:    ${liquidity:.0}");
    }
    Ok(())
}

fn spend_symbol(chain: Chain, sell: bool) -> &'static str {
    if sell {
        "tokens"
    } else {
        chain.native_symbol()
    }
}

async fn balance_command(config: &Config, cmd: BalanceCmd) -> Result<()> {
    let chain = infer_chain(&cmd.address)?;
    let adapter: Arc<dyn ChainAdapter> = match chain {
        Chain::Solana => build_solana_adapter(config)?,
        Chain::Ton => build_ton_adapter(config)?,
    };

    let balance = adapter
        .native_balance(&cmd.address)
        .await
        .context("Balance query failed")?;
    println!(
        "{}: {} {} (raw {})",
        cmd.address,
        to_human_unit(balance),
        chain.native_symbol(),
        balance
    );
    Ok(())
}

async fn swap_command(config: &Config, cmd: SwapCmd) -> Result<()> {
    let chain = infer_chain(&cmd.token)?;
    let wallet = load_wallet_file(&cmd.wallet_file)?;

    let key = config
        .secrets
        .get_encryption_key()
        .context("No encryption key configured (set COTRADER_ENCRYPTION_KEY)")?;
    let codec = Arc::new(AesGcmCodec::from_base64(&key).context("Bad encryption key")?);

    let executor = SwapExecutor::new(
        build_router(config)?,
        codec,
        ExecutorConfig::from(&config.executor),
    )
    .with_adapter(build_solana_adapter(config)?)
    .with_adapter(build_ton_adapter(config)?);

    let request = SwapRequest {
        chain,
        direction: if cmd.sell {
            SwapDirection::TokenToNative
        } else {
            SwapDirection::NativeToToken
        },
        counter_asset: cmd.token.clone(),
        amount: cmd.amount,
        slippage_bps: cmd.slippage_bps,
    };

    let result = executor.execute(&wallet, &request).await?;

    println!("Status:     {:?}", result.status);
    println!("Tx:         {}", result.tx_id);
    println!("Reference:  {}", result.reference);
    println!("Explorer:   {}", result.explorer_url());
    if let Some(output) = result.output_amount_raw {
        println!("Est output: {} (raw {output})", to_human_unit(output));
    }
    if let Some(gas) = result.gas_consumed_raw {
        println!("Gas used:   {} {}", to_human_unit(gas), chain.native_symbol());
    }
    if let Some(received) = result.native_received_raw {
        println!("Received:   {} {}", to_human_unit(received), chain.native_symbol());
    }
    Ok(())
}

fn load_wallet_file(path: &str) -> Result<WalletHandle> {
    let expanded = shellexpand::tilde(path).to_string();
    if !Path::new(&expanded).exists() {
        bail!(
            "Wallet file not found: {expanded}\n\n\
             Expected a JSON file exported by the wallet service:\n  \
             {{\"address\": \"...\", \"encrypted_secret\": \"<base64>\"}}"
        );
    }
    let content = std::fs::read_to_string(&expanded)
        .with_context(|| format!("Cannot read wallet file {expanded}"))?;
    let file: WalletFile =
        serde_json::from_str(&content).context("Wallet file is not valid JSON")?;

    use base64::Engine;
    let encrypted_secret = base64::engine::general_purpose::STANDARD
        .decode(file.encrypted_secret.trim())
        .context("encrypted_secret is not valid base64")?;
    Ok(WalletHandle::new(file.address, encrypted_secret))
}
