//! Solana Chain Adapter
//!
//! Implements the chain port for Solana: Base58 address validation, lamport
//! balances, Jupiter-built swap transactions, and versioned-transaction
//! signing from the custodial 32-byte seed.

use async_trait::async_trait;
use base64::Engine;
use solana_sdk::signature::Signature;
use solana_sdk::signer::keypair::keypair_from_seed;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{debug, info};

use super::rpc::SolanaRpc;
use crate::adapters::jupiter::{JupiterClient, QuoteRequest, SwapTxRequest};
use crate::domain::{Chain, SwapDirection};
use crate::ports::chain::{
    ChainAdapter, ChainError, SignedSwapTx, SwapBuildParams, UnsignedPayload, UnsignedSwapTx,
};
use crate::ports::secrets::SecretMaterial;

pub struct SolanaAdapter {
    rpc: SolanaRpc,
    jupiter: JupiterClient,
}

impl SolanaAdapter {
    pub fn new(rpc: SolanaRpc, jupiter: JupiterClient) -> Self {
        Self { rpc, jupiter }
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    /// A Solana address is a 32-byte Base58-encoded public key
    fn validate_address(&self, address: &str) -> bool {
        matches!(bs58::decode(address).into_vec(), Ok(bytes) if bytes.len() == 32)
    }

    async fn native_balance(&self, address: &str) -> Result<u64, ChainError> {
        self.rpc.get_balance(address).await
    }

    async fn build_swap_tx(&self, params: &SwapBuildParams) -> Result<UnsignedSwapTx, ChainError> {
        let quote_request = match params.direction {
            SwapDirection::NativeToToken => QuoteRequest::sol_to_token(
                &params.counter_asset,
                params.amount_raw,
                params.slippage_bps,
            ),
            SwapDirection::TokenToNative => QuoteRequest::token_to_sol(
                &params.counter_asset,
                params.amount_raw,
                params.slippage_bps,
            ),
        };

        let quote = self.jupiter.get_quote(&quote_request).await?;
        if quote.output_amount() == 0 {
            return Err(ChainError::RouterError(
                "jupiter quoted zero output".to_string(),
            ));
        }
        debug!(
            in_amount = quote.input_amount(),
            out_amount = quote.output_amount(),
            min_out = quote.min_output_amount(),
            "jupiter quote for swap build"
        );

        let quote_json = serde_json::to_value(&quote).map_err(|e| ChainError::BadResponse {
            endpoint: "jupiter quote",
            detail: e.to_string(),
        })?;
        let swap_request = SwapTxRequest::new(params.wallet_address.clone(), quote_json);
        let swap = self.jupiter.build_swap_transaction(&swap_request).await?;

        // The router only moves lamports for native->token swaps; sells spend
        // the token side and pay fees from the gas reserve.
        let attached_value_raw = match params.direction {
            SwapDirection::NativeToToken => params.amount_raw,
            SwapDirection::TokenToNative => 0,
        };

        Ok(UnsignedSwapTx {
            chain: Chain::Solana,
            attached_value_raw,
            payload: UnsignedPayload::Solana {
                tx_base64: swap.swap_transaction,
            },
        })
    }

    fn sign(
        &self,
        tx: &UnsignedSwapTx,
        secret: &SecretMaterial,
    ) -> Result<SignedSwapTx, ChainError> {
        let UnsignedPayload::Solana { tx_base64 } = &tx.payload else {
            return Err(ChainError::SigningFailed(
                "non-Solana payload handed to the Solana adapter".to_string(),
            ));
        };
        let SecretMaterial::SolanaSeed(seed) = secret else {
            return Err(ChainError::SigningFailed(
                "expected a 32-byte seed for Solana".to_string(),
            ));
        };

        let tx_bytes = base64::engine::general_purpose::STANDARD
            .decode(tx_base64)
            .map_err(|e| ChainError::SigningFailed(format!("transaction not base64: {e}")))?;
        let mut transaction: VersionedTransaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| ChainError::SigningFailed(format!("transaction not decodable: {e}")))?;

        let keypair = keypair_from_seed(seed.as_ref())
            .map_err(|e| ChainError::SigningFailed(format!("invalid seed: {e}")))?;

        let message_bytes = transaction.message.serialize();
        let signature = keypair.sign_message(&message_bytes);

        let signer_index = transaction
            .message
            .static_account_keys()
            .iter()
            .position(|key| *key == keypair.pubkey())
            .ok_or_else(|| {
                ChainError::SigningFailed("wallet is not a signer of this transaction".to_string())
            })?;

        let required = transaction.message.header().num_required_signatures as usize;
        if signer_index >= required {
            return Err(ChainError::SigningFailed(
                "wallet key is not in the required-signer set".to_string(),
            ));
        }
        if transaction.signatures.len() < required {
            transaction.signatures.resize(required, Signature::default());
        }
        transaction.signatures[signer_index] = signature;

        let raw = bincode::serialize(&transaction)
            .map_err(|e| ChainError::SigningFailed(format!("reserialize failed: {e}")))?;

        Ok(SignedSwapTx {
            chain: Chain::Solana,
            tx_id: signature.to_string(),
            raw,
        })
    }

    async fn submit(&self, tx: &SignedSwapTx) -> Result<String, ChainError> {
        let transaction: VersionedTransaction = bincode::deserialize(&tx.raw)
            .map_err(|e| ChainError::SubmissionFailed(format!("corrupt signed payload: {e}")))?;
        let signature = self.rpc.send_transaction(&transaction).await?;
        info!(tx_id = %signature, "solana swap transaction sent");
        Ok(signature)
    }
}
