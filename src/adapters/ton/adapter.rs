//! TON Chain Adapter
//!
//! Implements the chain port for TON: address validation, nanoTON balances,
//! STON.fi-built swap transfers and wallet-v4 signing from the custodial
//! mnemonic. The attached value returned from the build step is authoritative
//! for the pre-sign balance re-check, since the router dictates the forwarded
//! gas payment.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::{debug, info};

use super::address::TonAddress;
use super::cell::{parse_boc, serialize_boc};
use super::toncenter::TonClient;
use super::wallet::{build_internal_message, build_signed_external, signing_key_from_mnemonic};
use crate::adapters::stonfi::{
    jetton_transfer_body, swap_body, ton_transfer_body, StonfiClient, PTON_MAINNET,
};
use crate::domain::reserve::STONFI_SWAP_GAS_NANOTON;
use crate::domain::{Chain, SwapDirection};
use crate::ports::chain::{
    ChainAdapter, ChainError, SignedSwapTx, SwapBuildParams, UnsignedPayload, UnsignedSwapTx,
};
use crate::ports::secrets::SecretMaterial;

/// Seconds an external message stays valid after signing
const MESSAGE_TTL_SECS: u64 = 300;

pub struct TonAdapter {
    client: TonClient,
    stonfi: StonfiClient,
}

impl TonAdapter {
    pub fn new(client: TonClient, stonfi: StonfiClient) -> Self {
        Self { client, stonfi }
    }

    fn parse_address(&self, address: &str) -> Result<TonAddress, ChainError> {
        TonAddress::parse(address).map_err(|_| ChainError::InvalidAddress {
            chain: Chain::Ton,
            address: address.to_string(),
        })
    }
}

#[async_trait]
impl ChainAdapter for TonAdapter {
    fn chain(&self) -> Chain {
        Chain::Ton
    }

    /// Accepts the 48-char user-friendly form (checksummed) or raw "wc:hex"
    fn validate_address(&self, address: &str) -> bool {
        TonAddress::is_valid(address)
    }

    async fn native_balance(&self, address: &str) -> Result<u64, ChainError> {
        self.client.get_balance(address).await
    }

    async fn build_swap_tx(&self, params: &SwapBuildParams) -> Result<UnsignedSwapTx, ChainError> {
        let user = self.parse_address(&params.wallet_address)?;
        self.parse_address(&params.counter_asset)?;

        let (offer, ask) = match params.direction {
            SwapDirection::NativeToToken => (PTON_MAINNET, params.counter_asset.as_str()),
            SwapDirection::TokenToNative => (params.counter_asset.as_str(), PTON_MAINNET),
        };
        let simulation = self
            .stonfi
            .simulate_swap(offer, ask, params.amount_raw, params.slippage_bps)
            .await?;
        let router = self.parse_address(&simulation.router_address)?;
        let router_str = router.to_base64(true);

        let cell_err = |e: super::cell::CellError| ChainError::RouterError(e.to_string());

        let (dest, body, attached_value_raw) = match params.direction {
            SwapDirection::NativeToToken => {
                // Transfer goes to the router's pTON wallet; the ask side is
                // the router's wallet for the jetton being bought.
                let pton_wallet = self
                    .client
                    .get_jetton_wallet(PTON_MAINNET, &router_str)
                    .await?;
                let ask_wallet = self
                    .client
                    .get_jetton_wallet(&params.counter_asset, &router_str)
                    .await?;

                let forward = Arc::new(
                    swap_body(&ask_wallet, &user, &user, params.min_output_raw)
                        .map_err(cell_err)?,
                );
                let body = ton_transfer_body(0, params.amount_raw, &user, forward)
                    .map_err(cell_err)?;
                let value = params
                    .amount_raw
                    .checked_add(STONFI_SWAP_GAS_NANOTON)
                    .ok_or_else(|| {
                        ChainError::RouterError("offer amount overflows attached value".into())
                    })?;
                (pton_wallet, body, value)
            }
            SwapDirection::TokenToNative => {
                // Jetton transfer from the user's jetton wallet; the ask side
                // is the router's pTON wallet.
                let user_jetton_wallet = self
                    .client
                    .get_jetton_wallet(&params.counter_asset, &params.wallet_address)
                    .await?;
                let pton_wallet = self
                    .client
                    .get_jetton_wallet(PTON_MAINNET, &router_str)
                    .await?;

                let forward = Arc::new(
                    swap_body(&pton_wallet, &user, &user, params.min_output_raw)
                        .map_err(cell_err)?,
                );
                let body =
                    jetton_transfer_body(0, params.amount_raw, &router, &user, forward)
                        .map_err(cell_err)?;
                (user_jetton_wallet, body, STONFI_SWAP_GAS_NANOTON)
            }
        };

        let seqno = self.client.get_seqno(&params.wallet_address).await?;
        debug!(
            router = %router_str,
            seqno,
            attached_value_raw,
            "built STON.fi swap transfer"
        );

        Ok(UnsignedSwapTx {
            chain: Chain::Ton,
            attached_value_raw,
            payload: UnsignedPayload::Ton {
                wallet_address: params.wallet_address.clone(),
                dest: dest.to_base64(true),
                bounce: true,
                body_boc: serialize_boc(&Arc::new(body)),
                seqno,
            },
        })
    }

    fn sign(
        &self,
        tx: &UnsignedSwapTx,
        secret: &SecretMaterial,
    ) -> Result<SignedSwapTx, ChainError> {
        let UnsignedPayload::Ton {
            wallet_address,
            dest,
            bounce,
            body_boc,
            seqno,
        } = &tx.payload
        else {
            return Err(ChainError::SigningFailed(
                "non-TON payload handed to the TON adapter".to_string(),
            ));
        };
        let SecretMaterial::TonMnemonic(mnemonic) = secret else {
            return Err(ChainError::SigningFailed(
                "expected a 24-word mnemonic for TON".to_string(),
            ));
        };

        let wallet = self.parse_address(wallet_address)?;
        let dest = self.parse_address(dest)?;
        let body = parse_boc(body_boc)
            .map_err(|e| ChainError::SigningFailed(format!("corrupt body payload: {e}")))?;

        let signing_key = signing_key_from_mnemonic(mnemonic)
            .map_err(|e| ChainError::SigningFailed(e.to_string()))?;

        let valid_until = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + MESSAGE_TTL_SECS;

        let transfer =
            build_internal_message(&dest, tx.attached_value_raw, *bounce, Some(body))
                .map_err(|e| ChainError::SigningFailed(e.to_string()))?;
        let external = build_signed_external(
            &wallet,
            &signing_key,
            *seqno,
            valid_until as u32,
            Arc::new(transfer),
        )
        .map_err(|e| ChainError::SigningFailed(e.to_string()))?;

        Ok(SignedSwapTx {
            chain: Chain::Ton,
            tx_id: external.repr_hash_hex(),
            raw: serialize_boc(&Arc::new(external)),
        })
    }

    async fn submit(&self, tx: &SignedSwapTx) -> Result<String, ChainError> {
        self.client.send_boc(&tx.raw).await?;
        info!(tx_id = %tx.tx_id, "TON swap transaction sent via STON.fi");
        Ok(tx.tx_id.clone())
    }
}
