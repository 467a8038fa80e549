//! TON Wallet Signer
//!
//! Key derivation from the custodial 24-word mnemonic (TON's
//! HMAC-SHA512 + PBKDF2 scheme, not BIP-39) and wallet-v4 message assembly:
//! the signed order the wallet contract verifies, wrapped in an external
//! message whose hash doubles as the transaction id.

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use thiserror::Error;
use zeroize::Zeroizing;

use super::address::TonAddress;
use super::cell::{Cell, CellBuilder, CellError};

/// Default subwallet id of wallet v4 on the basechain
pub const WALLET_V4_SUBWALLET_ID: u32 = 698_983_191;

/// PBKDF2 rounds of the TON mnemonic-to-seed derivation
const PBKDF2_ROUNDS: u32 = 100_000;

/// Send mode: pay fees separately, ignore action errors
pub const SEND_MODE_PAY_FEES_SEPARATELY: u8 = 3;

#[derive(Debug, Error)]
pub enum TonWalletError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error(transparent)]
    Cell(#[from] CellError),
}

/// Derive the ed25519 signing key from a 24-word TON mnemonic.
///
/// entropy = HMAC-SHA512(key = phrase, msg = "");
/// seed    = PBKDF2-HMAC-SHA512(entropy, "TON default seed", 100000)[..32]
pub fn signing_key_from_mnemonic(mnemonic: &str) -> Result<SigningKey, TonWalletError> {
    let words: Vec<&str> = mnemonic.split_whitespace().collect();
    if words.len() != 24 {
        return Err(TonWalletError::InvalidMnemonic(format!(
            "expected 24 words, got {}",
            words.len()
        )));
    }
    let phrase = Zeroizing::new(words.join(" "));

    let mut mac = Hmac::<Sha512>::new_from_slice(phrase.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(b"");
    let mut entropy = Zeroizing::new([0u8; 64]);
    entropy.copy_from_slice(&mac.finalize().into_bytes());

    let mut seed = Zeroizing::new([0u8; 64]);
    pbkdf2_hmac::<Sha512>(
        entropy.as_slice(),
        b"TON default seed",
        PBKDF2_ROUNDS,
        seed.as_mut_slice(),
    );

    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&seed[..32]);
    Ok(SigningKey::from_bytes(&key))
}

/// Internal message the wallet contract will forward: `value` nanoTON to
/// `dest`, carrying `body` (the DEX payload) by reference.
pub fn build_internal_message(
    dest: &TonAddress,
    value: u64,
    bounce: bool,
    body: Option<Arc<Cell>>,
) -> Result<Cell, CellError> {
    let mut b = CellBuilder::new();
    b.store_bit(false)?; // int_msg_info$0
    b.store_bit(true)?; // ihr_disabled
    b.store_bit(bounce)?;
    b.store_bit(false)?; // bounced
    b.store_address(None)?; // src: set by the wallet contract
    b.store_address(Some(dest))?;
    b.store_coins(value)?;
    b.store_bit(false)?; // no extra currencies
    b.store_coins(0)?; // ihr_fee
    b.store_coins(0)?; // fwd_fee
    b.store_uint(0, 64)?; // created_lt
    b.store_uint(0, 32)?; // created_at
    b.store_bit(false)?; // no state_init
    match body {
        Some(body) => {
            b.store_bit(true)?;
            b.store_ref(body)?;
        }
        None => {
            b.store_bit(false)?;
        }
    }
    Ok(b.build())
}

/// The order fields wallet v4 signs: subwallet, expiry, seqno, op, then one
/// (mode, message) pair.
fn store_order(
    b: &mut CellBuilder,
    seqno: u32,
    valid_until: u32,
    send_mode: u8,
    transfer: Arc<Cell>,
) -> Result<(), CellError> {
    b.store_uint(WALLET_V4_SUBWALLET_ID as u64, 32)?;
    b.store_uint(valid_until as u64, 32)?;
    b.store_uint(seqno as u64, 32)?;
    b.store_uint(0, 8)?; // op: simple send
    b.store_uint(send_mode as u64, 8)?;
    b.store_ref(transfer)?;
    Ok(())
}

/// Build and sign the external message for one transfer. Returns the message
/// cell; its repr hash is the transaction id.
pub fn build_signed_external(
    wallet: &TonAddress,
    signing_key: &SigningKey,
    seqno: u32,
    valid_until: u32,
    transfer: Arc<Cell>,
) -> Result<Cell, TonWalletError> {
    // Hash of the unsigned order is what gets signed
    let mut order = CellBuilder::new();
    store_order(
        &mut order,
        seqno,
        valid_until,
        SEND_MODE_PAY_FEES_SEPARATELY,
        transfer.clone(),
    )?;
    let order = order.build();
    let signature = signing_key.sign(&order.repr_hash());

    // Body: signature followed by the same order fields
    let mut body = CellBuilder::new();
    body.store_bytes(&signature.to_bytes())?;
    store_order(
        &mut body,
        seqno,
        valid_until,
        SEND_MODE_PAY_FEES_SEPARATELY,
        transfer,
    )?;
    let body = Arc::new(body.build());

    let mut ext = CellBuilder::new();
    ext.store_uint(0b10, 2)?; // ext_in_msg_info$10
    ext.store_address(None)?; // src
    ext.store_address(Some(wallet))?;
    ext.store_coins(0)?; // import_fee
    ext.store_bit(false)?; // no state_init
    ext.store_bit(true)?; // body by reference
    ext.store_ref(body)?;
    Ok(ext.build())
}
