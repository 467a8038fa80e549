//! Custodial Secrets
//!
//! `SecretCodec` is the capability that turns a stored ciphertext back into
//! signing material. The cipher key is supplied once at construction from
//! configuration; it is never generated inside this crate, so secrets
//! encrypted in an earlier process remain decryptable.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::Chain;

/// AES-256-GCM nonce length
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length
const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("cipher key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("ciphertext too short ({0} bytes)")]
    CiphertextTooShort(usize),

    #[error("decryption failed: wrong key or corrupted ciphertext")]
    DecryptionFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decrypted material does not fit {chain}: {reason}")]
    MaterialMismatch { chain: Chain, reason: String },
}

/// A custodial wallet row as the storage layer hands it to us: public address
/// plus the encrypted signing secret. Borrowed for one operation, never
/// persisted here.
#[derive(Debug, Clone)]
pub struct WalletHandle {
    pub address: String,
    pub encrypted_secret: Vec<u8>,
}

impl WalletHandle {
    pub fn new(address: impl Into<String>, encrypted_secret: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            encrypted_secret,
        }
    }
}

/// Symmetric encrypt/decrypt capability for custodial secrets
pub trait SecretCodec: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretError>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, SecretError>;
}

/// AES-256-GCM codec. Ciphertext layout: nonce (12) || ciphertext+tag.
pub struct AesGcmCodec {
    cipher: Aes256Gcm,
}

impl AesGcmCodec {
    /// Build from a fixed 32-byte key supplied by configuration
    pub fn new(key: &[u8]) -> Result<Self, SecretError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| SecretError::InvalidKeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    /// Build from a base64-encoded key (the form it takes in config/env)
    pub fn from_base64(key_b64: &str) -> Result<Self, SecretError> {
        use base64::Engine;
        let key = base64::engine::general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|_| SecretError::InvalidKeyLength(0))?;
        Self::new(&key)
    }
}

impl SecretCodec for AesGcmCodec {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| SecretError::EncryptionFailed)?;

        let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        packed.extend_from_slice(&nonce_bytes);
        packed.extend_from_slice(&ciphertext);
        Ok(packed)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, SecretError> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(SecretError::CiphertextTooShort(ciphertext.len()));
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, body)
            .map(Zeroizing::new)
            .map_err(|_| SecretError::DecryptionFailed)
    }
}

/// Decrypted signing material, shaped per chain. Solana signers take a
/// 32-byte ed25519 seed; TON wallets a 24-word mnemonic. Anything else is a
/// data-integrity error, not a retry candidate.
pub enum SecretMaterial {
    SolanaSeed(Zeroizing<[u8; 32]>),
    TonMnemonic(Zeroizing<String>),
}

impl SecretMaterial {
    /// Shape-check raw decrypted bytes for the target chain
    pub fn for_chain(chain: Chain, bytes: Zeroizing<Vec<u8>>) -> Result<Self, SecretError> {
        match chain {
            Chain::Solana => {
                let seed: [u8; 32] =
                    bytes.as_slice()
                        .try_into()
                        .map_err(|_| SecretError::MaterialMismatch {
                            chain,
                            reason: format!("expected 32-byte seed, got {} bytes", bytes.len()),
                        })?;
                Ok(SecretMaterial::SolanaSeed(Zeroizing::new(seed)))
            }
            Chain::Ton => {
                let mnemonic = std::str::from_utf8(&bytes)
                    .map_err(|_| SecretError::MaterialMismatch {
                        chain,
                        reason: "mnemonic is not valid UTF-8".to_string(),
                    })?
                    .trim()
                    .to_string();
                let words = mnemonic.split_whitespace().count();
                if words != 24 {
                    return Err(SecretError::MaterialMismatch {
                        chain,
                        reason: format!("expected 24-word mnemonic, got {} words", words),
                    });
                }
                Ok(SecretMaterial::TonMnemonic(Zeroizing::new(mnemonic)))
            }
        }
    }
}

impl std::fmt::Debug for SecretMaterial {
    // Never print key material
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretMaterial::SolanaSeed(_) => write!(f, "SecretMaterial::SolanaSeed(..)"),
            SecretMaterial::TonMnemonic(_) => write!(f, "SecretMaterial::TonMnemonic(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> AesGcmCodec {
        AesGcmCodec::new(&[0x42u8; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let c = codec();
        let secret = b"winter flame rocket umbrella ...";
        let packed = c.encrypt(secret).unwrap();
        assert_ne!(&packed[NONCE_LEN..], secret.as_slice());
        let plain = c.decrypt(&packed).unwrap();
        assert_eq!(plain.as_slice(), secret.as_slice());
    }

    #[test]
    fn test_wrong_key_fails_decrypt() {
        let packed = codec().encrypt(b"seed material").unwrap();
        let other = AesGcmCodec::new(&[0x43u8; 32]).unwrap();
        assert!(matches!(
            other.decrypt(&packed),
            Err(SecretError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(matches!(
            AesGcmCodec::new(&[0u8; 16]),
            Err(SecretError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        assert!(matches!(
            codec().decrypt(&[0u8; 10]),
            Err(SecretError::CiphertextTooShort(10))
        ));
    }

    #[test]
    fn test_base64_key_round_trip() {
        use base64::Engine;
        let key_b64 = base64::engine::general_purpose::STANDARD.encode([7u8; 32]);
        let c = AesGcmCodec::from_base64(&key_b64).unwrap();
        let packed = c.encrypt(b"hello").unwrap();
        assert_eq!(c.decrypt(&packed).unwrap().as_slice(), b"hello");
    }

    #[test]
    fn test_material_solana_seed_length() {
        let ok = SecretMaterial::for_chain(Chain::Solana, Zeroizing::new(vec![1u8; 32]));
        assert!(matches!(ok, Ok(SecretMaterial::SolanaSeed(_))));

        let bad = SecretMaterial::for_chain(Chain::Solana, Zeroizing::new(vec![1u8; 31]));
        assert!(matches!(bad, Err(SecretError::MaterialMismatch { .. })));
    }

    #[test]
    fn test_material_ton_mnemonic_word_count() {
        let phrase = vec!["abandon"; 24].join(" ");
        let ok = SecretMaterial::for_chain(Chain::Ton, Zeroizing::new(phrase.into_bytes()));
        assert!(matches!(ok, Ok(SecretMaterial::TonMnemonic(_))));

        let short = vec!["abandon"; 12].join(" ");
        let bad = SecretMaterial::for_chain(Chain::Ton, Zeroizing::new(short.into_bytes()));
        assert!(matches!(bad, Err(SecretError::MaterialMismatch { .. })));
    }

    #[test]
    fn test_material_ton_rejects_binary() {
        let bad = SecretMaterial::for_chain(Chain::Ton, Zeroizing::new(vec![0xFF, 0xFE, 0x00]));
        assert!(matches!(bad, Err(SecretError::MaterialMismatch { .. })));
    }
}
