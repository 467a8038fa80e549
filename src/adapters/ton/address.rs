//! TON Address Handling
//!
//! User-friendly (base64url, 48 chars, "EQ"/"UQ" prefixed) and raw
//! ("0:<hex>") forms. The user-friendly form packs a tag byte, workchain,
//! account hash and a CRC16/XMODEM checksum.

use base64::Engine;
use thiserror::Error;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("unparseable TON address: {0}")]
    Malformed(String),

    #[error("address checksum mismatch: {0}")]
    BadChecksum(String),
}

/// A parsed TON account address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
}

impl TonAddress {
    /// Parse either form. User-friendly input is checksum-verified.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        if let Some((wc, hex_part)) = s.split_once(':') {
            let workchain: i8 = wc
                .parse()
                .map_err(|_| AddressError::Malformed(s.to_string()))?;
            let bytes = decode_hex(hex_part).ok_or_else(|| AddressError::Malformed(s.to_string()))?;
            let hash: [u8; 32] = bytes
                .try_into()
                .map_err(|_| AddressError::Malformed(s.to_string()))?;
            return Ok(Self { workchain, hash });
        }

        if s.len() != 48 {
            return Err(AddressError::Malformed(s.to_string()));
        }
        let packed = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(s)
            .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(s))
            .map_err(|_| AddressError::Malformed(s.to_string()))?;
        if packed.len() != 36 {
            return Err(AddressError::Malformed(s.to_string()));
        }

        let expected = crc16_xmodem(&packed[..34]);
        let actual = u16::from_be_bytes([packed[34], packed[35]]);
        if expected != actual {
            return Err(AddressError::BadChecksum(s.to_string()));
        }

        let tag = packed[0] & !TAG_TESTNET;
        if tag != TAG_BOUNCEABLE && tag != TAG_NON_BOUNCEABLE {
            return Err(AddressError::Malformed(s.to_string()));
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&packed[2..34]);
        Ok(Self {
            workchain: packed[1] as i8,
            hash,
        })
    }

    /// Shape/checksum validity without keeping the parse
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    /// User-friendly form. Bounceable ("EQ…") for contracts, non-bounceable
    /// ("UQ…") when showing a wallet address for funding.
    pub fn to_base64(&self, bounceable: bool) -> String {
        let mut packed = [0u8; 36];
        packed[0] = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        packed[1] = self.workchain as u8;
        packed[2..34].copy_from_slice(&self.hash);
        let crc = crc16_xmodem(&packed[..34]);
        packed[34..36].copy_from_slice(&crc.to_be_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(packed)
    }

    /// Raw "wc:hex" form
    pub fn to_raw(&self) -> String {
        let mut hex = String::with_capacity(64);
        for b in self.hash {
            hex.push_str(&format!("{b:02x}"));
        }
        format!("{}:{}", self.workchain, hex)
    }
}

impl std::fmt::Display for TonAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_base64(true))
    }
}

impl std::str::FromStr for TonAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// CRC16/XMODEM (poly 0x1021, init 0), the checksum TON addresses carry
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_base64() {
        let addr = TonAddress {
            workchain: 0,
            hash: [0xAB; 32],
        };
        let friendly = addr.to_base64(true);
        assert_eq!(friendly.len(), 48);
        assert!(friendly.starts_with("EQ"));
        assert_eq!(TonAddress::parse(&friendly).unwrap(), addr);

        let non_bounceable = addr.to_base64(false);
        assert!(non_bounceable.starts_with("UQ"));
        assert_eq!(TonAddress::parse(&non_bounceable).unwrap(), addr);
    }

    #[test]
    fn test_raw_form_round_trip() {
        let addr = TonAddress {
            workchain: 0,
            hash: [0x01; 32],
        };
        let raw = addr.to_raw();
        assert!(raw.starts_with("0:"));
        assert_eq!(TonAddress::parse(&raw).unwrap(), addr);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let addr = TonAddress {
            workchain: 0,
            hash: [0x42; 32],
        };
        let mut friendly = addr.to_base64(true).into_bytes();
        // Flip a character in the hash region
        friendly[10] = if friendly[10] == b'A' { b'B' } else { b'A' };
        let corrupted = String::from_utf8(friendly).unwrap();
        assert!(matches!(
            TonAddress::parse(&corrupted),
            Err(AddressError::BadChecksum(_)) | Err(AddressError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        assert!(TonAddress::parse("").is_err());
        assert!(TonAddress::parse("So11111111111111111111111111111111111111112").is_err());
        assert!(TonAddress::parse("0:zz").is_err());
        assert!(TonAddress::parse("1:abcd").is_err());
    }

    #[test]
    fn test_crc16_known_value() {
        // CRC16/XMODEM of "123456789" is 0x31C3
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }
}
