use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Serialize, Serializer};

use crate::errors::{ChainError, ChainResult};

/// Length of a compressed secp256k1 public key.
pub const PUBKEY_LEN: usize = 33;

/// Secret `0x00..01`, the single signer used for every generated coinbase.
pub const DETERMINISTIC_SECRET: [u8; 32] = {
    let mut s = [0u8; 32];
    s[31] = 1;
    s
};

/// A validated compressed public key that coinbase outputs pay to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientKey([u8; PUBKEY_LEN]);

impl RecipientKey {
    /// Key derived from [`DETERMINISTIC_SECRET`].
    pub fn deterministic() -> ChainResult<Self> {
        Self::from_secret_bytes(&DETERMINISTIC_SECRET)
    }

    pub fn from_secret_bytes(secret: &[u8]) -> ChainResult<Self> {
        let secp = Secp256k1::signing_only();
        let sk = SecretKey::from_slice(secret)
            .map_err(|e| ChainError::Crypto(format!("invalid secret key: {e}")))?;
        let pk = PublicKey::from_secret_key(&secp, &sk);
        Ok(Self(pk.serialize()))
    }

    pub fn from_secret_hex(secret_hex: &str) -> ChainResult<Self> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|_| ChainError::InvalidInput("invalid secret key hex".into()))?;
        Self::from_secret_bytes(&bytes)
    }

    /// Accepts exactly 33 bytes that parse as a point on the curve.
    pub fn from_slice(bytes: &[u8]) -> ChainResult<Self> {
        if bytes.len() != PUBKEY_LEN {
            return Err(ChainError::InvalidInput(format!(
                "public key must be {PUBKEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let pk = PublicKey::from_slice(bytes)
            .map_err(|e| ChainError::InvalidInput(format!("invalid public key: {e}")))?;
        Ok(Self(pk.serialize()))
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for RecipientKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn deterministic_key_is_generator_point() {
        let key = RecipientKey::deterministic().unwrap();
        assert_eq!(key.to_hex(), G_COMPRESSED);
    }

    #[test]
    fn secret_hex_matches_bytes() {
        let from_hex = RecipientKey::from_secret_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(from_hex, RecipientKey::deterministic().unwrap());
    }

    #[test]
    fn from_slice_validates_length_and_point() {
        let good = hex::decode(G_COMPRESSED).unwrap();
        assert!(RecipientKey::from_slice(&good).is_ok());
        assert!(matches!(
            RecipientKey::from_slice(&good[..32]),
            Err(ChainError::InvalidInput(_))
        ));
        let mut bad = good.clone();
        bad[0] = 0x05;
        assert!(RecipientKey::from_slice(&bad).is_err());
    }

    #[test]
    fn zero_secret_is_rejected() {
        assert!(matches!(
            RecipientKey::from_secret_bytes(&[0u8; 32]),
            Err(ChainError::Crypto(_))
        ));
    }
}
