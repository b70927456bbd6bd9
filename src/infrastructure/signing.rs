//! secp256k1 signing for transaction and batch headers.
//!
//! Signatures are ECDSA over the SHA-256 digest of the message, in compact
//! 64-byte `r || s` form, hex encoded. Public keys are SEC1 compressed (33
//! bytes, 66 hex characters).

use crate::error::{Result, ShipmentError};
use k256::ecdsa::{
    Signature, SigningKey, VerifyingKey,
    signature::{Signer, Verifier},
};
use std::fs;
use std::path::Path;

pub struct Secp256k1Signer {
    signing_key: SigningKey,
    public_key: String,
}

impl Secp256k1Signer {
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Parses a private key given as 64 hex characters (surrounding whitespace ignored).
    pub fn from_hex(private_key_hex: &str) -> Result<Self> {
        let bytes = hex::decode(private_key_hex.trim()).map_err(|e| {
            ShipmentError::KeyError(format!("private key is not valid hex: {}", e))
        })?;
        let signing_key = SigningKey::from_slice(&bytes).map_err(|_| {
            ShipmentError::KeyError("not a valid secp256k1 private key".to_string())
        })?;
        Ok(Self::from_signing_key(signing_key))
    }

    pub fn from_key_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ShipmentError::KeyError(format!(
                "Failed to read private key {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_hex(&contents).map_err(|e| {
            ShipmentError::KeyError(format!(
                "Failed to load private key {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = hex::encode(signing_key.verifying_key().to_sec1_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    pub fn public_key_hex(&self) -> &str {
        &self.public_key
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> String {
        let signature: Signature = self.signing_key.sign(message);
        hex::encode(signature.to_bytes())
    }
}

/// Validates a hex encoded compressed public key and returns it trimmed.
pub fn parse_public_key(public_key_hex: &str) -> Result<String> {
    let trimmed = public_key_hex.trim();
    let bytes = hex::decode(trimmed)
        .map_err(|e| ShipmentError::KeyError(format!("public key is not valid hex: {}", e)))?;
    if bytes.len() != 33 {
        return Err(ShipmentError::KeyError(format!(
            "public key must be 33 compressed bytes, got {}",
            bytes.len()
        )));
    }
    VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|_| ShipmentError::KeyError("not a valid secp256k1 public key".to_string()))?;
    Ok(trimmed.to_lowercase())
}

pub fn read_public_key_file(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ShipmentError::KeyError(format!(
            "Failed to read public key {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_public_key(&contents)
}

/// Checks `signature_hex` over `message` against `public_key_hex`.
pub fn verify_signature(public_key_hex: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let (Ok(verifying_key), Ok(signature)) = (
        VerifyingKey::from_sec1_bytes(&key_bytes),
        Signature::from_slice(&signature_bytes),
    ) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_generated_key_round_trips_through_hex() {
        let signer = Secp256k1Signer::generate();
        let restored = Secp256k1Signer::from_hex(&signer.private_key_hex()).unwrap();
        assert_eq!(restored.public_key_hex(), signer.public_key_hex());
        assert_eq!(signer.public_key_hex().len(), 66);
        assert!(
            signer.public_key_hex().starts_with("02") || signer.public_key_hex().starts_with("03")
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = Secp256k1Signer::generate();
        let signature = signer.sign(b"header bytes");
        assert_eq!(signature.len(), 128);
        assert!(verify_signature(signer.public_key_hex(), b"header bytes", &signature));
        assert!(!verify_signature(signer.public_key_hex(), b"other bytes", &signature));

        let other = Secp256k1Signer::generate();
        assert!(!verify_signature(other.public_key_hex(), b"header bytes", &signature));
        assert!(!verify_signature("zz", b"header bytes", &signature));
    }

    #[test]
    fn test_from_hex_rejects_bad_keys() {
        assert!(matches!(
            Secp256k1Signer::from_hex("not hex"),
            Err(ShipmentError::KeyError(_))
        ));
        assert!(matches!(
            Secp256k1Signer::from_hex(&"00".repeat(32)),
            Err(ShipmentError::KeyError(_))
        ));
    }

    #[test]
    fn test_key_file_loading() {
        let signer = Secp256k1Signer::generate();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", signer.private_key_hex()).unwrap();

        let loaded = Secp256k1Signer::from_key_file(file.path()).unwrap();
        assert_eq!(loaded.public_key_hex(), signer.public_key_hex());

        let missing = Secp256k1Signer::from_key_file(Path::new("/nonexistent/key.priv"));
        assert!(
            matches!(missing, Err(ShipmentError::KeyError(msg)) if msg.contains("Failed to read private key"))
        );
    }

    #[test]
    fn test_parse_public_key() {
        let signer = Secp256k1Signer::generate();
        let padded = format!("  {}\n", signer.public_key_hex());
        assert_eq!(parse_public_key(&padded).unwrap(), signer.public_key_hex());
        assert!(parse_public_key(&signer.private_key_hex()).is_err());
    }
}
