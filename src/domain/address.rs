//! Deterministic addressing inside the shipment namespace.
//!
//! An address is 70 lowercase hex characters: the first 6 characters of
//! `sha512(FAMILY_NAME)` followed by the first 64 characters of
//! `sha512(public_key_hex)`. The public key is hashed as its hex text, not as
//! raw bytes, so client and processor must both pass the hex string.

use once_cell::sync::Lazy;
use sha2::{Digest, Sha512};

pub const FAMILY_NAME: &str = "shipment";
pub const FAMILY_VERSION: &str = "1.0";

pub const NAMESPACE_LEN: usize = 6;
pub const ACCOUNT_SUFFIX_LEN: usize = 64;
pub const ADDRESS_LEN: usize = NAMESPACE_LEN + ACCOUNT_SUFFIX_LEN;

static NAMESPACE_PREFIX: Lazy<String> =
    Lazy::new(|| sha512_hex(FAMILY_NAME.as_bytes())[..NAMESPACE_LEN].to_string());

/// Lowercase hex SHA-512 digest.
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}

/// The 6-hex-char prefix owned by the shipment family.
pub fn namespace_prefix() -> &'static str {
    &NAMESPACE_PREFIX
}

/// Address of the account owned by `public_key_hex`.
pub fn wallet_address(public_key_hex: &str) -> String {
    let suffix = sha512_hex(public_key_hex.as_bytes());
    format!(
        "{}{}",
        namespace_prefix(),
        &suffix[..ACCOUNT_SUFFIX_LEN]
    )
}

/// True if `address` is 70 lowercase hex characters, whatever its namespace.
pub fn is_well_formed_address(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "02a9f2a2b6c0b7b1a5d4c0f7d3e1a6c9b8e7d6c5b4a3928170f6e5d4c3b2a1908f";
    const KEY_B: &str = "03b1c2d3e4f5061728394a5b6c7d8e9fa0b1c2d3e4f5061728394a5b6c7d8e9fa0";

    #[test]
    fn test_namespace_prefix_is_hash_of_family_name() {
        let prefix = namespace_prefix();
        assert_eq!(prefix.len(), NAMESPACE_LEN);
        assert!(sha512_hex(b"shipment").starts_with(prefix));
    }

    #[test]
    fn test_wallet_address_format() {
        let address = wallet_address(KEY_A);
        assert_eq!(address.len(), ADDRESS_LEN);
        assert!(address.starts_with(namespace_prefix()));
        assert!(is_well_formed_address(&address));
        assert_eq!(&address[NAMESPACE_LEN..], &sha512_hex(KEY_A.as_bytes())[..64]);
    }

    #[test]
    fn test_wallet_address_is_deterministic() {
        assert_eq!(wallet_address(KEY_A), wallet_address(KEY_A));
        assert_ne!(wallet_address(KEY_A), wallet_address(KEY_B));
    }

    #[test]
    fn test_well_formed_address_checks_length_and_case() {
        assert!(!is_well_formed_address("abc"));
        let foreign = format!("000000{}", &sha512_hex(KEY_A.as_bytes())[..64]);
        assert!(is_well_formed_address(&foreign));
        let upper = wallet_address(KEY_A).to_uppercase();
        assert!(!is_well_formed_address(&upper));
        let long = format!("{}0", wallet_address(KEY_A));
        assert!(!is_well_formed_address(&long));
    }
}
