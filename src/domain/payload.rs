//! Payload codec shared by the client and the transaction processor.
//!
//! The wire form is a flat, comma separated string with no escaping:
//!
//! ```text
//! add,<id>,<N>,<item1>,<count1>,...,<itemN>,<countN>,<place>
//! remove,<id>,<N>,<item1>,<count1>,...,<itemN>,<countN>
//! transfer,<id>,<placeTo>,<toPublicKeyHex>
//! ```
//!
//! Because the delimiter cannot be escaped, every text field is validated to be
//! non-empty and free of `,` both before encoding and after decoding.

use crate::error::PayloadError;
use std::collections::HashSet;
use std::fmt;

pub const DELIMITER: char = ',';

/// Item name reserved for the shipment's place history.
pub const RESERVED_ITEM: &str = "path";

const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;

/// A named item together with a count (an amount to add or to remove).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuantity {
    pub name: String,
    pub count: u64,
}

impl ItemQuantity {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    /// Parses the declared number of distinct item types.
    pub fn parse_type_count(token: &str) -> Result<usize, PayloadError> {
        match parse_digits::<usize>(token) {
            Some(n) if n > 0 => Ok(n),
            _ => Err(PayloadError::InvalidItemTypeCount(token.to_string())),
        }
    }

    /// Parses `n` positional `<item>,<count>` pairs.
    ///
    /// `tokens` must hold exactly `2 * n` entries.
    pub fn parse_pairs<S: AsRef<str>>(n: usize, tokens: &[S]) -> Result<Vec<Self>, PayloadError> {
        let expected = n.saturating_mul(2);
        if tokens.len() != expected {
            return Err(PayloadError::ItemFieldCount {
                declared: n,
                expected,
                found: tokens.len(),
            });
        }

        tokens
            .chunks_exact(2)
            .map(|pair| {
                let name = pair[0].as_ref();
                let count = pair[1].as_ref();
                let count = parse_digits::<u64>(count).ok_or_else(|| PayloadError::InvalidCount {
                    item: name.to_string(),
                    count: count.to_string(),
                })?;
                Ok(Self::new(name, count))
            })
            .collect()
    }
}

/// Operation carried by a shipment transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentPayload {
    Add {
        shipment_id: String,
        items: Vec<ItemQuantity>,
        place: String,
    },
    Remove {
        shipment_id: String,
        items: Vec<ItemQuantity>,
    },
    Transfer {
        shipment_id: String,
        place_to: String,
        to_public_key: String,
    },
}

impl ShipmentPayload {
    pub fn add(
        shipment_id: impl Into<String>,
        items: Vec<ItemQuantity>,
        place: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        let payload = Self::Add {
            shipment_id: shipment_id.into(),
            items,
            place: place.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn remove(
        shipment_id: impl Into<String>,
        items: Vec<ItemQuantity>,
    ) -> Result<Self, PayloadError> {
        let payload = Self::Remove {
            shipment_id: shipment_id.into(),
            items,
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn transfer(
        shipment_id: impl Into<String>,
        place_to: impl Into<String>,
        to_public_key: impl Into<String>,
    ) -> Result<Self, PayloadError> {
        let payload = Self::Transfer {
            shipment_id: shipment_id.into(),
            place_to: place_to.into(),
            to_public_key: to_public_key.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Transfer { .. } => "transfer",
        }
    }

    pub fn shipment_id(&self) -> &str {
        match self {
            Self::Add { shipment_id, .. }
            | Self::Remove { shipment_id, .. }
            | Self::Transfer { shipment_id, .. } => shipment_id,
        }
    }

    /// Checks every field against the limits of the wire format.
    pub fn validate(&self) -> Result<(), PayloadError> {
        check_field("shipment ID", self.shipment_id())?;
        match self {
            Self::Add { items, place, .. } => {
                validate_items(items)?;
                check_field("place", place)
            }
            Self::Remove { items, .. } => validate_items(items),
            Self::Transfer {
                place_to,
                to_public_key,
                ..
            } => {
                check_field("destination place", place_to)?;
                validate_public_key(to_public_key)
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Decodes and validates a payload.
    ///
    /// The declared item type count is checked against the real number of
    /// fields before any positional slicing happens.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let text = std::str::from_utf8(bytes).map_err(|_| PayloadError::NotUtf8)?;
        if text.is_empty() {
            return Err(PayloadError::Empty);
        }

        let fields: Vec<&str> = text.split(DELIMITER).collect();
        let payload = match fields[0] {
            "add" => {
                let n = declared_types("add", &fields, 5)?;
                expect_fields("add", &fields, n.saturating_mul(2).saturating_add(4))?;
                Self::Add {
                    shipment_id: fields[1].to_string(),
                    items: ItemQuantity::parse_pairs(n, &fields[3..3 + 2 * n])?,
                    place: fields[3 + 2 * n].to_string(),
                }
            }
            "remove" => {
                let n = declared_types("remove", &fields, 5)?;
                expect_fields("remove", &fields, n.saturating_mul(2).saturating_add(3))?;
                Self::Remove {
                    shipment_id: fields[1].to_string(),
                    items: ItemQuantity::parse_pairs(n, &fields[3..])?,
                }
            }
            "transfer" => {
                expect_fields("transfer", &fields, 4)?;
                Self::Transfer {
                    shipment_id: fields[1].to_string(),
                    place_to: fields[2].to_string(),
                    to_public_key: fields[3].to_string(),
                }
            }
            other => return Err(PayloadError::UnknownOperation(other.to_string())),
        };

        payload.validate()?;
        Ok(payload)
    }
}

impl fmt::Display for ShipmentPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.operation(), self.shipment_id())?;
        match self {
            Self::Add { items, place, .. } => {
                write_items(f, items)?;
                write!(f, "{DELIMITER}{place}")
            }
            Self::Remove { items, .. } => write_items(f, items),
            Self::Transfer {
                place_to,
                to_public_key,
                ..
            } => write!(f, "{DELIMITER}{place_to}{DELIMITER}{to_public_key}"),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[ItemQuantity]) -> fmt::Result {
    write!(f, "{DELIMITER}{}", items.len())?;
    for item in items {
        write!(f, "{DELIMITER}{}{DELIMITER}{}", item.name, item.count)?;
    }
    Ok(())
}

fn declared_types(
    operation: &'static str,
    fields: &[&str],
    minimum: usize,
) -> Result<usize, PayloadError> {
    if fields.len() < minimum {
        return Err(PayloadError::FieldCount {
            operation,
            expected: minimum,
            found: fields.len(),
        });
    }
    ItemQuantity::parse_type_count(fields[2])
}

fn expect_fields(
    operation: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), PayloadError> {
    if fields.len() != expected {
        return Err(PayloadError::FieldCount {
            operation,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn check_field(field: &'static str, value: &str) -> Result<(), PayloadError> {
    if value.is_empty() {
        return Err(PayloadError::EmptyField(field));
    }
    if value.contains(DELIMITER) {
        return Err(PayloadError::Delimiter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_items(items: &[ItemQuantity]) -> Result<(), PayloadError> {
    if items.is_empty() {
        return Err(PayloadError::InvalidItemTypeCount("0".to_string()));
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        check_field("item name", &item.name)?;
        if item.name == RESERVED_ITEM {
            return Err(PayloadError::ReservedItemName);
        }
        if !seen.insert(item.name.as_str()) {
            return Err(PayloadError::DuplicateItem(item.name.clone()));
        }
    }
    Ok(())
}

fn validate_public_key(key: &str) -> Result<(), PayloadError> {
    let lowercase_hex = key.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    match hex::decode(key) {
        Ok(bytes) if lowercase_hex && bytes.len() == COMPRESSED_PUBLIC_KEY_LEN => Ok(()),
        _ => Err(PayloadError::InvalidPublicKey(key.to_string())),
    }
}

// Plain ASCII digits only; `str::parse` would also accept a leading '+'.
fn parse_digits<T: std::str::FromStr>(token: &str) -> Option<T> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const KEY: &str = "02a9f2a2b6c0b7b1a5d4c0f7d3e1a6c9b8e7d6c5b4a3928170f6e5d4c3b2a1908f";

    fn apples_and_pears() -> Vec<ItemQuantity> {
        vec![ItemQuantity::new("apple", 3), ItemQuantity::new("pear", 12)]
    }

    #[test]
    fn test_encode_add() {
        let payload = ShipmentPayload::add("S1", apples_and_pears(), "Warehouse").unwrap();
        assert_eq!(
            payload.to_string(),
            "add,S1,2,apple,3,pear,12,Warehouse"
        );
    }

    #[test]
    fn test_encode_remove_and_transfer() {
        let remove = ShipmentPayload::remove("S1", vec![ItemQuantity::new("apple", 1)]).unwrap();
        assert_eq!(remove.encode(), b"remove,S1,1,apple,1".to_vec());

        let transfer = ShipmentPayload::transfer("S1", "Store", KEY).unwrap();
        assert_eq!(transfer.to_string(), format!("transfer,S1,Store,{KEY}"));
    }

    #[test]
    fn test_decode_reverses_encode() {
        let payloads = vec![
            ShipmentPayload::add("S1", apples_and_pears(), "Warehouse").unwrap(),
            ShipmentPayload::remove("S 2", vec![ItemQuantity::new("crate of pears", 0)]).unwrap(),
            ShipmentPayload::transfer("S3", "Store", KEY).unwrap(),
        ];
        for payload in payloads {
            assert_eq!(ShipmentPayload::decode(&payload.encode()).unwrap(), payload);
        }
    }

    const NAME_CHARS: &[char] = &[
        'a', 'b', 'k', 'z', 'A', 'Q', '0', '7', ' ', '-', '>', '_', '.', 'é', '箱',
    ];

    fn random_name(rng: &mut impl Rng) -> String {
        let len = rng.gen_range(1..=12);
        (0..len)
            .map(|_| NAME_CHARS[rng.gen_range(0..NAME_CHARS.len())])
            .collect()
    }

    fn random_items(rng: &mut impl Rng) -> Vec<ItemQuantity> {
        let n = rng.gen_range(1..=8);
        (0..n)
            .map(|i| {
                let count = match rng.gen_range(0..4) {
                    0 => u64::MAX,
                    1 => 0,
                    _ => rng.r#gen::<u64>(),
                };
                // Index suffix keeps names distinct and never equal to "path".
                ItemQuantity::new(format!("{}#{i}", random_name(rng)), count)
            })
            .collect()
    }

    #[test]
    fn test_decode_reverses_encode_for_generated_payloads() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let shipment_id = random_name(&mut rng);
            let payload = match rng.gen_range(0..3) {
                0 => ShipmentPayload::add(
                    shipment_id,
                    random_items(&mut rng),
                    random_name(&mut rng),
                ),
                1 => ShipmentPayload::remove(shipment_id, random_items(&mut rng)),
                _ => {
                    let mut key = [0u8; COMPRESSED_PUBLIC_KEY_LEN];
                    rng.fill(&mut key[..]);
                    key[0] = if rng.r#gen::<bool>() { 0x02 } else { 0x03 };
                    ShipmentPayload::transfer(shipment_id, random_name(&mut rng), hex::encode(key))
                }
            }
            .unwrap();

            let decoded = ShipmentPayload::decode(&payload.encode()).unwrap();
            assert_eq!(decoded, payload, "payload {payload}");
        }
    }

    #[test]
    fn test_decode_uses_declared_count_for_slicing() {
        let payload = ShipmentPayload::decode(b"add,S1,2,apple,3,pear,12,Warehouse").unwrap();
        match payload {
            ShipmentPayload::Add { items, place, .. } => {
                assert_eq!(items, apples_and_pears());
                assert_eq!(place, "Warehouse");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_count_mismatch() {
        // N says 3 item types but only 2 pairs follow.
        assert!(matches!(
            ShipmentPayload::decode(b"add,S1,3,apple,3,pear,12,Warehouse"),
            Err(PayloadError::FieldCount {
                operation: "add",
                expected: 10,
                found: 8
            })
        ));
        assert!(matches!(
            ShipmentPayload::decode(b"remove,S1,1,apple"),
            Err(PayloadError::FieldCount { .. })
        ));
        assert!(matches!(
            ShipmentPayload::decode(b"transfer,S1,Store"),
            Err(PayloadError::FieldCount { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_huge_declared_count() {
        let payload = format!("add,S1,{},apple,1,Warehouse", usize::MAX);
        assert!(matches!(
            ShipmentPayload::decode(payload.as_bytes()),
            Err(PayloadError::FieldCount { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_numbers() {
        assert!(matches!(
            ShipmentPayload::decode(b"add,S1,one,apple,1,Warehouse"),
            Err(PayloadError::InvalidItemTypeCount(_))
        ));
        assert!(matches!(
            ShipmentPayload::decode(b"add,S1,0,Warehouse,x,y"),
            Err(PayloadError::InvalidItemTypeCount(_))
        ));
        assert!(matches!(
            ShipmentPayload::decode(b"remove,S1,1,apple,-1"),
            Err(PayloadError::InvalidCount { .. })
        ));
        assert!(matches!(
            ShipmentPayload::decode(b"remove,S1,1,apple,+1"),
            Err(PayloadError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_decode_reports_unknown_operation() {
        assert_eq!(
            ShipmentPayload::decode(b"deposit,S1,5"),
            Err(PayloadError::UnknownOperation("deposit".to_string()))
        );
        assert_eq!(ShipmentPayload::decode(b""), Err(PayloadError::Empty));
        assert_eq!(
            ShipmentPayload::decode(&[0xff, 0xfe]),
            Err(PayloadError::NotUtf8)
        );
    }

    #[test]
    fn test_delimiter_in_fields_is_rejected() {
        assert!(matches!(
            ShipmentPayload::add("S1", vec![ItemQuantity::new("apple,red", 1)], "Warehouse"),
            Err(PayloadError::Delimiter { field: "item name", .. })
        ));
        assert!(matches!(
            ShipmentPayload::add("S1", apples_and_pears(), "Ware,house"),
            Err(PayloadError::Delimiter { field: "place", .. })
        ));
        assert!(matches!(
            ShipmentPayload::transfer("S,1", "Store", KEY),
            Err(PayloadError::Delimiter { field: "shipment ID", .. })
        ));
    }

    #[test]
    fn test_items_must_be_distinct_and_not_reserved() {
        assert_eq!(
            ShipmentPayload::remove(
                "S1",
                vec![ItemQuantity::new("apple", 1), ItemQuantity::new("apple", 2)]
            ),
            Err(PayloadError::DuplicateItem("apple".to_string()))
        );
        assert_eq!(
            ShipmentPayload::add("S1", vec![ItemQuantity::new("path", 1)], "Warehouse"),
            Err(PayloadError::ReservedItemName)
        );
        assert!(ShipmentPayload::add("S1", vec![], "Warehouse").is_err());
        assert_eq!(
            ShipmentPayload::decode(b"add,S1,1,,4,Warehouse"),
            Err(PayloadError::EmptyField("item name"))
        );
    }

    #[test]
    fn test_transfer_requires_compressed_hex_key() {
        assert!(ShipmentPayload::transfer("S1", "Store", "not-a-key").is_err());
        assert!(ShipmentPayload::transfer("S1", "Store", &KEY[..64]).is_err());
        assert!(ShipmentPayload::transfer("S1", "Store", KEY.to_uppercase()).is_err());
    }

    #[test]
    fn test_parse_pairs_checks_length() {
        let tokens = ["apple", "3", "pear"];
        assert_eq!(
            ItemQuantity::parse_pairs(2, &tokens),
            Err(PayloadError::ItemFieldCount {
                declared: 2,
                expected: 4,
                found: 3
            })
        );
        let tokens = vec!["apple".to_string(), "3".to_string()];
        assert_eq!(
            ItemQuantity::parse_pairs(1, &tokens).unwrap(),
            vec![ItemQuantity::new("apple", 3)]
        );
    }
}
