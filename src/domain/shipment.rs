use crate::domain::payload::ItemQuantity;
use crate::error::{StateCodecError, StockError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator between places in a shipment's path.
pub const PATH_SEPARATOR: &str = "->";

/// Version written into every stored account value.
pub const STATE_VERSION: u32 = 1;

/// A shipment: the places it went through and the items it carries.
///
/// Serialized as a flat map where `path` is reserved and every other key is an
/// item name mapped to its count.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shipment {
    pub path: String,
    #[serde(flatten)]
    pub items: BTreeMap<String, u64>,
}

impl Shipment {
    pub fn new(place: impl Into<String>) -> Self {
        Self {
            path: place.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn count(&self, item: &str) -> Option<u64> {
        self.items.get(item).copied()
    }

    /// Adds every quantity, creating missing items.
    ///
    /// Nothing is changed if any resulting count would overflow.
    pub fn add_items(&mut self, quantities: &[ItemQuantity]) -> Result<(), StockError> {
        for q in quantities {
            let current = self.count(&q.name).unwrap_or(0);
            if current.checked_add(q.count).is_none() {
                return Err(StockError::Overflow {
                    item: q.name.clone(),
                });
            }
        }
        for q in quantities {
            *self.items.entry(q.name.clone()).or_insert(0) += q.count;
        }
        Ok(())
    }

    /// Removes every quantity, or nothing at all.
    ///
    /// Each listed item must already be present with at least the requested count.
    pub fn remove_items(&mut self, quantities: &[ItemQuantity]) -> Result<(), StockError> {
        for q in quantities {
            match self.count(&q.name) {
                None => {
                    return Err(StockError::MissingItem {
                        item: q.name.clone(),
                    });
                }
                Some(available) if available < q.count => {
                    return Err(StockError::Insufficient {
                        item: q.name.clone(),
                        available,
                        requested: q.count,
                    });
                }
                Some(_) => {}
            }
        }
        for q in quantities {
            if let Some(count) = self.items.get_mut(&q.name) {
                *count -= q.count;
            }
        }
        Ok(())
    }

    pub fn extend_path(&mut self, place: &str) {
        self.path.push_str(PATH_SEPARATOR);
        self.path.push_str(place);
    }
}

/// All shipments currently held by one account, keyed by shipment ID.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account {
    shipments: BTreeMap<String, Shipment>,
}

#[derive(Serialize)]
struct VersionedAccountRef<'a> {
    version: u32,
    shipments: &'a Account,
}

#[derive(Deserialize)]
struct VersionedAccount {
    version: u32,
    shipments: Account,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shipment_id: &str) -> Option<&Shipment> {
        self.shipments.get(shipment_id)
    }

    pub fn get_mut(&mut self, shipment_id: &str) -> Option<&mut Shipment> {
        self.shipments.get_mut(shipment_id)
    }

    pub fn contains(&self, shipment_id: &str) -> bool {
        self.shipments.contains_key(shipment_id)
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    /// Adds items to a shipment, creating it at `place` if it does not exist yet.
    ///
    /// The path of an existing shipment is left untouched.
    pub fn add_items(
        &mut self,
        shipment_id: &str,
        quantities: &[ItemQuantity],
        place: &str,
    ) -> Result<(), StockError> {
        self.shipments
            .entry(shipment_id.to_string())
            .or_insert_with(|| Shipment::new(place))
            .add_items(quantities)
    }

    /// Detaches a shipment from this account.
    pub fn take(&mut self, shipment_id: &str) -> Option<Shipment> {
        self.shipments.remove(shipment_id)
    }

    pub fn insert(&mut self, shipment_id: impl Into<String>, shipment: Shipment) {
        self.shipments.insert(shipment_id.into(), shipment);
    }

    /// Total count of `item` over every shipment in the account.
    pub fn item_count(&self, item: &str) -> u64 {
        self.shipments
            .values()
            .filter_map(|s| s.count(item))
            .fold(0u64, u64::saturating_add)
    }

    pub fn path_of(&self, shipment_id: &str) -> Option<&str> {
        self.get(shipment_id).map(|s| s.path.as_str())
    }

    /// Encodes the account as a versioned state value.
    ///
    /// Maps are ordered, so equal accounts always encode to identical bytes.
    pub fn to_state_bytes(&self) -> Result<Vec<u8>, StateCodecError> {
        let value = VersionedAccountRef {
            version: STATE_VERSION,
            shipments: self,
        };
        Ok(serde_json::to_vec(&value)?)
    }

    pub fn from_state_bytes(bytes: &[u8]) -> Result<Self, StateCodecError> {
        let value: VersionedAccount = serde_json::from_slice(bytes)?;
        if value.version != STATE_VERSION {
            return Err(StateCodecError::UnsupportedVersion(value.version));
        }
        Ok(value.shipments)
    }
}
