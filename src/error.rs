use thiserror::Error;

/// Reasons a payload cannot be decoded or is not safe to encode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("payload is empty")]
    Empty,
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("'{operation}' expects {expected} fields, found {found}")]
    FieldCount {
        operation: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{declared} item types need {expected} item/count fields, found {found}")]
    ItemFieldCount {
        declared: usize,
        expected: usize,
        found: usize,
    },
    #[error("item type count '{0}' is not a positive integer")]
    InvalidItemTypeCount(String),
    #[error("count '{count}' for item '{item}' is not a non-negative integer")]
    InvalidCount { item: String, count: String },
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{field} '{value}' contains the ',' delimiter")]
    Delimiter { field: &'static str, value: String },
    #[error("'path' is reserved and cannot be used as an item name")]
    ReservedItemName,
    #[error("item '{0}' is listed more than once")]
    DuplicateItem(String),
    #[error("'{0}' is not a hex encoded compressed public key")]
    InvalidPublicKey(String),
}

/// Reasons an item update on a shipment cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("item '{item}' is not part of the shipment")]
    MissingItem { item: String },
    #[error("item '{item}' has {available}, cannot remove {requested}")]
    Insufficient {
        item: String,
        available: u64,
        requested: u64,
    },
    #[error("count of item '{item}' would overflow")]
    Overflow { item: String },
}

/// Failures converting an account to or from its stored state value.
#[derive(Error, Debug)]
pub enum StateCodecError {
    #[error("malformed state value: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported state version {0}")]
    UnsupportedVersion(u32),
}

/// Failures raised by a transaction context while reading or writing state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("transaction is not authorized to access address {0}")]
    Authorization(String),
    #[error("state store failure: {0}")]
    Store(String),
}

/// Result of applying a transaction that did not complete.
///
/// `InvalidTransaction` rejects only the transaction; `Internal` signals a
/// platform-level fault and aborts processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PayloadError> for ApplyError {
    fn from(err: PayloadError) -> Self {
        ApplyError::InvalidTransaction(err.to_string())
    }
}

impl From<ContextError> for ApplyError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Authorization(_) => ApplyError::InvalidTransaction(err.to_string()),
            ContextError::Store(_) => ApplyError::Internal(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShipmentError {
    #[error("Payload error: {0}")]
    PayloadError(#[from] PayloadError),
    #[error("Apply error: {0}")]
    ApplyError(#[from] ApplyError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Key error: {0}")]
    KeyError(String),
    #[error("State error: {0}")]
    StateError(#[from] StateCodecError),
    #[error("Gateway error: {0}")]
    GatewayError(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Envelope decode error: {0}")]
    EnvelopeError(#[from] prost::DecodeError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, ShipmentError>;
