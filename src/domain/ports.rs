use super::envelope::TpProcessRequest;
use crate::error::{ApplyError, ContextError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Raw state access granted to a handler for the duration of one transaction.
#[async_trait]
pub trait TransactionContext: Send + Sync {
    /// Returns the entries that exist among `addresses`; absent addresses are omitted.
    async fn get_state_entries(
        &self,
        addresses: &[String],
    ) -> std::result::Result<Vec<(String, Vec<u8>)>, ContextError>;

    /// Writes `entries` and returns the addresses the platform confirmed.
    async fn set_state_entries(
        &self,
        entries: Vec<(String, Vec<u8>)>,
    ) -> std::result::Result<Vec<String>, ContextError>;
}

/// What a handler did with a transaction it accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Skipped(SkipReason),
}

/// Policy violations that leave state untouched without failing the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoAccount,
    UnknownShipment(String),
    MissingItem { item: String },
    InsufficientItems {
        item: String,
        available: u64,
        requested: u64,
    },
    CountOverflow { item: String },
    UnknownOperation(String),
    SelfTransfer,
}

#[async_trait]
pub trait TransactionHandler: Send + Sync {
    fn family_name(&self) -> &str;
    fn family_versions(&self) -> Vec<String>;
    fn namespaces(&self) -> Vec<String>;

    async fn apply(
        &self,
        request: &TpProcessRequest,
        context: &dyn TransactionContext,
    ) -> std::result::Result<ApplyOutcome, ApplyError>;
}

/// Committed global state, addressed by 70-hex-char addresses.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, address: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()>;
    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>>;
}

pub type StateStoreBox = Box<dyn StateStore>;

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Box<T> {
    async fn get(&self, address: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(address).await
    }

    async fn put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        (**self).put(entries).await
    }

    async fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        (**self).entries().await
    }
}

/// Client side view of the ledger: batch submission and state queries.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submits a serialized `BatchList`. Success means the gateway accepted it.
    async fn submit_batches(&self, batch_list: Vec<u8>) -> Result<()>;

    async fn fetch_state(&self, address: &str) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
impl<T: LedgerGateway + ?Sized> LedgerGateway for Arc<T> {
    async fn submit_batches(&self, batch_list: Vec<u8>) -> Result<()> {
        (**self).submit_batches(batch_list).await
    }

    async fn fetch_state(&self, address: &str) -> Result<Option<Vec<u8>>> {
        (**self).fetch_state(address).await
    }
}
