use crate::application::handler::ShipmentHandler;
use crate::domain::address::{is_well_formed_address, sha512_hex};
use crate::domain::envelope::{Batch, BatchHeader, BatchList, TpProcessRequest};
use crate::domain::ports::{
    ApplyOutcome, LedgerGateway, StateStore, TransactionContext, TransactionHandler,
};
use crate::domain::shipment::Account;
use crate::error::{ApplyError, ContextError, Result, ShipmentError};
use crate::infrastructure::signing::verify_signature;
use async_trait::async_trait;
use prost::Message;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of submitting one batch to the local ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub batch_id: String,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every transaction ran; one outcome per transaction, in batch order.
    Committed(Vec<ApplyOutcome>),
    /// The batch was rejected as a whole and left state untouched.
    Invalid(String),
}

/// A single-process stand-in for the validator.
///
/// Batches are verified the way the validator does it (signatures, payload
/// digests, transaction family), then each transaction runs through the
/// handler against a context restricted to its declared inputs and outputs.
/// Writes are buffered and committed to the store only when the whole batch
/// succeeds. Batches run one at a time, from verification to commit.
pub struct LocalLedger<S: StateStore> {
    store: S,
    handler: Box<dyn TransactionHandler>,
    commit: Mutex<()>,
}

impl<S: StateStore> LocalLedger<S> {
    /// Creates a ledger serving the shipment family.
    pub fn new(store: S) -> Self {
        Self::with_handler(store, Box::new(ShipmentHandler::new()))
    }

    pub fn with_handler(store: S, handler: Box<dyn TransactionHandler>) -> Self {
        Self {
            store,
            handler,
            commit: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decodes a serialized `BatchList` and applies its batches in order.
    pub async fn apply_batch_list(&self, bytes: &[u8]) -> Result<Vec<BatchReceipt>> {
        let batch_list = BatchList::decode(bytes)?;
        let mut receipts = Vec::with_capacity(batch_list.batches.len());
        for batch in &batch_list.batches {
            receipts.push(self.apply_batch(batch).await?);
        }
        Ok(receipts)
    }

    /// Applies one batch atomically.
    ///
    /// Returns an error only for internal faults; an invalid batch is reported
    /// in its receipt.
    pub async fn apply_batch(&self, batch: &Batch) -> Result<BatchReceipt> {
        let batch_id = batch.header_signature.clone();
        let _commit = self.commit.lock().await;

        let requests = match self.verify_batch(batch) {
            Ok(requests) => requests,
            Err(reason) => {
                warn!(batch = %batch_id, %reason, "rejecting batch");
                return Ok(BatchReceipt {
                    batch_id,
                    status: BatchStatus::Invalid(reason),
                });
            }
        };

        let pending = Mutex::new(HashMap::new());
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            let context = ScopedContext {
                store: &self.store,
                pending: &pending,
                inputs: &request.header.inputs,
                outputs: &request.header.outputs,
                namespaces: self.handler.namespaces(),
            };

            match self.handler.apply(request, &context).await {
                Ok(outcome) => {
                    debug!(txn = %request.signature, ?outcome, "transaction applied");
                    outcomes.push(outcome);
                }
                Err(ApplyError::InvalidTransaction(reason)) => {
                    warn!(batch = %batch_id, txn = %request.signature, %reason, "invalid transaction");
                    return Ok(BatchReceipt {
                        batch_id,
                        status: BatchStatus::Invalid(reason),
                    });
                }
                Err(e @ ApplyError::Internal(_)) => return Err(e.into()),
            }
        }

        let writes: Vec<(String, Vec<u8>)> = pending.into_inner().into_iter().collect();
        debug!(batch = %batch_id, writes = writes.len(), "committing batch");
        self.store.put(writes).await?;

        info!(batch = %batch_id, transactions = outcomes.len(), "batch committed");
        Ok(BatchReceipt {
            batch_id,
            status: BatchStatus::Committed(outcomes),
        })
    }

    fn verify_batch(&self, batch: &Batch) -> std::result::Result<Vec<TpProcessRequest>, String> {
        let header = BatchHeader::decode(batch.header.as_slice())
            .map_err(|e| format!("batch header is malformed: {}", e))?;

        if !verify_signature(&header.signer_public_key, &batch.header, &batch.header_signature) {
            return Err("batch signature is invalid".to_string());
        }
        if batch.transactions.is_empty() {
            return Err("batch has no transactions".to_string());
        }

        let ids: Vec<&str> = batch
            .transactions
            .iter()
            .map(|t| t.header_signature.as_str())
            .collect();
        if header.transaction_ids.iter().map(String::as_str).ne(ids.iter().copied()) {
            return Err("batch header does not list its transactions".to_string());
        }

        let versions = self.handler.family_versions();
        batch
            .transactions
            .iter()
            .map(|transaction| {
                let request = TpProcessRequest::from_transaction(transaction)
                    .map_err(|e| format!("transaction header is malformed: {}", e))?;
                let txn_header = &request.header;

                if !verify_signature(
                    &txn_header.signer_public_key,
                    &transaction.header,
                    &transaction.header_signature,
                ) {
                    return Err(format!(
                        "transaction {} has an invalid signature",
                        transaction.header_signature
                    ));
                }
                if txn_header.batcher_public_key != header.signer_public_key {
                    return Err("transaction was not batched by the batch signer".to_string());
                }
                if txn_header.payload_sha512 != sha512_hex(&transaction.payload) {
                    return Err("payload does not match its digest".to_string());
                }
                if txn_header.family_name != self.handler.family_name()
                    || !versions.contains(&txn_header.family_version)
                {
                    return Err(format!(
                        "no handler for family {} {}",
                        txn_header.family_name, txn_header.family_version
                    ));
                }
                Ok(request)
            })
            .collect()
    }

    /// Every account in the store, keyed by address.
    pub async fn accounts(&self) -> Result<BTreeMap<String, Account>> {
        let mut accounts = BTreeMap::new();
        for (address, bytes) in self.store.entries().await? {
            accounts.insert(address, Account::from_state_bytes(&bytes)?);
        }
        Ok(accounts)
    }
}

#[async_trait]
impl<S: StateStore> LedgerGateway for LocalLedger<S> {
    async fn submit_batches(&self, batch_list: Vec<u8>) -> Result<()> {
        for receipt in self.apply_batch_list(&batch_list).await? {
            if let BatchStatus::Invalid(reason) = receipt.status {
                return Err(ShipmentError::GatewayError(format!(
                    "batch {} is invalid: {}",
                    receipt.batch_id, reason
                )));
            }
        }
        Ok(())
    }

    async fn fetch_state(&self, address: &str) -> Result<Option<Vec<u8>>> {
        self.store.get(address).await
    }
}

/// State view for one transaction: reads see earlier writes of the same batch,
/// and access is limited to the transaction's declared addresses.
struct ScopedContext<'a, S: StateStore> {
    store: &'a S,
    pending: &'a Mutex<HashMap<String, Vec<u8>>>,
    inputs: &'a [String],
    outputs: &'a [String],
    namespaces: Vec<String>,
}

fn covered(address: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| address.starts_with(prefix.as_str()))
}

#[async_trait]
impl<'a, S: StateStore> TransactionContext for ScopedContext<'a, S> {
    async fn get_state_entries(
        &self,
        addresses: &[String],
    ) -> std::result::Result<Vec<(String, Vec<u8>)>, ContextError> {
        let mut entries = Vec::with_capacity(addresses.len());
        for address in addresses {
            if !covered(address, self.inputs) {
                return Err(ContextError::Authorization(address.clone()));
            }
            let buffered = self.pending.lock().await.get(address).cloned();
            let value = match buffered {
                Some(value) => Some(value),
                None => self
                    .store
                    .get(address)
                    .await
                    .map_err(|e| ContextError::Store(e.to_string()))?,
            };
            if let Some(value) = value {
                entries.push((address.clone(), value));
            }
        }
        Ok(entries)
    }

    async fn set_state_entries(
        &self,
        entries: Vec<(String, Vec<u8>)>,
    ) -> std::result::Result<Vec<String>, ContextError> {
        for (address, _) in &entries {
            if !is_well_formed_address(address)
                || !covered(address, self.outputs)
                || !covered(address, &self.namespaces)
            {
                return Err(ContextError::Authorization(address.clone()));
            }
        }

        let mut pending = self.pending.lock().await;
        let mut confirmed = Vec::with_capacity(entries.len());
        for (address, value) in entries {
            confirmed.push(address.clone());
            pending.insert(address, value);
        }
        Ok(confirmed)
    }
}
