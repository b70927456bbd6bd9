use crate::domain::address::{FAMILY_NAME, FAMILY_VERSION, sha512_hex, wallet_address};
use crate::domain::envelope::{Batch, BatchHeader, BatchList, Transaction, TransactionHeader};
use crate::domain::payload::{ItemQuantity, ShipmentPayload};
use crate::domain::ports::LedgerGateway;
use crate::domain::shipment::Account;
use crate::error::{Result, ShipmentError};
use crate::infrastructure::signing::Secp256k1Signer;
use prost::Message;
use tracing::{debug, info};

/// Builds, signs and submits shipment transactions for one key, and reads
/// back the account owned by that key.
///
/// Submission succeeds once the gateway accepts the batch; the client does not
/// wait for the transaction to be committed.
pub struct ShipmentClient<G: LedgerGateway> {
    signer: Secp256k1Signer,
    gateway: G,
    address: String,
}

impl<G: LedgerGateway> ShipmentClient<G> {
    pub fn new(signer: Secp256k1Signer, gateway: G) -> Self {
        let address = wallet_address(signer.public_key_hex());
        Self {
            signer,
            gateway,
            address,
        }
    }

    pub fn public_key(&self) -> &str {
        self.signer.public_key_hex()
    }

    /// Address of the signer's account.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn add(
        &self,
        shipment_id: &str,
        items: Vec<ItemQuantity>,
        place: &str,
    ) -> Result<()> {
        let payload = ShipmentPayload::add(shipment_id, items, place)?;
        self.submit(&payload).await
    }

    pub async fn remove(&self, shipment_id: &str, items: Vec<ItemQuantity>) -> Result<()> {
        let payload = ShipmentPayload::remove(shipment_id, items)?;
        self.submit(&payload).await
    }

    pub async fn transfer(
        &self,
        shipment_id: &str,
        place_to: &str,
        destination_public_key: &str,
    ) -> Result<()> {
        let payload = self.transfer_payload(shipment_id, place_to, destination_public_key)?;
        self.submit(&payload).await
    }

    /// Builds a validated transfer payload, refusing transfers to the signer itself.
    pub fn transfer_payload(
        &self,
        shipment_id: &str,
        place_to: &str,
        destination_public_key: &str,
    ) -> Result<ShipmentPayload> {
        if destination_public_key == self.public_key() {
            return Err(ShipmentError::ValidationError(
                "Cannot transfer a shipment to its own account".to_string(),
            ));
        }
        Ok(ShipmentPayload::transfer(
            shipment_id,
            place_to,
            destination_public_key,
        )?)
    }

    /// Reads the signer's account; an address without state is an empty account.
    pub async fn read_account(&self) -> Result<Account> {
        match self.gateway.fetch_state(&self.address).await? {
            Some(bytes) if !bytes.is_empty() => Ok(Account::from_state_bytes(&bytes)?),
            _ => {
                debug!(address = %self.address, "no state found, treating account as empty");
                Ok(Account::new())
            }
        }
    }

    /// Total count of `item` across all shipments held by the signer.
    pub async fn item_count(&self, item: &str) -> Result<u64> {
        Ok(self.read_account().await?.item_count(item))
    }

    pub async fn shipment_path(&self, shipment_id: &str) -> Result<Option<String>> {
        Ok(self
            .read_account()
            .await?
            .path_of(shipment_id)
            .map(str::to_string))
    }

    pub async fn submit(&self, payload: &ShipmentPayload) -> Result<()> {
        let batch_list = self.batch_for(payload)?;
        info!(
            operation = payload.operation(),
            shipment = payload.shipment_id(),
            "submitting batch"
        );
        self.gateway.submit_batches(batch_list.encode_to_vec()).await
    }

    /// Wraps `payload` in a signed transaction inside a single signed batch.
    pub fn batch_for(&self, payload: &ShipmentPayload) -> Result<BatchList> {
        payload.validate()?;
        let payload_bytes = payload.encode();

        let mut addresses = vec![self.address.clone()];
        if let ShipmentPayload::Transfer { to_public_key, .. } = payload {
            addresses.push(wallet_address(to_public_key));
        }

        let header = TransactionHeader {
            batcher_public_key: self.public_key().to_string(),
            dependencies: vec![],
            family_name: FAMILY_NAME.to_string(),
            family_version: FAMILY_VERSION.to_string(),
            inputs: addresses.clone(),
            nonce: format!("{:016x}", rand::random::<u64>()),
            outputs: addresses,
            payload_sha512: sha512_hex(&payload_bytes),
            signer_public_key: self.public_key().to_string(),
        }
        .encode_to_vec();

        let transaction = Transaction {
            header_signature: self.signer.sign(&header),
            header,
            payload: payload_bytes,
        };

        let batch_header = BatchHeader {
            signer_public_key: self.public_key().to_string(),
            transaction_ids: vec![transaction.header_signature.clone()],
        }
        .encode_to_vec();

        let batch = Batch {
            header_signature: self.signer.sign(&batch_header),
            header: batch_header,
            transactions: vec![transaction],
            trace: false,
        };

        Ok(BatchList {
            batches: vec![batch],
        })
    }
}
