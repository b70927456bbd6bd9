use crate::domain::address::{FAMILY_NAME, FAMILY_VERSION, namespace_prefix, wallet_address};
use crate::domain::envelope::TpProcessRequest;
use crate::domain::payload::{ItemQuantity, ShipmentPayload};
use crate::domain::ports::{ApplyOutcome, SkipReason, TransactionContext, TransactionHandler};
use crate::domain::shipment::Account;
use crate::error::{ApplyError, PayloadError, StockError};
use async_trait::async_trait;
use tracing::{debug, info, warn};

impl From<StockError> for SkipReason {
    fn from(err: StockError) -> Self {
        match err {
            StockError::MissingItem { item } => SkipReason::MissingItem { item },
            StockError::Insufficient {
                item,
                available,
                requested,
            } => SkipReason::InsufficientItems {
                item,
                available,
                requested,
            },
            StockError::Overflow { item } => SkipReason::CountOverflow { item },
        }
    }
}

/// Transaction handler for the shipment family.
///
/// Every transaction is one read-modify-write against the signer's account
/// (and, for transfers, the destination account). Policy violations such as
/// unknown shipments or insufficient items are logged and reported as
/// `ApplyOutcome::Skipped`; they never fail the transaction.
pub struct ShipmentHandler {
    namespaces: Vec<String>,
}

impl ShipmentHandler {
    pub fn new() -> Self {
        Self {
            namespaces: vec![namespace_prefix().to_string()],
        }
    }
}

impl Default for ShipmentHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionHandler for ShipmentHandler {
    fn family_name(&self) -> &str {
        FAMILY_NAME
    }

    fn family_versions(&self) -> Vec<String> {
        vec![FAMILY_VERSION.to_string()]
    }

    fn namespaces(&self) -> Vec<String> {
        self.namespaces.clone()
    }

    async fn apply(
        &self,
        request: &TpProcessRequest,
        context: &dyn TransactionContext,
    ) -> Result<ApplyOutcome, ApplyError> {
        let signer = request.header.signer_public_key.as_str();

        let payload = match ShipmentPayload::decode(&request.payload) {
            Ok(payload) => payload,
            Err(PayloadError::UnknownOperation(operation)) => {
                info!(%operation, "Unhandled operation, expected add, remove or transfer");
                return Ok(ApplyOutcome::Skipped(SkipReason::UnknownOperation(
                    operation,
                )));
            }
            Err(e) => {
                warn!(txn = %request.signature, error = %e, "rejecting malformed payload");
                return Err(e.into());
            }
        };

        info!(
            operation = payload.operation(),
            shipment = payload.shipment_id(),
            "applying transaction"
        );

        let outcome = match payload {
            ShipmentPayload::Add {
                shipment_id,
                items,
                place,
            } => apply_add(context, signer, &shipment_id, &items, &place).await?,
            ShipmentPayload::Remove { shipment_id, items } => {
                apply_remove(context, signer, &shipment_id, &items).await?
            }
            ShipmentPayload::Transfer {
                shipment_id,
                place_to,
                to_public_key,
            } => apply_transfer(context, signer, &shipment_id, &place_to, &to_public_key).await?,
        };

        if let ApplyOutcome::Skipped(reason) = &outcome {
            info!(?reason, "transaction left state unchanged");
        }
        Ok(outcome)
    }
}

async fn apply_add(
    context: &dyn TransactionContext,
    signer: &str,
    shipment_id: &str,
    items: &[ItemQuantity],
    place: &str,
) -> Result<ApplyOutcome, ApplyError> {
    let address = wallet_address(signer);
    debug!(key = signer, %address, "add");

    let mut account = load_account(context, &address).await?.unwrap_or_else(|| {
        info!(key = signer, "No previous shipments, creating account");
        Account::new()
    });

    if let Err(e) = account.add_items(shipment_id, items, place) {
        warn!(error = %e, "Add failed");
        return Ok(ApplyOutcome::Skipped(e.into()));
    }

    store_accounts(context, vec![(address, &account)]).await?;
    Ok(ApplyOutcome::Applied)
}

async fn apply_remove(
    context: &dyn TransactionContext,
    signer: &str,
    shipment_id: &str,
    items: &[ItemQuantity],
) -> Result<ApplyOutcome, ApplyError> {
    let address = wallet_address(signer);
    debug!(key = signer, %address, "remove");

    let Some(mut account) = load_account(context, &address).await? else {
        info!(key = signer, "No account for key");
        return Ok(ApplyOutcome::Skipped(SkipReason::NoAccount));
    };

    let Some(shipment) = account.get_mut(shipment_id) else {
        info!(shipment = shipment_id, "Remove failed, shipment ID not found");
        return Ok(ApplyOutcome::Skipped(SkipReason::UnknownShipment(
            shipment_id.to_string(),
        )));
    };

    if let Err(e) = shipment.remove_items(items) {
        info!(error = %e, "Remove failed, an item has a lower count than requested");
        return Ok(ApplyOutcome::Skipped(e.into()));
    }

    store_accounts(context, vec![(address, &account)]).await?;
    Ok(ApplyOutcome::Applied)
}

async fn apply_transfer(
    context: &dyn TransactionContext,
    signer: &str,
    shipment_id: &str,
    place_to: &str,
    to_public_key: &str,
) -> Result<ApplyOutcome, ApplyError> {
    let from_address = wallet_address(signer);
    let to_address = wallet_address(to_public_key);
    debug!(from = %from_address, to = %to_address, "transfer");

    if from_address == to_address {
        info!(key = signer, "Transfer to own account ignored");
        return Ok(ApplyOutcome::Skipped(SkipReason::SelfTransfer));
    }

    let Some(mut from_account) = load_account(context, &from_address).await? else {
        info!(key = signer, "No account (sender) for key");
        return Ok(ApplyOutcome::Skipped(SkipReason::NoAccount));
    };
    let mut to_account = load_account(context, &to_address)
        .await?
        .unwrap_or_default();

    let Some(mut shipment) = from_account.take(shipment_id) else {
        info!(shipment = shipment_id, "Shipment ID is not present");
        return Ok(ApplyOutcome::Skipped(SkipReason::UnknownShipment(
            shipment_id.to_string(),
        )));
    };
    shipment.extend_path(place_to);
    to_account.insert(shipment_id, shipment);

    store_accounts(
        context,
        vec![(from_address, &from_account), (to_address, &to_account)],
    )
    .await?;
    Ok(ApplyOutcome::Applied)
}

/// Reads and decodes the account at `address`; an absent or empty entry is `None`.
async fn load_account(
    context: &dyn TransactionContext,
    address: &str,
) -> Result<Option<Account>, ApplyError> {
    let entries = context.get_state_entries(&[address.to_string()]).await?;
    let Some((_, bytes)) = entries
        .into_iter()
        .find(|(entry_address, bytes)| entry_address == address && !bytes.is_empty())
    else {
        return Ok(None);
    };

    Account::from_state_bytes(&bytes)
        .map(Some)
        .map_err(|e| ApplyError::Internal(format!("account at {} is unreadable: {}", address, e)))
}

/// Writes every account back and requires the context to confirm each address.
async fn store_accounts(
    context: &dyn TransactionContext,
    accounts: Vec<(String, &Account)>,
) -> Result<(), ApplyError> {
    let mut entries = Vec::with_capacity(accounts.len());
    for (address, account) in accounts {
        let bytes = account
            .to_state_bytes()
            .map_err(|e| ApplyError::Internal(e.to_string()))?;
        entries.push((address, bytes));
    }

    let expected: Vec<String> = entries.iter().map(|(address, _)| address.clone()).collect();
    let confirmed = context.set_state_entries(entries).await?;

    for address in expected {
        if !confirmed.contains(&address) {
            return Err(ApplyError::Internal(format!(
                "State Error: write to {} was not confirmed",
                address
            )));
        }
    }
    Ok(())
}
