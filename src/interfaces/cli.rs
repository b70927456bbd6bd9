use crate::application::client::ShipmentClient;
use crate::config::{ClientConfig, DEFAULT_URL};
use crate::domain::payload::{ItemQuantity, ShipmentPayload};
use crate::error::{Result, ShipmentError};
use crate::infrastructure::rest::RestGateway;
use crate::infrastructure::signing::Secp256k1Signer;
use crate::interfaces::batch_file::write_batch_list;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "shipment",
    author,
    version,
    about = "Track shipments of goods between places on the ledger",
    long_about = None
)]
pub struct Cli {
    /// REST API of the ledger platform
    #[arg(long, global = true, env = "SHIPMENT_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Directory holding `<place>.priv` and `<place>.pub` key files (default ~/.sawtooth/keys)
    #[arg(long, global = true, env = "SHIPMENT_KEY_DIR")]
    pub key_dir: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.url.clone(), self.key_dir.clone())
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add items to a shipment held at a place
    Add {
        shipment_id: String,
        place_name: String,
        /// Number of item types that follow
        #[arg(value_name = "N")]
        type_count: String,
        /// Item name and count pairs
        #[arg(value_name = "ITEM COUNT")]
        items: Vec<String>,
        /// Write the signed batch list to a file instead of submitting it
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Remove items from a shipment held at a place
    Remove {
        shipment_id: String,
        place_name: String,
        #[arg(value_name = "N")]
        type_count: String,
        #[arg(value_name = "ITEM COUNT")]
        items: Vec<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Move a shipment from one place to another
    Transfer {
        shipment_id: String,
        place_from: String,
        place_to: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count items of one type held at a place
    #[command(name = "getcount")]
    GetCount { item_name: String, place_name: String },
    /// Show the path a shipment has travelled
    Path {
        shipment_id: String,
        place_name: String,
    },
    /// Generate a key pair for a place
    Keygen {
        place_name: String,
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },
}

/// Runs one command and returns the message to print on success.
pub async fn execute(command: Command, config: &ClientConfig) -> Result<String> {
    match command {
        Command::Add {
            shipment_id,
            place_name,
            type_count,
            items,
            output,
        } => {
            let items = parse_items(&type_count, &items)?;
            let client = client_for(config, &place_name)?;
            match output {
                Some(path) => {
                    let payload = ShipmentPayload::add(shipment_id, items, place_name)?;
                    write_batch(&client, &payload, &path)
                }
                None => {
                    client.add(&shipment_id, items, &place_name).await?;
                    Ok("Add operation completed".to_string())
                }
            }
        }
        Command::Remove {
            shipment_id,
            place_name,
            type_count,
            items,
            output,
        } => {
            let items = parse_items(&type_count, &items)?;
            let client = client_for(config, &place_name)?;
            match output {
                Some(path) => {
                    let payload = ShipmentPayload::remove(shipment_id, items)?;
                    write_batch(&client, &payload, &path)
                }
                None => {
                    client.remove(&shipment_id, items).await?;
                    Ok("Remove operation completed".to_string())
                }
            }
        }
        Command::Transfer {
            shipment_id,
            place_from,
            place_to,
            output,
        } => {
            if place_from == place_to {
                return Err(ShipmentError::ValidationError(format!(
                    "Cannot transfer item to self: {place_from}"
                )));
            }
            let client = client_for(config, &place_from)?;
            let destination = config.keys().load_public_key(&place_to)?;
            match output {
                Some(path) => {
                    let payload = client.transfer_payload(&shipment_id, &place_to, &destination)?;
                    write_batch(&client, &payload, &path)
                }
                None => {
                    client
                        .transfer(&shipment_id, &place_to, &destination)
                        .await?;
                    Ok("Transfer completed".to_string())
                }
            }
        }
        Command::GetCount {
            item_name,
            place_name,
        } => {
            let client = client_for(config, &place_name)?;
            let count = client.item_count(&item_name).await?;
            Ok(format!("No of items of type {item_name} is {count}"))
        }
        Command::Path {
            shipment_id,
            place_name,
        } => {
            let client = client_for(config, &place_name)?;
            Ok(match client.shipment_path(&shipment_id).await? {
                Some(path) => format!("Path of the shipment {shipment_id} is {path}"),
                None => "Shipment is not found at the mentioned place".to_string(),
            })
        }
        Command::Keygen { place_name, force } => {
            let signer = Secp256k1Signer::generate();
            let (private_path, public_path) =
                config.keys().store_key_pair(&place_name, &signer, force)?;
            info!(place = %place_name, public_key = signer.public_key_hex(), "generated key pair");
            Ok(format!(
                "Wrote private key to {}\nWrote public key to {}",
                private_path.display(),
                public_path.display()
            ))
        }
    }
}

fn parse_items(type_count: &str, tokens: &[String]) -> Result<Vec<ItemQuantity>> {
    let n = ItemQuantity::parse_type_count(type_count)?;
    Ok(ItemQuantity::parse_pairs(n, tokens)?)
}

fn client_for(config: &ClientConfig, place: &str) -> Result<ShipmentClient<RestGateway>> {
    let signer = config.keys().load_signer(place)?;
    Ok(ShipmentClient::new(signer, config.gateway()))
}

fn write_batch(
    client: &ShipmentClient<RestGateway>,
    payload: &ShipmentPayload,
    path: &Path,
) -> Result<String> {
    let batch_list = client.batch_for(payload)?;
    write_batch_list(path, &batch_list)?;
    Ok(format!("Batch written to {}", path.display()))
}
