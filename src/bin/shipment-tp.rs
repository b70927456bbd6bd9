use clap::{ArgAction, Parser};
use miette::{IntoDiagnostic, Result};
use shipment_tracking::application::ledger::{BatchStatus, LocalLedger};
use shipment_tracking::domain::ports::{ApplyOutcome, StateStoreBox};
use shipment_tracking::infrastructure::in_memory::InMemoryStateStore;
use shipment_tracking::interfaces::batch_file::read_batch_list;
use shipment_tracking::interfaces::state_writer::StateWriter;
use shipment_tracking::logging;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "shipment-tp",
    author,
    version,
    about = "Applies shipment batch lists to a local ledger and prints the resulting state",
    long_about = None
)]
struct Cli {
    /// Serialized batch list files, applied in order
    #[arg(required = true)]
    batches: Vec<PathBuf>,

    /// Path to persistent state database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let store = open_store(cli.db_path)?;
    let ledger = LocalLedger::new(store);

    for path in &cli.batches {
        let bytes = match read_batch_list(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error applying batch file {}: {}", path.display(), e);
                continue;
            }
        };
        let receipts = ledger.apply_batch_list(&bytes).await.into_diagnostic()?;
        for receipt in receipts {
            match receipt.status {
                BatchStatus::Committed(outcomes) => {
                    for outcome in outcomes {
                        match outcome {
                            ApplyOutcome::Applied => {
                                info!(batch = %receipt.batch_id, "transaction applied")
                            }
                            ApplyOutcome::Skipped(reason) => {
                                warn!(batch = %receipt.batch_id, ?reason, "transaction skipped")
                            }
                        }
                    }
                }
                BatchStatus::Invalid(reason) => {
                    eprintln!(
                        "Error applying batch file {}: batch {} is invalid: {}",
                        path.display(),
                        receipt.batch_id,
                        reason
                    );
                }
            }
        }
    }

    let accounts = ledger.accounts().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = StateWriter::new(stdout.lock());
    writer.write_accounts(&accounts).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<StateStoreBox> {
    use shipment_tracking::infrastructure::rocksdb::RocksDBStateStore;

    Ok(match db_path {
        Some(path) => Box::new(RocksDBStateStore::open(path).into_diagnostic()?),
        None => Box::new(InMemoryStateStore::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<StateStoreBox> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryStateStore::new()))
}
