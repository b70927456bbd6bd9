use clap::Parser;
use miette::{IntoDiagnostic, Result};
use shipment_tracking::interfaces::cli::{Cli, execute};
use shipment_tracking::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = cli.config();
    let message = execute(cli.command, &config).await.into_diagnostic()?;
    println!("{message}");

    Ok(())
}
