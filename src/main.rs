//! prefer
//!
//! Loads a configuration file by identifier and prints it as JSON, or watches
//! it and prints each update.

use anyhow::Result;
use clap::Parser;
use prefer::cli::Cli;
use prefer::logging::init_logging;
use prefer::{Configuration, UPDATE_CHANNEL_CAPACITY};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log, cli.verbose)?;

    let configuration = Configuration::new(cli.identifier.as_str());

    if !cli.watch {
        let mut value = Value::Null;
        configuration.reload(&mut value)?;
        println!("{}", configuration.identifier());
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    configuration
        .watch_with_cancel(Value::Null, tx, cancel.clone())
        .await?;
    info!(identifier = %configuration.identifier(), "Watching for changes (Ctrl-C to stop)");

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, stopping watch");
        }
        interrupt.cancel();
    });

    while let Some(value) = rx.recv().await {
        println!("{}", configuration.identifier());
        println!("{}", serde_json::to_string_pretty(&value)?);
    }

    Ok(())
}
