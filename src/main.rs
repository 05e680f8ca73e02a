use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::config::Settings;
use paygate::domain::ports::PaymentStoreRef;
use paygate::infrastructure::in_memory::InMemoryPaymentStore;
#[cfg(feature = "storage-rocksdb")]
use paygate::infrastructure::rocksdb::RocksDbPaymentStore;
use paygate::interfaces::csv::event_reader::EventReader;
use paygate::interfaces::csv::payment_writer::PaymentWriter;
use paygate::interfaces::replay::{EventReplayer, is_recoverable};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment events CSV file
    input: PathBuf,

    /// Gateway settings JSON file. Without it the demo gateways are registered.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<PathBuf>) -> Result<PaymentStoreRef> {
    Ok(match db_path {
        Some(path) => Arc::new(RocksDbPaymentStore::open(path)?),
        None => Arc::new(InMemoryPaymentStore::new()),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<PathBuf>) -> Result<PaymentStoreRef> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryPaymentStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paygate=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let registry = settings.apply()?;
    let replayer = EventReplayer::new(registry, open_store(cli.db_path)?);

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for (line, event) in reader.events().enumerate() {
        match event {
            Ok(event) => match replayer.apply(&event).await {
                Ok(payment) => {
                    tracing::debug!(line = line + 2, payment = %payment.id, status = %payment.status(), "event applied");
                }
                Err(e) if is_recoverable(&e) => {
                    tracing::warn!(line = line + 2, "Error processing event: {}", e);
                }
                Err(e) => return Err(e.into()),
            },
            Err(e) => {
                tracing::warn!(line = line + 2, "Error reading event: {}", e);
            }
        }
    }

    let payments = replayer.into_results().await?;

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer.write_payments(&payments)?;

    Ok(())
}
