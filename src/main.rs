use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use parkpay::application::ledger::TransactionLedger;
use parkpay::application::payments::PaymentService;
use parkpay::application::reservations::ReservationService;
use parkpay::config::Config;
use parkpay::domain::ports::{SpaceStoreBox, TransactionStoreBox};
use parkpay::domain::space::{SpaceFilter, SpaceId};
use parkpay::domain::transaction::ReferenceId;
use parkpay::infrastructure::in_memory::{InMemorySpaceStore, InMemoryTransactionStore};
use parkpay::interfaces::csv::payment_reader::PaymentReader;
use parkpay::interfaces::csv::space_reader::SpaceReader;
use parkpay::interfaces::csv::space_writer::SpaceWriter;
use parkpay::interfaces::csv::transaction_writer::TransactionWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// JSON configuration file (merchant info, receipt remarks, default method).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage parking spaces and their reservations
    #[command(subcommand)]
    Spaces(SpacesCommand),
    /// Process and inspect payments
    #[command(subcommand)]
    Payments(PaymentsCommand),
}

/// Every command except `import` reads spaces registered by an earlier run,
/// which needs `--db-path` and the `storage-rocksdb` feature.
#[derive(Subcommand)]
enum SpacesCommand {
    /// Register every space listed in an inventory CSV
    Import { input: PathBuf },
    /// List spaces, optionally filtered
    List {
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long = "type")]
        space_type: Option<String>,
        #[arg(long)]
        available: Option<bool>,
    },
    /// List available spaces in a zone
    Available { zone: String },
    /// Reserve an available space
    Reserve { id: SpaceId },
    /// Release an occupied space
    Release { id: SpaceId },
    /// Overwrite a space's status (available, occupied, ...)
    Status { id: SpaceId, status: String },
    /// Delete a space
    Delete { id: SpaceId },
}

#[derive(Subcommand)]
enum PaymentsCommand {
    /// Process every payment request in a CSV file
    Process { input: PathBuf },
    /// List recorded transactions
    List {
        #[arg(long)]
        reference: Option<ReferenceId>,
    },
    /// Show one transaction as JSON
    Show { transaction_id: Uuid },
    /// Print the receipt of a successful transaction as JSON
    Receipt { transaction_id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_path(path).into_diagnostic()?,
        None => Config::default(),
    };
    let stores = open_stores(cli.db_path)?;

    match cli.command {
        Command::Spaces(command) => {
            if !stores.persistent && command.reads_previous_runs() {
                eprintln!(
                    "WARNING: 'spaces {}' runs against an empty in-memory store. Use --db-path with the 'storage-rocksdb' feature to keep spaces between runs.",
                    command.name()
                );
            }
            let service = ReservationService::new(stores.spaces);
            run_spaces(&service, command).await
        }
        Command::Payments(command) => {
            let ledger = TransactionLedger::new(stores.transactions, config.payments);
            let service = PaymentService::new(ledger);
            run_payments(&service, command).await
        }
    }
}

impl SpacesCommand {
    fn name(&self) -> &'static str {
        match self {
            SpacesCommand::Import { .. } => "import",
            SpacesCommand::List { .. } => "list",
            SpacesCommand::Available { .. } => "available",
            SpacesCommand::Reserve { .. } => "reserve",
            SpacesCommand::Release { .. } => "release",
            SpacesCommand::Status { .. } => "status",
            SpacesCommand::Delete { .. } => "delete",
        }
    }

    fn reads_previous_runs(&self) -> bool {
        !matches!(self, SpacesCommand::Import { .. })
    }
}

struct Stores {
    spaces: SpaceStoreBox,
    transactions: TransactionStoreBox,
    persistent: bool,
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    use parkpay::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok(Stores {
            spaces: Box::new(store.clone()),
            transactions: Box::new(store),
            persistent: true,
        });
    }
    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> Stores {
    Stores {
        spaces: Box::new(InMemorySpaceStore::new()),
        transactions: Box::new(InMemoryTransactionStore::new()),
        persistent: false,
    }
}

async fn run_spaces(service: &ReservationService, command: SpacesCommand) -> Result<()> {
    let spaces = match command {
        SpacesCommand::Import { input } => {
            let file = File::open(input).into_diagnostic()?;
            let mut registered = Vec::new();
            for space in SpaceReader::new(file).spaces() {
                match space {
                    Ok(space) => match service.register(space).await {
                        Ok(space) => registered.push(space),
                        Err(e) => eprintln!("Error registering space: {}", e),
                    },
                    Err(e) => eprintln!("Error reading space: {}", e),
                }
            }
            registered
        }
        SpacesCommand::List {
            location,
            zone,
            space_type,
            available,
        } => {
            let filter = SpaceFilter {
                location,
                zone,
                space_type,
                available,
            };
            service.filter(&filter).await.into_diagnostic()?
        }
        SpacesCommand::Available { zone } => {
            service.available_in_zone(&zone).await.into_diagnostic()?
        }
        SpacesCommand::Reserve { id } => vec![service.reserve(id).await.into_diagnostic()?],
        SpacesCommand::Release { id } => vec![service.release(id).await.into_diagnostic()?],
        SpacesCommand::Status { id, status } => {
            vec![service.set_status_token(id, &status).await.into_diagnostic()?]
        }
        SpacesCommand::Delete { id } => {
            service.delete(id).await.into_diagnostic()?;
            Vec::new()
        }
    };

    let stdout = io::stdout();
    SpaceWriter::new(stdout.lock())
        .write_spaces(&spaces)
        .into_diagnostic()
}

async fn run_payments(service: &PaymentService, command: PaymentsCommand) -> Result<()> {
    let stdout = io::stdout();
    match command {
        PaymentsCommand::Process { input } => {
            let file = File::open(input).into_diagnostic()?;
            let mut writer = TransactionWriter::new(stdout.lock());
            for request in PaymentReader::new(file).requests() {
                match request {
                    Ok(request) => match service.process_payment(request).await {
                        Ok(tx) => writer.write_transaction(&tx).into_diagnostic()?,
                        Err(e) => eprintln!("Error processing payment: {}", e),
                    },
                    Err(e) => eprintln!("Error reading payment: {}", e),
                }
            }
            writer.flush().into_diagnostic()
        }
        PaymentsCommand::List { reference } => {
            let transactions = match reference {
                Some(reference) => service.list_by_reference(reference).await,
                None => service.list_all().await,
            }
            .into_diagnostic()?;
            let mut writer = TransactionWriter::new(stdout.lock());
            for tx in &transactions {
                writer.write_transaction(tx).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()
        }
        PaymentsCommand::Show { transaction_id } => {
            let tx = service.transaction(transaction_id).await.into_diagnostic()?;
            serde_json::to_writer_pretty(stdout.lock(), &tx).into_diagnostic()
        }
        PaymentsCommand::Receipt { transaction_id } => {
            let receipt = service.receipt(transaction_id).await.into_diagnostic()?;
            serde_json::to_writer_pretty(stdout.lock(), &receipt).into_diagnostic()
        }
    }
}
