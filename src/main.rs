//! # Sudsy CLI
//!
//! Command-line interface for the counter label printer.
//!
//! ## Usage
//!
//! ```bash
//! # Find printers nearby
//! sudsy scan
//!
//! # Pair with one (remembered for next time)
//! sudsy connect AA:BB:CC:DD:EE:FF --name Printer1
//!
//! # Print three bag labels for an order
//! sudsy label --order 42 --name "Jane Doe" --bags 3 --same-day
//!
//! # Print a pickup manifest from a JSON array of orders
//! sudsy manifest orders.json
//!
//! # Preview a label without a printer
//! sudsy preview --order 42 --name "Jane Doe" --png label.png
//!
//! # Send to a network receipt printer instead
//! sudsy --tcp 192.168.1.50 print-text "Hello"
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use sudsy::{
    SudsyError,
    ble::{BleAdapter, BtleAdapter, DeviceDescriptor},
    init_logging,
    label::{self, OrderLabel, PrintJob},
    manager::{ConnectionState, PrinterEvent, PrinterManager},
    preview,
    printer::{PrinterConfig, PrinterSettings},
    store::{FileStore, PrinterStore},
    transport::TcpPrinter,
};

/// Sudsy - laundromat label printer utility
#[derive(Parser, Debug)]
#[command(name = "sudsy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Printer profile override (label58, receipt80)
    #[arg(long, global = true, value_parser = PrinterConfig::parse)]
    profile: Option<PrinterConfig>,

    /// Send print jobs to a network printer at HOST[:PORT] instead of BLE
    #[arg(long, global = true, value_name = "HOST")]
    tcp: Option<String>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan for nearby printers
    Scan,

    /// Connect to a printer and remember it
    Connect {
        /// Device id as shown by `scan`
        id: String,

        /// Name to remember it by when the printer does not report one
        #[arg(long)]
        name: Option<String>,
    },

    /// Forget the saved printer
    Disconnect,

    /// Show the saved printer and Bluetooth state
    Status,

    /// Print plain text
    PrintText {
        /// Text to print; words are joined with spaces
        #[arg(required = true)]
        body: Vec<String>,
    },

    /// Print an order label
    Label(LabelArgs),

    /// Print a pickup manifest from a JSON array of orders
    Manifest {
        file: PathBuf,
    },

    /// Render an order label to PNG
    Preview {
        #[command(flatten)]
        label: LabelArgs,

        /// Output file
        #[arg(long, value_name = "FILE")]
        png: PathBuf,
    },
}

#[derive(Args, Debug)]
struct LabelArgs {
    /// Order id
    #[arg(long)]
    order: String,

    /// Customer name
    #[arg(long)]
    name: String,

    #[arg(long)]
    address: Option<String>,

    /// Weight in pounds
    #[arg(long)]
    weight: Option<f32>,

    /// Number of bag labels to print
    #[arg(long, default_value = "1")]
    bags: u32,

    #[arg(long)]
    same_day: bool,

    #[arg(long)]
    notes: Option<String>,
}

impl LabelArgs {
    fn to_order(&self) -> OrderLabel {
        OrderLabel {
            address: self.address.clone(),
            weight: self.weight,
            is_same_day: self.same_day,
            notes: self.notes.clone(),
            ..OrderLabel::new(&self.order, &self.name)
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        if e.needs_bluetooth() {
            eprintln!("Turn Bluetooth on and try again.");
        } else if e.needs_reconnect() {
            eprintln!("Run `sudsy scan` and `sudsy connect <id>` to pick a printer.");
        } else if e.is_retryable() {
            eprintln!("The label may be incomplete; print it again.");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SudsyError> {
    let cli = Cli::parse();

    init_logging(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    })?;

    let mut settings = PrinterSettings::load(cli.settings.as_deref()).await?;
    if let Some(profile) = cli.profile {
        settings.printer = profile;
    }

    match cli.command {
        Commands::Scan => scan(settings).await,
        Commands::Connect { id, name } => {
            let mut manager = open_manager(settings).await?;
            let result = manager.connect(&DeviceDescriptor::new(id, name)).await;
            manager.shutdown().await;
            let active = result?;
            println!("Connected to {}", active.device.label());
            Ok(())
        }
        Commands::Disconnect => {
            FileStore::open_default()?.clear().await?;
            println!("Saved printer forgotten");
            Ok(())
        }
        Commands::Status => status().await,
        Commands::PrintText { body } => {
            print_request(settings, cli.tcp.as_deref(), Request::Text(body.join(" "))).await
        }
        Commands::Label(args) => {
            let request = Request::Order {
                order: args.to_order(),
                bags: args.bags,
            };
            print_request(settings, cli.tcp.as_deref(), request).await
        }
        Commands::Manifest { file } => {
            let orders = read_orders(&file).await?;
            print_request(settings, cli.tcp.as_deref(), Request::Manifest(orders)).await
        }
        Commands::Preview { label, png } => {
            let program = PrintJob::OrderLabel(label.to_order())
                .build(&settings, Local::now().naive_local());
            let bytes = preview::render_preview(&program, &settings)?;
            tokio::fs::write(&png, bytes).await?;
            println!("Saved to {}", png.display());
            Ok(())
        }
    }
}

async fn open_manager(
    settings: PrinterSettings,
) -> Result<PrinterManager<BtleAdapter, FileStore>, SudsyError> {
    let adapter = BtleAdapter::new()
        .await?
        .with_lookup_window(settings.reconnect_scan());
    PrinterManager::new(adapter, FileStore::open_default()?, settings).await
}

async fn scan(settings: PrinterSettings) -> Result<(), SudsyError> {
    let mut manager = open_manager(settings).await?;
    let mut events = manager.start_scan().await;
    let mut seen = 0;

    while let Ok(event) = events.recv().await {
        match event {
            PrinterEvent::DevicesUpdated(devices) => {
                for device in devices.iter().skip(seen) {
                    println!("{}  {}", device.id, device.label());
                }
                seen = devices.len().max(seen);
            }
            PrinterEvent::ScanFailed(reason) => {
                eprintln!("Scan failed: {}", reason);
                break;
            }
            PrinterEvent::StateChanged(ConnectionState::Disconnected) => break,
            _ => {}
        }
    }

    if seen == 0 {
        println!("No printers found");
    }
    manager.shutdown().await;
    Ok(())
}

async fn status() -> Result<(), SudsyError> {
    let store = FileStore::open_default()?;
    match store.load().await? {
        Some(saved) => println!("Saved printer: {} ({})", saved.name, saved.id),
        None => println!("No saved printer"),
    }

    match BtleAdapter::new().await {
        Ok(adapter) => println!("Bluetooth: {:?}", adapter.state().await),
        Err(e) => println!("Bluetooth: {}", e),
    }
    Ok(())
}

async fn read_orders(path: &Path) -> Result<Vec<OrderLabel>, SudsyError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// What a print command asked for.
enum Request {
    Text(String),
    Order { order: OrderLabel, bags: u32 },
    Manifest(Vec<OrderLabel>),
}

impl Request {
    fn jobs(&self) -> Result<Vec<PrintJob>, SudsyError> {
        match self {
            Request::Text(body) => Ok(vec![PrintJob::PlainText { body: body.clone() }]),
            Request::Order { order, bags: 1 } => Ok(vec![PrintJob::OrderLabel(order.clone())]),
            Request::Order { order, bags } => label::bag_labels(order, *bags),
            Request::Manifest(orders) => Ok(vec![label::pickup_sheet(orders)?]),
        }
    }

    async fn print(
        &self,
        manager: &mut PrinterManager<BtleAdapter, FileStore>,
    ) -> Result<(), SudsyError> {
        match self {
            Request::Text(body) => manager.print_text(body).await,
            Request::Order { order, bags: 1 } => manager.print_order_tag(order).await,
            Request::Order { order, bags } => manager.print_multiple_bag_labels(order, *bags).await,
            Request::Manifest(orders) => manager.print_pickup_sheet(orders).await,
        }
    }
}

/// Send to a network printer if a host was given, otherwise to the saved
/// BLE printer.
async fn print_request(
    settings: PrinterSettings,
    tcp: Option<&str>,
    request: Request,
) -> Result<(), SudsyError> {
    if let Some(host) = tcp {
        let jobs = request.jobs()?;
        let printer = TcpPrinter::new(host);
        for job in &jobs {
            printer
                .send(&job.encode(&settings, Local::now().naive_local()))
                .await?;
        }
        println!("Printed {} job(s) to {}", jobs.len(), printer.address());
        return Ok(());
    }

    let mut manager = open_manager(settings).await?;
    let result = async {
        let active = manager.reconnect_saved_printer().await?;
        request.print(&mut manager).await?;
        Ok::<_, SudsyError>(active)
    }
    .await;
    manager.shutdown().await;

    let active = result?;
    println!("Printed on {}", active.device.label());
    Ok(())
}
