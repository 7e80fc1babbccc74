//! FarmXchange marketplace client.
//!
//! # Architecture Overview
//!
//! ```text
//!   wallet endpoint / key env var
//!        │
//!        ▼
//!   ┌──────────────┐    ┌────────────────┐    ┌─────────────────┐
//!   │ProviderBridge│───▶│ SessionContext │───▶│ BindingFactory  │
//!   │ accounts,    │    │ Disconnected / │    │ address + ABI + │
//!   │ connect      │    │ Connected      │    │ signer → handle │
//!   └──────────────┘    └───────┬────────┘    └─────────────────┘
//!                               │ bound() per action
//!                               ▼
//!              ┌─────────┬──────────┬───────────┐
//!              │  admin  │ products │ dashboard │  → notifications
//!              └─────────┴──────────┴───────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use farmxchange::blockchain::{BindingFactory, Deployment, ProviderBridge, RpcWallet};
use farmxchange::config::{load_config, AppConfig};
use farmxchange::controllers::{
    AdminController, DashboardController, Level, Notification, Notifier, Outcome, ProductForm,
    ProductUpdate, ProductsController,
};
use farmxchange::observability::logging::init_logging;
use farmxchange::SessionContext;

#[derive(Parser)]
#[command(name = "farmxchange")]
#[command(about = "Client for the FarmXchange produce marketplace", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session restored from an existing wallet grant
    Status,
    /// Request account access from the wallet
    Connect,
    /// Register the connected account as a farmer
    RegisterFarmer { name: String },
    /// Look up a farmer by address
    Farmer { address: String },
    /// List all products
    Products,
    /// Add a product
    AddProduct {
        #[arg(long)]
        name: String,
        /// Price in ETH, e.g. 1.5
        #[arg(long)]
        price: String,
        #[arg(long)]
        quantity: String,
        #[arg(long)]
        ipfs_hash: String,
    },
    /// Update a product's price, quantity and metadata
    UpdateProduct {
        #[arg(long)]
        id: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        quantity: String,
        #[arg(long)]
        ipfs_hash: String,
    },
    /// Buy one unit of a product at its listed price
    Purchase {
        #[arg(long)]
        id: String,
    },
    /// Show farmer and product counts
    Dashboard,
}

impl Commands {
    fn needs_connection(&self) -> bool {
        !matches!(self, Commands::Status)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(
        wallet_enabled = config.wallet.enabled,
        contract = %config.deployment.contract_address,
        "Configuration loaded"
    );

    let deployment = Deployment::load(&config.deployment)?;
    let wallet = RpcWallet::from_config(&config.wallet, &config.inclusion)?;
    let bridge = ProviderBridge::new(wallet);
    if !bridge.is_available() {
        tracing::warn!("Wallet disabled; commands that need an account will fail");
    }
    let session = Arc::new(SessionContext::new(bridge, BindingFactory::new(deployment)));
    let (notifier, mut notifications) = Notifier::channel();

    if let Err(e) = session.initialize_from_existing_grant().await {
        tracing::warn!(error = %e, "Could not restore previous session");
    }

    if cli.command.needs_connection() && !session.snapshot().is_connected() {
        if let Err(e) = session.connect().await {
            notifier.failure(&e, "Failed to connect wallet.");
        }
    }

    match cli.command {
        Commands::Status | Commands::Connect => {
            match session.snapshot().short_account() {
                Some(account) => notifier.info(format!("Connected: {account}")),
                None => notifier.info("Not connected"),
            }
        }
        Commands::RegisterFarmer { name } => {
            let mut admin = AdminController::new(session.clone(), notifier.clone());
            admin.register_farmer(&name).await;
        }
        Commands::Farmer { address } => {
            let mut admin = AdminController::new(session.clone(), notifier.clone());
            if admin.get_farmer_details(&address).await == Outcome::Applied {
                if let Some(details) = admin.farmer_details() {
                    println!("{}", serde_json::to_string_pretty(details)?);
                }
            }
        }
        Commands::Products => {
            let mut products = ProductsController::new(session.clone(), notifier.clone());
            if products.load_products().await == Outcome::Applied {
                println!("{}", serde_json::to_string_pretty(products.products())?);
            }
        }
        Commands::AddProduct {
            name,
            price,
            quantity,
            ipfs_hash,
        } => {
            let mut products = ProductsController::new(session.clone(), notifier.clone());
            let form = ProductForm {
                name,
                price,
                quantity,
                ipfs_hash,
            };
            if products.add_product(&form).await == Outcome::Applied {
                println!("{}", serde_json::to_string_pretty(products.products())?);
            }
        }
        Commands::UpdateProduct {
            id,
            price,
            quantity,
            ipfs_hash,
        } => {
            let mut products = ProductsController::new(session.clone(), notifier.clone());
            let form = ProductUpdate {
                id,
                price,
                quantity,
                ipfs_hash,
            };
            if products.update_product(&form).await == Outcome::Applied {
                println!("{}", serde_json::to_string_pretty(products.products())?);
            }
        }
        Commands::Purchase { id } => {
            let mut products = ProductsController::new(session.clone(), notifier.clone());
            products.load_products().await;
            let listed = products
                .products()
                .iter()
                .find(|p| p.id.to_string() == id.trim())
                .map(|p| p.price.clone());
            match listed {
                Some(price) => {
                    products.purchase_product(&id, &price).await;
                }
                None => notifier.error(format!("Product {id} not found.")),
            }
        }
        Commands::Dashboard => {
            let mut dashboard = DashboardController::new(session.clone(), notifier.clone());
            if dashboard.fetch_counts().await == Outcome::Applied {
                let counts = dashboard.counts();
                println!("Farmers:  {}", counts.farmers);
                println!("Products: {}", counts.products);
            }
        }
    }

    drop(notifier);
    print_notifications(&mut notifications);
    Ok(())
}

fn print_notifications(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(note) = notifications.try_recv() {
        match note.level {
            Level::Error => eprintln!("error: {}", note.message),
            Level::Success | Level::Info => println!("{}", note.message),
        }
    }
}
