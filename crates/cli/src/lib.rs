//! `stockroom` command-line client.
//!
//! Commands run directly against the inventory services; results are
//! rendered as a text table, or JSON with `--json`.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use stockroom_core::{InventoryError, InventoryResult, LocationId, ProductId};
use stockroom_infra::{AppConfig, InventoryServices};
use stockroom_inventory::{Location, MovementFilter, StockFilter};
use stockroom_products::Product;

pub use commands::{LocationCommand, ProductCommand, StockCommand};

#[derive(Debug, Parser)]
#[command(name = "stockroom")]
#[command(about = "Inventory operations CLI")]
pub struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Product {
        #[command(subcommand)]
        command: ProductCommand,
    },
    Location {
        #[command(subcommand)]
        command: LocationCommand,
    },
    Stock {
        #[command(subcommand)]
        command: StockCommand,
    },
}

impl Commands {
    /// Operation name used in deadline errors and logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Commands::Product { command } => match command {
                ProductCommand::Create { .. } => "create_product",
                ProductCommand::Get { .. } => "get_product",
                ProductCommand::List => "list_products",
            },
            Commands::Location { command } => match command {
                LocationCommand::Create { .. } => "create_location",
                LocationCommand::Get { .. } => "get_location",
                LocationCommand::List => "list_locations",
            },
            Commands::Stock { command } => match command {
                StockCommand::Add { .. } => "add_stock",
                StockCommand::Remove { .. } => "remove_stock",
                StockCommand::Move { .. } => "move_stock",
                StockCommand::Get { .. } => "get_stock",
                StockCommand::List { .. } => "list_stock",
                StockCommand::Low { .. } => "get_low_stock_report",
                StockCommand::History { .. } => "list_movements",
            },
        }
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &InventoryError) -> u8 {
    match err {
        InventoryError::Internal(_) => 1,
        InventoryError::InvalidArgument(_) => 2,
        InventoryError::NotFound(_) => 3,
        InventoryError::AlreadyExists(_) => 4,
        InventoryError::FailedPrecondition(_) => 5,
        InventoryError::DeadlineExceeded(_) => 6,
    }
}

/// Refuse configurations without `DATABASE_URL`; an in-memory store would
/// start empty on every invocation.
pub fn require_database(config: &AppConfig) -> anyhow::Result<()> {
    if config.database.is_none() {
        anyhow::bail!("DATABASE_URL must be set; the CLI keeps no state between runs without it");
    }
    Ok(())
}

/// Execute one command and render its result.
pub async fn run(cli: Cli, services: &InventoryServices) -> InventoryResult<String> {
    let json = cli.json;
    match cli.command {
        Commands::Product { command } => run_product(command, services, json).await,
        Commands::Location { command } => run_location(command, services, json).await,
        Commands::Stock { command } => run_stock(command, services, json).await,
    }
}

async fn run_product(
    command: ProductCommand,
    services: &InventoryServices,
    json: bool,
) -> InventoryResult<String> {
    let catalog = &services.catalog;
    let product = match command {
        ProductCommand::Create {
            sku,
            name,
            description,
            price,
        } => catalog.create_product(&sku, &name, description, price).await?,
        ProductCommand::Get { product } => resolve_product(services, &product).await?,
        ProductCommand::List => {
            let all = catalog.list_products().await?;
            return output::render(json, &all, || output::products(&all));
        }
    };
    output::render(json, &product, || {
        output::products(std::slice::from_ref(&product))
    })
}

async fn run_location(
    command: LocationCommand,
    services: &InventoryServices,
    json: bool,
) -> InventoryResult<String> {
    let registry = &services.locations;
    let location = match command {
        LocationCommand::Create { name } => registry.create_location(&name).await?,
        LocationCommand::Get { location } => resolve_location(services, &location).await?,
        LocationCommand::List => {
            let all = registry.list_locations().await?;
            return output::render(json, &all, || output::locations(&all));
        }
    };
    output::render(json, &location, || {
        output::locations(std::slice::from_ref(&location))
    })
}

async fn run_stock(
    command: StockCommand,
    services: &InventoryServices,
    json: bool,
) -> InventoryResult<String> {
    let ledger = &services.ledger;
    let row = match command {
        StockCommand::Add {
            product,
            location,
            quantity,
        } => {
            let (p, l) = resolve_pair(services, &product, &location).await?;
            ledger.add_stock(p, l, quantity).await?
        }
        StockCommand::Remove {
            product,
            location,
            quantity,
        } => {
            let (p, l) = resolve_pair(services, &product, &location).await?;
            ledger.remove_stock(p, l, quantity).await?
        }
        StockCommand::Move {
            product,
            from,
            to,
            quantity,
        } => {
            let (p, from) = resolve_pair(services, &product, &from).await?;
            let to = resolve_location(services, &to).await?.id;
            ledger.move_stock(p, from, to, quantity).await?
        }
        StockCommand::Get { product, location } => {
            let (p, l) = resolve_pair(services, &product, &location).await?;
            ledger.get_stock(p, l).await?
        }
        StockCommand::List { product, location } => {
            let filter = StockFilter {
                product_id: resolve_optional_product(services, product.as_deref()).await?,
                location_id: resolve_optional_location(services, location.as_deref()).await?,
            };
            let rows = ledger.list_stock(filter).await?;
            return output::render(json, &rows, || output::stock(&rows));
        }
        StockCommand::Low { threshold } => {
            let rows = ledger.get_low_stock_report(threshold).await?;
            return output::render(json, &rows, || output::stock(&rows));
        }
        StockCommand::History { product, location } => {
            let filter = MovementFilter {
                product_id: resolve_optional_product(services, product.as_deref()).await?,
                location_id: resolve_optional_location(services, location.as_deref()).await?,
            };
            let rows = ledger.list_movements(filter).await?;
            return output::render(json, &rows, || output::movements(&rows));
        }
    };
    output::render(json, &row, || output::stock(std::slice::from_ref(&row)))
}

/// A product reference is an id when it parses as one, otherwise a SKU.
async fn resolve_product(services: &InventoryServices, reference: &str) -> InventoryResult<Product> {
    match reference.parse::<ProductId>() {
        Ok(id) => services.catalog.get_by_id(id).await,
        Err(_) => services.catalog.get_by_sku(reference).await,
    }
}

/// A location reference is an id when it parses as one, otherwise a name.
async fn resolve_location(
    services: &InventoryServices,
    reference: &str,
) -> InventoryResult<Location> {
    match reference.parse::<LocationId>() {
        Ok(id) => services.locations.get_by_id(id).await,
        Err(_) => services.locations.get_by_name(reference).await,
    }
}

async fn resolve_pair(
    services: &InventoryServices,
    product: &str,
    location: &str,
) -> InventoryResult<(ProductId, LocationId)> {
    let product = resolve_product(services, product).await?;
    let location = resolve_location(services, location).await?;
    Ok((product.id, location.id))
}

async fn resolve_optional_product(
    services: &InventoryServices,
    reference: Option<&str>,
) -> InventoryResult<Option<ProductId>> {
    match reference {
        Some(r) => Ok(Some(resolve_product(services, r).await?.id)),
        None => Ok(None),
    }
}

async fn resolve_optional_location(
    services: &InventoryServices,
    reference: Option<&str>,
) -> InventoryResult<Option<LocationId>> {
    match reference {
        Some(r) => Ok(Some(resolve_location(services, r).await?.id)),
        None => Ok(None),
    }
}
