use clap::Subcommand;
use rust_decimal::Decimal;

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Register a product under a new SKU.
    Create {
        #[arg(long)]
        sku: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        price: Decimal,
    },
    /// Show one product, by id or SKU.
    Get { product: String },
    List,
}

#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    Create { name: String },
    /// Show one location, by id or name.
    Get { location: String },
    List,
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    Add {
        #[arg(long)]
        product: String,
        #[arg(long)]
        location: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    Remove {
        #[arg(long)]
        product: String,
        #[arg(long)]
        location: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Transfer units between two locations.
    Move {
        #[arg(long)]
        product: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
    },
    Get {
        #[arg(long)]
        product: String,
        #[arg(long)]
        location: String,
    },
    List {
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Stock rows strictly below the threshold.
    Low {
        #[arg(long, allow_negative_numbers = true)]
        threshold: i64,
    },
    /// Movement audit trail, oldest first.
    History {
        #[arg(long)]
        product: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
}
