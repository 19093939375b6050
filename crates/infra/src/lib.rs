//! Infrastructure layer: entity store, configuration and the inventory services.

pub mod config;
pub mod services;
pub mod store;


pub use config::{AppConfig, ConfigError, DatabaseConfig, MovementAudit};
pub use services::{
    InventoryServices, LocationRegistry, ProductCatalog, StockLedger, with_deadline,
};
pub use store::{InMemoryStore, InventoryStore, PostgresStore, StoreError};
