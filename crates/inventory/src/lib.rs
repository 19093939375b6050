//! Inventory domain module.
//!
//! Locations, per-location stock quantities and the movement audit trail,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). The stock ledger service in `stockroom-infra` drives these rules
//! against a store.

pub mod location;
pub mod movement;
pub mod stock;
pub mod transfer;

pub use location::{Location, NewLocation};
pub use movement::{MovementFilter, MovementType, StockMovement};
pub use stock::{InsufficientStock, Quantity, Stock, StockFilter, StockKey, StockOverflow, is_low_stock};
pub use transfer::TransferRequest;
