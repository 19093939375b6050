//! Entity store boundary.
//!
//! Services talk to storage only through these traits. Two implementations
//! exist: [`InMemoryStore`] for tests/dev and [`PostgresStore`] for
//! production. Both enforce the same uniqueness and referential rules.
//!
//! Lookups return `Ok(None)` for a missing row, so "not found" is always
//! distinguishable from a storage failure.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_core::{LocationId, ProductId};
use stockroom_inventory::{
    InsufficientStock, Location, MovementFilter, Quantity, Stock, StockFilter, StockKey,
    StockMovement,
};
use stockroom_products::{Product, Sku};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Entity store operation error.
///
/// These are storage-level outcomes. The services translate them into
/// [`stockroom_core::InventoryError`] with operation context attached.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate SKU, location name...).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced product or location does not exist.
    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// A debit targeted a pair with no stock row.
    #[error("no stock recorded for {0}")]
    MissingStock(StockKey),

    /// A debit would take the quantity below zero.
    #[error(transparent)]
    InsufficientStock(#[from] InsufficientStock),

    /// A credit would take the quantity past the column's range.
    #[error("stock quantity out of range: {0}")]
    QuantityOverflow(String),

    /// Connectivity, decoding or any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert a new product. A duplicate SKU is a `UniqueViolation`.
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError>;

    /// All products in creation order.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Insert a new location. A duplicate name is a `UniqueViolation`.
    async fn insert_location(&self, location: &Location) -> Result<(), StoreError>;

    async fn location_by_id(&self, id: LocationId) -> Result<Option<Location>, StoreError>;

    async fn location_by_name(&self, name: &str) -> Result<Option<Location>, StoreError>;

    /// All locations in creation order.
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError>;
}

#[async_trait]
pub trait StockStore: Send + Sync {
    async fn stock(&self, key: StockKey) -> Result<Option<Stock>, StoreError>;

    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<Stock>, StoreError>;

    /// Stock rows with `quantity < threshold` (strict).
    async fn stock_below(&self, threshold: i64) -> Result<Vec<Stock>, StoreError>;

    /// Audit trail, oldest first.
    async fn list_movements(&self, filter: MovementFilter)
    -> Result<Vec<StockMovement>, StoreError>;

    /// Append a movement outside of any transaction.
    async fn append_movement(&self, movement: &StockMovement) -> Result<(), StoreError>;

    /// Open a unit of work for stock mutations.
    async fn begin(&self) -> Result<Box<dyn StockTransaction>, StoreError>;
}

/// Unit of work over stock rows and movements.
///
/// Changes become visible only on [`commit`](StockTransaction::commit).
/// Dropping the transaction without committing discards every change, so an
/// early return or a cancelled future always rolls back.
#[async_trait]
pub trait StockTransaction: Send {
    /// Read a stock row and hold its lock until the transaction ends.
    async fn lock_stock(&mut self, key: StockKey) -> Result<Option<Stock>, StoreError>;

    /// Upsert-with-increment: create the row with `quantity` or add to it.
    async fn increment(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError>;

    /// Decrement-with-floor-check: fails with `MissingStock` or
    /// `InsufficientStock` instead of going below zero.
    async fn decrement(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError>;

    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Everything the services need from storage.
pub trait InventoryStore: ProductStore + LocationStore + StockStore {}

impl<T> InventoryStore for T where T: ProductStore + LocationStore + StockStore + ?Sized {}
