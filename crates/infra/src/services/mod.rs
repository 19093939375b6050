//! Inventory services: product catalog, location registry and stock ledger.
//!
//! ```text
//! adapters (HTTP, CLI)
//!   ↓
//! ProductCatalog / LocationRegistry / StockLedger
//!   ↓
//! InventoryStore (in-memory or Postgres)
//! ```
//!
//! Services are built once at startup and handed to the adapters. They hold
//! no entity state of their own; every call works on request-scoped data.

pub mod catalog;
pub mod ledger;
pub mod locations;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use stockroom_core::{InventoryError, InventoryResult};

use crate::config::{AppConfig, MovementAudit};
use crate::store::{InMemoryStore, InventoryStore, PostgresStore, StoreError};

pub use catalog::ProductCatalog;
pub use ledger::StockLedger;
pub use locations::LocationRegistry;

/// The three services, wired against one store.
#[derive(Clone)]
pub struct InventoryServices {
    pub catalog: ProductCatalog,
    pub locations: LocationRegistry,
    pub ledger: StockLedger,
}

impl InventoryServices {
    pub fn new(store: Arc<dyn InventoryStore>, audit: MovementAudit) -> Self {
        let catalog = ProductCatalog::new(store.clone());
        let locations = LocationRegistry::new(store.clone());
        let ledger = StockLedger::new(store, catalog.clone(), locations.clone(), audit);
        Self {
            catalog,
            locations,
            ledger,
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), MovementAudit::default())
    }

    /// Wire against the store selected by `config`.
    pub async fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn InventoryStore> = match &config.database {
            Some(db) => {
                tracing::info!(max_connections = db.max_connections, "connecting to postgres");
                Arc::new(PostgresStore::connect(db).await?)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store");
                Arc::new(InMemoryStore::new())
            }
        };
        Ok(Self::new(store, config.movement_audit))
    }
}

/// Run a service call under an optional deadline.
///
/// On expiry the call's future is dropped, which releases its connection and
/// rolls back any open transaction, and `DeadlineExceeded` is returned.
pub async fn with_deadline<T, F>(
    deadline: Option<Duration>,
    operation: &str,
    call: F,
) -> InventoryResult<T>
where
    F: Future<Output = InventoryResult<T>>,
{
    match deadline {
        None => call.await,
        Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
            Err(InventoryError::deadline_exceeded(format!(
                "{operation} did not complete within {}ms",
                limit.as_millis()
            )))
        }),
    }
}

/// Translate a store error into the service taxonomy, with context.
pub(crate) fn store_error(
    operation: &'static str,
    key: impl core::fmt::Display,
    err: StoreError,
) -> InventoryError {
    match err {
        StoreError::UniqueViolation(_) => {
            InventoryError::already_exists(format!("{key} already exists"))
        }
        StoreError::ForeignKeyViolation(msg) => InventoryError::not_found(msg),
        StoreError::MissingStock(_) => {
            InventoryError::failed_precondition(format!("insufficient stock: no stock for {key}"))
        }
        StoreError::InsufficientStock(e) => InventoryError::failed_precondition(format!(
            "insufficient stock for {key}: requested {}, available {}",
            e.requested, e.available
        )),
        StoreError::QuantityOverflow(_) => {
            InventoryError::failed_precondition(format!("stock quantity for {key} would overflow"))
        }
        StoreError::Backend(msg) => {
            tracing::error!(operation, %key, error = %msg, "store operation failed");
            InventoryError::internal(format!("{operation} failed for {key}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_inventory::InsufficientStock;

    #[tokio::test]
    async fn deadline_expiry_is_reported() {
        let err = with_deadline(Some(Duration::from_millis(5)), "slow_call", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, InventoryError>(())
        })
        .await
        .unwrap_err();
        assert_eq!(
            err,
            InventoryError::deadline_exceeded("slow_call did not complete within 5ms")
        );
    }

    #[tokio::test]
    async fn no_deadline_runs_to_completion() {
        let value = with_deadline(None, "fast_call", async { Ok::<_, InventoryError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn store_errors_map_to_taxonomy() {
        assert!(matches!(
            store_error("insert_product", "sku 'X'", StoreError::UniqueViolation("k".into())),
            InventoryError::AlreadyExists(_)
        ));
        assert!(matches!(
            store_error(
                "move_stock",
                "pair",
                StoreError::InsufficientStock(InsufficientStock { available: 1, requested: 2 })
            ),
            InventoryError::FailedPrecondition(_)
        ));
        assert_eq!(
            store_error("add_stock", "pair", StoreError::QuantityOverflow("bigint".into())),
            InventoryError::failed_precondition("stock quantity for pair would overflow")
        );
        let internal = store_error("list_products", "catalog", StoreError::Backend("SELECT secret".into()));
        assert_eq!(internal, InventoryError::internal("list_products failed for catalog"));
    }
}
