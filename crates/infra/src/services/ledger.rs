//! Stock ledger: the only place stock quantities change.
//!
//! Every transition (add, remove, move) runs in one store transaction and
//! records exactly one movement. Existence checks for the product and the
//! locations happen before the transaction opens; the quantity check happens
//! after the affected rows are locked.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockroom_core::{InventoryError, InventoryResult, LocationId, ProductId};
use stockroom_inventory::{
    MovementFilter, Quantity, Stock, StockFilter, StockKey, StockMovement, TransferRequest,
};

use super::{LocationRegistry, ProductCatalog, store_error};
use crate::config::MovementAudit;
use crate::store::{InventoryStore, StockTransaction};

#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn InventoryStore>,
    catalog: ProductCatalog,
    locations: LocationRegistry,
    audit: MovementAudit,
}

impl StockLedger {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        catalog: ProductCatalog,
        locations: LocationRegistry,
        audit: MovementAudit,
    ) -> Self {
        Self {
            store,
            catalog,
            locations,
            audit,
        }
    }

    /// Add `quantity` units at a location, opening the stock row if needed.
    #[instrument(skip(self), err)]
    pub async fn add_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
    ) -> InventoryResult<Stock> {
        let quantity = Quantity::new(quantity)?;
        self.catalog.get_by_id(product_id).await?;
        self.locations.get_by_id(location_id).await?;

        let key = StockKey::new(product_id, location_id);
        let now = Utc::now();
        let mut tx = self.begin("add_stock", &key).await?;
        let stock = tx
            .increment(key, quantity, now)
            .await
            .map_err(|e| store_error("add_stock", &key, e))?;

        let movement = StockMovement::addition(product_id, location_id, quantity, now);
        self.finish(tx, movement, "add_stock").await?;

        tracing::info!(%key, quantity = stock.quantity, "stock added");
        Ok(stock)
    }

    /// Remove `quantity` units from a location; the row may reach zero.
    #[instrument(skip(self), err)]
    pub async fn remove_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
        quantity: i64,
    ) -> InventoryResult<Stock> {
        let quantity = Quantity::new(quantity)?;
        self.catalog.get_by_id(product_id).await?;
        self.locations.get_by_id(location_id).await?;

        let key = StockKey::new(product_id, location_id);
        let now = Utc::now();
        let mut tx = self.begin("remove_stock", &key).await?;
        let stock = tx
            .decrement(key, quantity, now)
            .await
            .map_err(|e| store_error("remove_stock", &key, e))?;

        let movement = StockMovement::removal(product_id, location_id, quantity, now);
        self.finish(tx, movement, "remove_stock").await?;

        tracing::info!(%key, quantity = stock.quantity, "stock removed");
        Ok(stock)
    }

    /// Transfer `quantity` units between two locations.
    ///
    /// Debit and credit commit together or not at all. Returns the
    /// destination row after the credit.
    #[instrument(skip(self), err)]
    pub async fn move_stock(
        &self,
        product_id: ProductId,
        from: LocationId,
        to: LocationId,
        quantity: i64,
    ) -> InventoryResult<Stock> {
        let request = TransferRequest::new(product_id, from, to, quantity)?;
        self.catalog.get_by_id(product_id).await?;
        self.locations.get_by_id(from).await?;
        self.locations.get_by_id(to).await?;

        let source = request.source();
        let now = Utc::now();
        let mut tx = self.begin("move_stock", &source).await?;

        for key in request.lock_order() {
            let row = tx
                .lock_stock(key)
                .await
                .map_err(|e| store_error("move_stock", &key, e))?;
            if key == source {
                let available = row.map_or(0, |s| s.quantity);
                if available < request.quantity.get() {
                    return Err(InventoryError::failed_precondition(format!(
                        "insufficient stock for {source}: requested {}, available {available}",
                        request.quantity
                    )));
                }
            }
        }

        tx.decrement(source, request.quantity, now)
            .await
            .map_err(|e| store_error("move_stock", &source, e))?;
        let destination = tx
            .increment(request.destination(), request.quantity, now)
            .await
            .map_err(|e| store_error("move_stock", request.destination(), e))?;

        let movement = StockMovement::transfer(product_id, from, to, request.quantity, now)?;
        self.finish(tx, movement, "move_stock").await?;

        tracing::info!(
            %product_id,
            %from,
            %to,
            quantity = request.quantity.get(),
            "stock moved"
        );
        Ok(destination)
    }

    /// Every stock row with `quantity < threshold`.
    pub async fn get_low_stock_report(&self, threshold: i64) -> InventoryResult<Vec<Stock>> {
        self.store
            .stock_below(threshold)
            .await
            .map_err(|e| store_error("get_low_stock_report", format!("threshold {threshold}"), e))
    }

    pub async fn get_stock(
        &self,
        product_id: ProductId,
        location_id: LocationId,
    ) -> InventoryResult<Stock> {
        let key = StockKey::new(product_id, location_id);
        self.store
            .stock(key)
            .await
            .map_err(|e| store_error("get_stock", &key, e))?
            .ok_or_else(|| InventoryError::not_found(format!("no stock for {key}")))
    }

    pub async fn list_stock(&self, filter: StockFilter) -> InventoryResult<Vec<Stock>> {
        self.store
            .list_stock(filter)
            .await
            .map_err(|e| store_error("list_stock", "stock", e))
    }

    /// Audit trail, oldest first.
    pub async fn list_movements(&self, filter: MovementFilter) -> InventoryResult<Vec<StockMovement>> {
        self.store
            .list_movements(filter)
            .await
            .map_err(|e| store_error("list_movements", "movements", e))
    }

    async fn begin(
        &self,
        operation: &'static str,
        key: &StockKey,
    ) -> InventoryResult<Box<dyn StockTransaction>> {
        self.store
            .begin()
            .await
            .map_err(|e| store_error(operation, key, e))
    }

    /// Record `movement` per the audit policy and commit.
    async fn finish(
        &self,
        mut tx: Box<dyn StockTransaction>,
        movement: StockMovement,
        operation: &'static str,
    ) -> InventoryResult<()> {
        let key = format!("movement {}", movement.id);
        match self.audit {
            MovementAudit::Atomic => {
                tx.append_movement(&movement)
                    .await
                    .map_err(|e| store_error(operation, &key, e))?;
                tx.commit()
                    .await
                    .map_err(|e| store_error(operation, &key, e))
            }
            MovementAudit::BestEffort => {
                tx.commit()
                    .await
                    .map_err(|e| store_error(operation, &key, e))?;
                if let Err(err) = self.store.append_movement(&movement).await {
                    tracing::warn!(
                        operation,
                        movement_id = %movement.id,
                        movement_type = %movement.movement_type,
                        error = %err,
                        "stock changed but movement was not recorded"
                    );
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InventoryServices;
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;
    use stockroom_inventory::MovementType;

    struct Fixture {
        services: InventoryServices,
        store: Arc<InMemoryStore>,
        product: ProductId,
        wh1: LocationId,
        wh2: LocationId,
    }

    async fn fixture(audit: MovementAudit) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let services = InventoryServices::new(store.clone(), audit);
        let product = services
            .catalog
            .create_product("ABC123", "Widget", None, Decimal::new(999, 2))
            .await
            .unwrap()
            .id;
        let wh1 = services.locations.create_location("WH-01").await.unwrap().id;
        let wh2 = services.locations.create_location("WH-02").await.unwrap().id;
        Fixture {
            services,
            store,
            product,
            wh1,
            wh2,
        }
    }

    async fn quantity(f: &Fixture, location: LocationId) -> i64 {
        f.services
            .ledger
            .get_stock(f.product, location)
            .await
            .map_or(0, |s| s.quantity)
    }

    #[tokio::test]
    async fn add_opens_then_increments() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        assert_eq!(ledger.add_stock(f.product, f.wh1, 5).await.unwrap().quantity, 5);
        assert_eq!(ledger.add_stock(f.product, f.wh1, 7).await.unwrap().quantity, 12);

        let movements = ledger.list_movements(MovementFilter::default()).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.movement_type == MovementType::Add));
        assert!(movements.iter().all(|m| m.from_location_id.is_none()));
    }

    #[tokio::test]
    async fn add_validates_before_touching_the_store() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        assert!(matches!(
            ledger.add_stock(f.product, f.wh1, 0).await,
            Err(InventoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            ledger.add_stock(ProductId::new(), f.wh1, 1).await,
            Err(InventoryError::NotFound(_))
        ));
        assert!(matches!(
            ledger.add_stock(f.product, LocationId::new(), 1).await,
            Err(InventoryError::NotFound(_))
        ));
        assert!(ledger.list_stock(StockFilter::default()).await.unwrap().is_empty());
        assert!(ledger.list_movements(MovementFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn move_to_same_location_is_invalid() {
        let f = fixture(MovementAudit::Atomic).await;
        f.services.ledger.add_stock(f.product, f.wh1, 10).await.unwrap();
        let err = f
            .services
            .ledger
            .move_stock(f.product, f.wh1, f.wh1, 1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::invalid_argument("source and destination cannot be the same")
        );
    }

    #[tokio::test]
    async fn move_from_empty_source_is_insufficient() {
        let f = fixture(MovementAudit::Atomic).await;
        let err = f
            .services
            .ledger
            .move_stock(f.product, f.wh1, f.wh2, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::FailedPrecondition(_)));
        assert!(err.message().starts_with("insufficient stock"));
        assert_eq!(quantity(&f, f.wh2).await, 0);
    }

    #[tokio::test]
    async fn move_of_everything_leaves_zero() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        ledger.add_stock(f.product, f.wh1, 8).await.unwrap();
        let dest = ledger.move_stock(f.product, f.wh1, f.wh2, 8).await.unwrap();
        assert_eq!(dest.quantity, 8);
        assert_eq!(dest.location_id, f.wh2);
        assert_eq!(quantity(&f, f.wh1).await, 0);
    }

    #[tokio::test]
    async fn remove_records_a_removal() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        ledger.add_stock(f.product, f.wh1, 10).await.unwrap();
        assert_eq!(ledger.remove_stock(f.product, f.wh1, 10).await.unwrap().quantity, 0);
        assert!(matches!(
            ledger.remove_stock(f.product, f.wh1, 1).await,
            Err(InventoryError::FailedPrecondition(_))
        ));

        let movements = ledger
            .list_movements(MovementFilter {
                location_id: Some(f.wh1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].movement_type, MovementType::Remove);
        assert_eq!(movements[1].from_location_id, Some(f.wh1));
        assert_eq!(movements[1].to_location_id, None);
    }

    #[tokio::test]
    async fn add_past_maximum_quantity_is_refused() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        ledger.add_stock(f.product, f.wh1, i64::MAX).await.unwrap();
        let err = ledger.add_stock(f.product, f.wh1, 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::FailedPrecondition(_)));
        assert!(err.message().contains("would overflow"));
        assert_eq!(quantity(&f, f.wh1).await, i64::MAX);
        assert_eq!(ledger.list_movements(MovementFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn move_into_a_full_destination_changes_nothing() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        ledger.add_stock(f.product, f.wh1, 5).await.unwrap();
        ledger.add_stock(f.product, f.wh2, i64::MAX).await.unwrap();

        let err = ledger.move_stock(f.product, f.wh1, f.wh2, 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::FailedPrecondition(_)));
        assert_eq!(quantity(&f, f.wh1).await, 5);
        assert_eq!(quantity(&f, f.wh2).await, i64::MAX);
        assert_eq!(ledger.list_movements(MovementFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn low_stock_report_is_strict() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        ledger.add_stock(f.product, f.wh1, 5).await.unwrap();
        ledger.add_stock(f.product, f.wh2, 10).await.unwrap();

        let low = ledger.get_low_stock_report(10).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].location_id, f.wh1);
        assert!(ledger.get_low_stock_report(5).await.unwrap().is_empty());
        assert!(ledger.get_low_stock_report(0).await.unwrap().is_empty());
        assert!(ledger.get_low_stock_report(-3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn atomic_audit_failure_rolls_back_the_stock_change() {
        let f = fixture(MovementAudit::Atomic).await;
        f.services.ledger.add_stock(f.product, f.wh1, 10).await.unwrap();

        f.store.fail_movement_writes(true);
        let err = f
            .services
            .ledger
            .move_stock(f.product, f.wh1, f.wh2, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Internal(_)));
        assert_eq!(quantity(&f, f.wh1).await, 10);
        assert_eq!(quantity(&f, f.wh2).await, 0);
    }

    #[tokio::test]
    async fn best_effort_audit_failure_keeps_the_stock_change() {
        let f = fixture(MovementAudit::BestEffort).await;
        f.services.ledger.add_stock(f.product, f.wh1, 10).await.unwrap();

        f.store.fail_movement_writes(true);
        let dest = f
            .services
            .ledger
            .move_stock(f.product, f.wh1, f.wh2, 4)
            .await
            .unwrap();
        assert_eq!(dest.quantity, 4);
        assert_eq!(quantity(&f, f.wh1).await, 6);

        f.store.fail_movement_writes(false);
        let movements = f
            .services
            .ledger
            .list_movements(MovementFilter::default())
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test]
    async fn movements_filter_by_product_and_location() {
        let f = fixture(MovementAudit::Atomic).await;
        let ledger = &f.services.ledger;
        let other = f
            .services
            .catalog
            .create_product("XYZ", "Gadget", None, Decimal::ONE)
            .await
            .unwrap()
            .id;
        ledger.add_stock(f.product, f.wh1, 3).await.unwrap();
        ledger.add_stock(other, f.wh2, 3).await.unwrap();
        ledger.move_stock(f.product, f.wh1, f.wh2, 1).await.unwrap();

        let at_wh2 = ledger
            .list_movements(MovementFilter {
                location_id: Some(f.wh2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(at_wh2.len(), 2);

        let for_other = ledger
            .list_movements(MovementFilter {
                product_id: Some(other),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_other.len(), 1);

        let stock_at_wh2 = ledger
            .list_stock(StockFilter {
                location_id: Some(f.wh2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(stock_at_wh2.len(), 2);
    }
}
