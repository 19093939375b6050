use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockroom_core::{Entity, LocationId, ProductId};
use stockroom_inventory::{
    Location, MovementFilter, Quantity, Stock, StockFilter, StockKey, StockMovement,
    is_low_stock,
};
use stockroom_products::{Product, Sku};

use super::{LocationStore, ProductStore, StockStore, StockTransaction, StoreError};

/// Rows of one entity type, kept in insertion order.
#[derive(Debug)]
struct Table<E> {
    rows: Vec<E>,
}

impl<E> Default for Table<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E: Entity + Clone> Table<E> {
    fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.iter().find(|row| row.id() == id)
    }

    fn contains(&self, id: E::Id) -> bool {
        self.get(id).is_some()
    }

    fn find(&self, pred: impl Fn(&E) -> bool) -> Option<&E> {
        self.rows.iter().find(|row| pred(row))
    }

    fn push(&mut self, row: E) {
        self.rows.push(row);
    }

    fn all(&self) -> Vec<E> {
        self.rows.clone()
    }
}

#[derive(Debug, Default)]
struct State {
    products: Table<Product>,
    locations: Table<Location>,
    stock: BTreeMap<StockKey, Stock>,
    movements: Vec<StockMovement>,
}

impl State {
    fn check_references(&self, product_id: ProductId, locations: &[LocationId]) -> Result<(), StoreError> {
        if !self.products.contains(product_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "product {product_id} does not exist"
            )));
        }
        for location_id in locations {
            if !self.locations.contains(*location_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "location {location_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    fn check_movement(&self, movement: &StockMovement) -> Result<(), StoreError> {
        movement
            .validate()
            .map_err(|e| StoreError::Backend(e.message().to_string()))?;
        let locations: Vec<LocationId> = movement
            .from_location_id
            .into_iter()
            .chain(movement.to_location_id)
            .collect();
        self.check_references(movement.product_id, &locations)
    }
}

/// In-memory entity store.
///
/// Intended for tests/dev. A single mutex guards all state; a transaction
/// holds it for its whole lifetime, which serializes stock mutations the way
/// row locks would (more coarsely).
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    fail_movement_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent movement append fail with a backend error.
    ///
    /// Test hook for the audit-write failure paths.
    pub fn fail_movement_writes(&self, fail: bool) {
        self.fail_movement_writes.store(fail, Ordering::SeqCst);
    }

    fn movement_write_check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(
                "movement write failed (injected)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.products.find(|p| p.sku == product.sku).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "sku '{}' already exists",
                product.sku
            )));
        }
        if state.products.contains(product.id) {
            return Err(StoreError::UniqueViolation(format!(
                "product id {} already exists",
                product.id
            )));
        }
        state.products.push(product.clone());
        Ok(())
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.get(id).cloned())
    }

    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError> {
        Ok(self.state.lock().await.products.find(|p| &p.sku == sku).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.state.lock().await.products.all())
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.locations.find(|l| l.name == location.name).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "location name '{}' already exists",
                location.name
            )));
        }
        if state.locations.contains(location.id) {
            return Err(StoreError::UniqueViolation(format!(
                "location id {} already exists",
                location.id
            )));
        }
        state.locations.push(location.clone());
        Ok(())
    }

    async fn location_by_id(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self.state.lock().await.locations.get(id).cloned())
    }

    async fn location_by_name(&self, name: &str) -> Result<Option<Location>, StoreError> {
        Ok(self.state.lock().await.locations.find(|l| l.name == name).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.state.lock().await.locations.all())
    }
}

#[async_trait]
impl StockStore for InMemoryStore {
    async fn stock(&self, key: StockKey) -> Result<Option<Stock>, StoreError> {
        Ok(self.state.lock().await.stock.get(&key).cloned())
    }

    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<Stock>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .stock
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn stock_below(&self, threshold: i64) -> Result<Vec<Stock>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .stock
            .values()
            .filter(|s| is_low_stock(s.quantity, threshold))
            .cloned()
            .collect())
    }

    async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn append_movement(&self, movement: &StockMovement) -> Result<(), StoreError> {
        Self::movement_write_check(&self.fail_movement_writes)?;
        let mut state = self.state.lock().await;
        state.check_movement(movement)?;
        state.movements.push(movement.clone());
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StockTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            state: guard,
            staged_stock: BTreeMap::new(),
            staged_movements: Vec::new(),
            fail_movement_writes: self.fail_movement_writes.clone(),
        }))
    }
}

/// Transaction over [`InMemoryStore`].
///
/// Writes go to staging maps and reach the shared state only on commit.
struct InMemoryTransaction {
    state: OwnedMutexGuard<State>,
    staged_stock: BTreeMap<StockKey, Stock>,
    staged_movements: Vec<StockMovement>,
    fail_movement_writes: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn current(&self, key: &StockKey) -> Option<Stock> {
        self.staged_stock
            .get(key)
            .or_else(|| self.state.stock.get(key))
            .cloned()
    }
}

#[async_trait]
impl StockTransaction for InMemoryTransaction {
    async fn lock_stock(&mut self, key: StockKey) -> Result<Option<Stock>, StoreError> {
        Ok(self.current(&key))
    }

    async fn increment(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError> {
        self.state
            .check_references(key.product_id, &[key.location_id])?;
        let stock = match self.current(&key) {
            Some(mut stock) => {
                stock
                    .credit(quantity, now)
                    .map_err(|e| StoreError::QuantityOverflow(e.to_string()))?;
                stock
            }
            None => Stock::opened(key, quantity, now),
        };
        self.staged_stock.insert(key, stock.clone());
        Ok(stock)
    }

    async fn decrement(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError> {
        let mut stock = self.current(&key).ok_or(StoreError::MissingStock(key))?;
        stock.debit(quantity, now)?;
        self.staged_stock.insert(key, stock.clone());
        Ok(stock)
    }

    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError> {
        InMemoryStore::movement_write_check(&self.fail_movement_writes)?;
        self.state.check_movement(movement)?;
        self.staged_movements.push(movement.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            mut state,
            staged_stock,
            staged_movements,
            ..
        } = *self;
        state.stock.extend(staged_stock);
        state.movements.extend(staged_movements);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::MovementId;
    use stockroom_inventory::NewLocation;
    use stockroom_products::NewProduct;
    use rust_decimal::Decimal;

    fn product(sku: &str) -> Product {
        NewProduct::new(sku, "Widget", None, Decimal::ONE)
            .unwrap()
            .into_product(ProductId::new(), Utc::now())
    }

    fn location(name: &str) -> Location {
        NewLocation::new(name)
            .unwrap()
            .into_location(LocationId::new(), Utc::now())
    }

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    async fn seeded() -> (InMemoryStore, StockKey) {
        let store = InMemoryStore::new();
        let p = product("ABC123");
        let l = location("WH-01");
        store.insert_product(&p).await.unwrap();
        store.insert_location(&l).await.unwrap();
        (store, StockKey::new(p.id, l.id))
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_unique_violation() {
        let store = InMemoryStore::new();
        store.insert_product(&product("ABC123")).await.unwrap();
        let err = store.insert_product(&product("ABC123")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_location_name_is_a_unique_violation() {
        let store = InMemoryStore::new();
        store.insert_location(&location("WH-01")).await.unwrap();
        let err = store.insert_location(&location("WH-01")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn uncommitted_changes_are_discarded_on_drop() {
        let (store, key) = seeded().await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.increment(key, qty(5), Utc::now()).await.unwrap();
        }
        assert_eq!(store.stock(key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn commit_publishes_staged_rows() {
        let (store, key) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.increment(key, qty(5), Utc::now()).await.unwrap();
        tx.increment(key, qty(2), Utc::now()).await.unwrap();
        tx.append_movement(&StockMovement::addition(key.product_id, key.location_id, qty(7), Utc::now()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.stock(key).await.unwrap().unwrap().quantity, 7);
        assert_eq!(store.list_movements(MovementFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn decrement_checks_the_floor() {
        let (store, key) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.decrement(key, qty(1), Utc::now()).await,
            Err(StoreError::MissingStock(k)) if k == key
        ));
        tx.increment(key, qty(3), Utc::now()).await.unwrap();
        assert!(matches!(
            tx.decrement(key, qty(4), Utc::now()).await,
            Err(StoreError::InsufficientStock(_))
        ));
        let stock = tx.decrement(key, qty(3), Utc::now()).await.unwrap();
        assert_eq!(stock.quantity, 0);
    }

    #[tokio::test]
    async fn increment_requires_existing_references() {
        let (store, key) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        let dangling = StockKey::new(key.product_id, LocationId::new());
        assert!(matches!(
            tx.increment(dangling, qty(1), Utc::now()).await,
            Err(StoreError::ForeignKeyViolation(_))
        ));
    }

    #[tokio::test]
    async fn malformed_movement_is_rejected() {
        let (store, key) = seeded().await;
        let movement = StockMovement {
            id: MovementId::new(),
            product_id: key.product_id,
            from_location_id: None,
            to_location_id: None,
            quantity: 1,
            movement_type: stockroom_inventory::MovementType::Move,
            created_at: Utc::now(),
        };
        assert!(matches!(
            store.append_movement(&movement).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn stock_below_is_strict() {
        let (store, key) = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.increment(key, qty(5), Utc::now()).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.stock_below(5).await.unwrap().is_empty());
        assert_eq!(store.stock_below(6).await.unwrap().len(), 1);
        assert!(store.stock_below(-1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_blocks_movement_writes() {
        let (store, key) = seeded().await;
        store.fail_movement_writes(true);
        let movement = StockMovement::addition(key.product_id, key.location_id, qty(1), Utc::now());
        assert!(matches!(
            store.append_movement(&movement).await,
            Err(StoreError::Backend(_))
        ));
        store.fail_movement_writes(false);
        store.append_movement(&movement).await.unwrap();
    }
}
