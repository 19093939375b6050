use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use stockroom_core::{InventoryError, InventoryResult, LocationId};
use stockroom_inventory::{Location, NewLocation};

use super::store_error;
use crate::store::InventoryStore;

/// Location registry: named places stock can be held.
#[derive(Clone)]
pub struct LocationRegistry {
    store: Arc<dyn InventoryStore>,
}

impl LocationRegistry {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), err)]
    pub async fn create_location(&self, name: &str) -> InventoryResult<Location> {
        let new = NewLocation::new(name)?;
        let key = format!("location '{}'", new.name());

        if self
            .store
            .location_by_name(new.name())
            .await
            .map_err(|e| store_error("create_location", &key, e))?
            .is_some()
        {
            return Err(InventoryError::already_exists(format!("{key} already exists")));
        }

        let location = new.into_location(LocationId::new(), Utc::now());
        self.store
            .insert_location(&location)
            .await
            .map_err(|e| store_error("create_location", &key, e))?;

        tracing::info!(location_id = %location.id, "location created");
        Ok(location)
    }

    pub async fn get_by_name(&self, name: &str) -> InventoryResult<Location> {
        let name = name.trim();
        let key = format!("location '{name}'");
        self.store
            .location_by_name(name)
            .await
            .map_err(|e| store_error("get_location_by_name", &key, e))?
            .ok_or_else(|| InventoryError::not_found(format!("{key} does not exist")))
    }

    pub async fn get_by_id(&self, id: LocationId) -> InventoryResult<Location> {
        let key = format!("location {id}");
        self.store
            .location_by_id(id)
            .await
            .map_err(|e| store_error("get_location_by_id", &key, e))?
            .ok_or_else(|| InventoryError::not_found(format!("{key} does not exist")))
    }

    pub async fn list_locations(&self) -> InventoryResult<Vec<Location>> {
        self.store
            .list_locations()
            .await
            .map_err(|e| store_error("list_locations", "registry", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn registry() -> LocationRegistry {
        LocationRegistry::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let registry = registry();
        let wh = registry.create_location("  WH-01 ").await.unwrap();
        assert_eq!(wh.name, "WH-01");
        assert_eq!(registry.get_by_name("WH-01").await.unwrap(), wh);
        assert_eq!(registry.get_by_id(wh.id).await.unwrap(), wh);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let registry = registry();
        registry.create_location("WH-01").await.unwrap();
        let err = registry.create_location("WH-01").await.unwrap_err();
        assert_eq!(err, InventoryError::already_exists("location 'WH-01' already exists"));
        assert_eq!(registry.list_locations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_name_is_invalid() {
        let err = registry().create_location("   ").await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let registry = registry();
        assert!(matches!(
            registry.get_by_name("nowhere").await,
            Err(InventoryError::NotFound(_))
        ));
        assert!(matches!(
            registry.get_by_id(LocationId::new()).await,
            Err(InventoryError::NotFound(_))
        ));
    }
}
