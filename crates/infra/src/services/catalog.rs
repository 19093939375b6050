use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use stockroom_core::{InventoryError, InventoryResult, ProductId};
use stockroom_products::{NewProduct, Product, Sku};

use super::store_error;
use crate::store::{InventoryStore, StoreError};

/// Product catalog: registration and lookup of products.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn InventoryStore>,
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Register a product under a new SKU.
    ///
    /// The lookup before the insert only produces the friendlier error; the
    /// store's unique constraint is what actually prevents duplicates when two
    /// registrations race.
    #[instrument(skip(self, name, description), fields(sku = %sku), err)]
    pub async fn create_product(
        &self,
        sku: &str,
        name: &str,
        description: Option<String>,
        price: Decimal,
    ) -> InventoryResult<Product> {
        let new = NewProduct::new(sku, name, description, price)?;
        let key = format!("product with sku '{}'", new.sku());

        if self
            .store
            .product_by_sku(new.sku())
            .await
            .map_err(|e| store_error("create_product", &key, e))?
            .is_some()
        {
            return Err(InventoryError::already_exists(format!("{key} already exists")));
        }

        let product = new.into_product(ProductId::new(), Utc::now());
        self.store
            .insert_product(&product)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => {
                    InventoryError::already_exists(format!("{key} already exists"))
                }
                other => store_error("create_product", &key, other),
            })?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> InventoryResult<Product> {
        let sku = Sku::parse(sku)?;
        let key = format!("product with sku '{sku}'");
        self.store
            .product_by_sku(&sku)
            .await
            .map_err(|e| store_error("get_product_by_sku", &key, e))?
            .ok_or_else(|| InventoryError::not_found(format!("{key} does not exist")))
    }

    pub async fn get_by_id(&self, id: ProductId) -> InventoryResult<Product> {
        let key = format!("product {id}");
        self.store
            .product_by_id(id)
            .await
            .map_err(|e| store_error("get_product_by_id", &key, e))?
            .ok_or_else(|| InventoryError::not_found(format!("{key} does not exist")))
    }

    /// Every product, fully materialized, in creation order.
    pub async fn list_products(&self) -> InventoryResult<Vec<Product>> {
        self.store
            .list_products()
            .await
            .map_err(|e| store_error("list_products", "catalog", e))
    }
}
