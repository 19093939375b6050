//! Postgres-backed entity store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `UniqueViolation` | Duplicate SKU or location name |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` | Stock or movement references a missing product/location |
//! | Database (numeric value out of range) | `22003` | `QuantityOverflow` | A credit past the `BIGINT` range |
//! | Database (check constraint violation) | `23514` | `Backend` | Row shape rejected by the schema |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / PoolTimedOut | N/A | `Backend` | Pool unavailable |
//! | Other | N/A | `Backend` | Network errors, decoding failures, etc. |
//!
//! Messages carry the operation name and the database's message, never the
//! query text.
//!
//! ## Locking
//!
//! Stock mutations run inside a transaction. `lock_stock` issues
//! `SELECT .. FOR UPDATE`, so concurrent transfers touching the same
//! (product, location) row serialize on that row while unrelated pairs
//! proceed in parallel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockroom_core::{LocationId, MovementId, ProductId};
use stockroom_inventory::{
    InsufficientStock, Location, MovementFilter, MovementType, Quantity, Stock, StockFilter,
    StockKey, StockMovement,
};
use stockroom_products::{Price, Product, Sku};

use super::{LocationStore, ProductStore, StockStore, StockTransaction, StoreError};
use crate::config::DatabaseConfig;

/// Postgres-backed entity store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; clones share the
/// pool. Connections are acquired per call and returned to the pool when the
/// query (or transaction) finishes, on every exit path.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration and optionally apply the embedded migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let store = Self::new(pool);
        if config.run_migrations {
            store.migrate().await?;
        }
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migrate: {e}")))
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let sku = Sku::parse(&row.sku).map_err(|e| decode_error("products", e))?;
        let price = Price::new(row.price).map_err(|e| decode_error("products", e))?;
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            sku,
            name: row.name,
            description: row.description,
            price,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: LocationId::from_uuid(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StockRow {
    product_id: Uuid,
    location_id: Uuid,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Stock {
            product_id: ProductId::from_uuid(row.product_id),
            location_id: LocationId::from_uuid(row.location_id),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    product_id: Uuid,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    quantity: i64,
    movement_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let movement_type: MovementType = row
            .movement_type
            .parse()
            .map_err(|e| decode_error("stock_movements", e))?;
        let movement = StockMovement {
            id: MovementId::from_uuid(row.id),
            product_id: ProductId::from_uuid(row.product_id),
            from_location_id: row.from_location_id.map(LocationId::from_uuid),
            to_location_id: row.to_location_id.map(LocationId::from_uuid),
            quantity: row.quantity,
            movement_type,
            created_at: row.created_at,
        };
        movement
            .validate()
            .map_err(|e| decode_error("stock_movements", e))?;
        Ok(movement)
    }
}

const STOCK_COLUMNS: &str = "product_id, location_id, quantity, created_at, updated_at";

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(product_id = %product.id, sku = %product.sku), err)]
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, description, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.sku.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, sku, name, description, price, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_by_id", e))?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), fields(sku = %sku), err)]
    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, sku, name, description, price, created_at
            FROM products
            WHERE sku = $1
            "#,
        )
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("product_by_sku", e))?;
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, sku, name, description, price, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl LocationStore for PostgresStore {
    #[instrument(skip(self, location), fields(location_id = %location.id, name = %location.name), err)]
    async fn insert_location(&self, location: &Location) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO locations (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(location.id.as_uuid())
            .bind(&location.name)
            .bind(location.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_location", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(location_id = %id), err)]
    async fn location_by_id(&self, id: LocationId) -> Result<Option<Location>, StoreError> {
        let row: Option<LocationRow> =
            sqlx::query_as("SELECT id, name, created_at FROM locations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("location_by_id", e))?;
        Ok(row.map(Location::from))
    }

    #[instrument(skip(self), err)]
    async fn location_by_name(&self, name: &str) -> Result<Option<Location>, StoreError> {
        let row: Option<LocationRow> =
            sqlx::query_as("SELECT id, name, created_at FROM locations WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("location_by_name", e))?;
        Ok(row.map(Location::from))
    }

    #[instrument(skip(self), err)]
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows: Vec<LocationRow> = sqlx::query_as(
            "SELECT id, name, created_at FROM locations ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_locations", e))?;
        Ok(rows.into_iter().map(Location::from).collect())
    }
}

#[async_trait]
impl StockStore for PostgresStore {
    #[instrument(skip(self), fields(product_id = %key.product_id, location_id = %key.location_id), err)]
    async fn stock(&self, key: StockKey) -> Result<Option<Stock>, StoreError> {
        let row: Option<StockRow> = sqlx::query_as(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE product_id = $1 AND location_id = $2"
        ))
        .bind(key.product_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock", e))?;
        Ok(row.map(Stock::from))
    }

    #[instrument(skip(self), err)]
    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<Stock>, StoreError> {
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR location_id = $2)
            ORDER BY product_id, location_id
            "#
        ))
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.location_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_stock", e))?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn stock_below(&self, threshold: i64) -> Result<Vec<Stock>, StoreError> {
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            r#"
            SELECT {STOCK_COLUMNS}
            FROM stock
            WHERE quantity < $1
            ORDER BY quantity ASC, product_id, location_id
            "#
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_below", e))?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, from_location_id, to_location_id, quantity, movement_type, created_at
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::uuid IS NULL OR from_location_id = $2 OR to_location_id = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.location_id.map(Uuid::from))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;
        rows.into_iter().map(StockMovement::try_from).collect()
    }

    #[instrument(skip(self, movement), fields(movement_id = %movement.id), err)]
    async fn append_movement(&self, movement: &StockMovement) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;
        insert_movement(&mut *conn, movement).await
    }

    async fn begin(&self) -> Result<Box<dyn StockTransaction>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresStockTransaction { tx }))
    }
}

async fn insert_movement(
    conn: &mut sqlx::PgConnection,
    movement: &StockMovement,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id,
            product_id,
            from_location_id,
            to_location_id,
            quantity,
            movement_type,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(movement.id.as_uuid())
    .bind(movement.product_id.as_uuid())
    .bind(movement.from_location_id.map(Uuid::from))
    .bind(movement.to_location_id.map(Uuid::from))
    .bind(movement.quantity)
    .bind(movement.movement_type.as_str())
    .bind(movement.created_at)
    .execute(conn)
    .await
    .map_err(|e| map_sqlx_error("insert_movement", e))?;
    Ok(())
}

/// Stock unit of work backed by a SQLx transaction.
///
/// SQLx rolls the transaction back when it is dropped uncommitted.
struct PostgresStockTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTransaction for PostgresStockTransaction {
    #[instrument(skip(self), fields(product_id = %key.product_id, location_id = %key.location_id), err)]
    async fn lock_stock(&mut self, key: StockKey) -> Result<Option<Stock>, StoreError> {
        let row: Option<StockRow> = sqlx::query_as(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock WHERE product_id = $1 AND location_id = $2 FOR UPDATE"
        ))
        .bind(key.product_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_stock", e))?;
        Ok(row.map(Stock::from))
    }

    #[instrument(skip(self), fields(product_id = %key.product_id, location_id = %key.location_id, quantity = %quantity), err)]
    async fn increment(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError> {
        let row: StockRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO stock (product_id, location_id, quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (product_id, location_id)
            DO UPDATE SET
                quantity = stock.quantity + EXCLUDED.quantity,
                updated_at = EXCLUDED.updated_at
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(key.product_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .bind(quantity.get())
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("increment_stock", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(product_id = %key.product_id, location_id = %key.location_id, quantity = %quantity), err)]
    async fn decrement(
        &mut self,
        key: StockKey,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Result<Stock, StoreError> {
        let row: Option<StockRow> = sqlx::query_as(&format!(
            r#"
            UPDATE stock
            SET quantity = quantity - $3,
                updated_at = $4
            WHERE product_id = $1 AND location_id = $2 AND quantity >= $3
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(key.product_id.as_uuid())
        .bind(key.location_id.as_uuid())
        .bind(quantity.get())
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Nothing updated: tell a missing row apart from a short one.
        match self.lock_stock(key).await? {
            None => Err(StoreError::MissingStock(key)),
            Some(stock) => Err(StoreError::InsufficientStock(InsufficientStock {
                available: stock.quantity,
                requested: quantity.get(),
            })),
        }
    }

    #[instrument(skip(self, movement), fields(movement_id = %movement.id), err)]
    async fn append_movement(&mut self, movement: &StockMovement) -> Result<(), StoreError> {
        insert_movement(&mut *self.tx, movement).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn decode_error(table: &str, err: stockroom_core::InventoryError) -> StoreError {
    StoreError::Backend(format!("failed to decode {table} row: {}", err.message()))
}

/// Map a SQLx error to a `StoreError`, naming the failed operation.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(
                    db_err
                        .constraint()
                        .map(|c| format!("{operation}: {c}"))
                        .unwrap_or(msg),
                ),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                // bigint out of range on `quantity + $n`
                Some("22003") => StoreError::QuantityOverflow(msg),
                // Check constraint violations land here too (23514).
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("timed out acquiring a connection in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
