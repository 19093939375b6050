use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, InventoryError, InventoryResult, ProductId, ValueObject};

/// Stock keeping unit: the product's unique, immutable business key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Surrounding whitespace is not significant; an empty SKU is rejected.
    pub fn parse(raw: impl AsRef<str>) -> InventoryResult<Self> {
        let sku = raw.as_ref().trim();
        if sku.is_empty() {
            return Err(InventoryError::invalid_argument("sku cannot be empty"));
        }
        Ok(Self(sku.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Sku {}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative unit price.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Decimal places a price may carry; matches the `NUMERIC(14, 4)` column.
    pub const SCALE: u32 = 4;
    /// Exclusive upper bound, ten integer digits.
    pub const LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    pub fn new(amount: Decimal) -> InventoryResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(InventoryError::invalid_argument("price cannot be negative"));
        }
        if amount.normalize().scale() > Self::SCALE {
            return Err(InventoryError::invalid_argument(format!(
                "price cannot have more than {} decimal places",
                Self::SCALE
            )));
        }
        if amount >= Self::LIMIT {
            return Err(InventoryError::invalid_argument(format!(
                "price must be below {}",
                Self::LIMIT
            )));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog entry.
///
/// Products are created once through the catalog and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Validated input for registering a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    sku: Sku,
    name: String,
    description: Option<String>,
    price: Price,
}

impl NewProduct {
    pub fn new(
        sku: impl AsRef<str>,
        name: impl AsRef<str>,
        description: Option<String>,
        price: Decimal,
    ) -> InventoryResult<Self> {
        let sku = Sku::parse(sku)?;
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(InventoryError::invalid_argument("name cannot be empty"));
        }
        let price = Price::new(price)?;

        // A blank description carries no information; store it as absent.
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            sku,
            name: name.to_string(),
            description,
            price,
        })
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Assign identity and creation time.
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            sku: self.sku,
            name: self.name,
            description: self.description,
            price: self.price,
            created_at,
        }
    }
}
