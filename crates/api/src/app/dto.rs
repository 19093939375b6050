use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use stockroom_core::InventoryError;
use stockroom_inventory::{MovementFilter, StockFilter};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}

/// Body of `/stock/add` and `/stock/remove`.
#[derive(Debug, Deserialize)]
pub struct StockChangeRequest {
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct MoveStockRequest {
    pub product_id: String,
    pub from_location_id: String,
    pub to_location_id: String,
    pub quantity: i64,
}

// -------------------------
// Query strings
// -------------------------

/// `?product_id=&location_id=`, shared by the stock and movement listings.
#[derive(Debug, Default, Deserialize)]
pub struct PairQuery {
    pub product_id: Option<String>,
    pub location_id: Option<String>,
}

impl PairQuery {
    pub fn stock_filter(&self) -> Result<StockFilter, axum::response::Response> {
        Ok(StockFilter {
            product_id: parse_optional_id(self.product_id.as_deref())?,
            location_id: parse_optional_id(self.location_id.as_deref())?,
        })
    }

    pub fn movement_filter(&self) -> Result<MovementFilter, axum::response::Response> {
        Ok(MovementFilter {
            product_id: parse_optional_id(self.product_id.as_deref())?,
            location_id: parse_optional_id(self.location_id.as_deref())?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: i64,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = InventoryError>,
{
    raw.parse().map_err(errors::inventory_error_to_response)
}

fn parse_optional_id<T>(raw: Option<&str>) -> Result<Option<T>, axum::response::Response>
where
    T: FromStr<Err = InventoryError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_id(s).map(Some),
        None => Ok(None),
    }
}
