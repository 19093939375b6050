use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{InventoryError, InventoryResult, LocationId, ProductId, ValueObject};

/// A requested movement quantity. Always strictly positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(i64);

impl Quantity {
    pub fn new(value: i64) -> InventoryResult<Self> {
        if value <= 0 {
            return Err(InventoryError::invalid_argument(
                "quantity must be greater than zero",
            ));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<i64> for Quantity {
    type Error = InventoryError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The stock pair: at most one stock row exists per key.
///
/// Ordering is by product then location; transfers lock rows in this order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub location_id: LocationId,
}

impl StockKey {
    pub fn new(product_id: ProductId, location_id: LocationId) -> Self {
        Self {
            product_id,
            location_id,
        }
    }
}

impl ValueObject for StockKey {}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "product {} at location {}", self.product_id, self.location_id)
    }
}

/// A debit larger than the quantity on hand.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("insufficient stock: requested {requested}, available {available}")]
pub struct InsufficientStock {
    pub available: i64,
    pub requested: i64,
}

/// A credit that would take the quantity past `i64::MAX`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("stock quantity overflow: {available} on hand, adding {added}")]
pub struct StockOverflow {
    pub available: i64,
    pub added: i64,
}

/// Quantity on hand for one (product, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    /// First stock for a pair, created by its first credit.
    pub fn opened(key: StockKey, quantity: Quantity, now: DateTime<Utc>) -> Self {
        Self {
            product_id: key.product_id,
            location_id: key.location_id,
            quantity: quantity.get(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Credit with overflow check; the row is left untouched on failure.
    pub fn credit(&mut self, quantity: Quantity, now: DateTime<Utc>) -> Result<(), StockOverflow> {
        self.quantity = self
            .quantity
            .checked_add(quantity.get())
            .ok_or(StockOverflow {
                available: self.quantity,
                added: quantity.get(),
            })?;
        self.updated_at = now;
        Ok(())
    }

    /// Debit with floor check; the row is left untouched on failure.
    ///
    /// Taking exactly the quantity on hand is allowed and leaves zero.
    pub fn debit(&mut self, quantity: Quantity, now: DateTime<Utc>) -> Result<(), InsufficientStock> {
        if self.quantity < quantity.get() {
            return Err(InsufficientStock {
                available: self.quantity,
                requested: quantity.get(),
            });
        }
        self.quantity -= quantity.get();
        self.updated_at = now;
        Ok(())
    }
}

/// Low-stock predicate: strictly below the threshold.
///
/// A row exactly at the threshold is not low, so thresholds of zero or less
/// never match (quantities are never negative).
pub fn is_low_stock(quantity: i64, threshold: i64) -> bool {
    quantity < threshold
}

/// Optional restriction of a stock listing to one product and/or location.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    pub product_id: Option<ProductId>,
    pub location_id: Option<LocationId>,
}

impl StockFilter {
    pub fn matches(&self, stock: &Stock) -> bool {
        self.product_id.is_none_or(|p| p == stock.product_id)
            && self.location_id.is_none_or(|l| l == stock.location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> StockKey {
        StockKey::new(ProductId::new(), LocationId::new())
    }

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-5).is_err());
        assert_eq!(qty(3).get(), 3);
    }

    #[test]
    fn quantity_rejects_zero_when_deserialized() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("7").unwrap(), qty(7));
    }

    #[test]
    fn debit_of_exact_quantity_leaves_zero() {
        let mut stock = Stock::opened(key(), qty(10), Utc::now());
        stock.debit(qty(10), Utc::now()).unwrap();
        assert_eq!(stock.quantity, 0);
    }

    #[test]
    fn overdraw_is_rejected_without_change() {
        let opened_at = Utc::now();
        let mut stock = Stock::opened(key(), qty(4), opened_at);
        let err = stock.debit(qty(5), Utc::now()).unwrap_err();
        assert_eq!(err, InsufficientStock { available: 4, requested: 5 });
        assert_eq!(stock.quantity, 4);
        assert_eq!(stock.updated_at, opened_at);
    }

    #[test]
    fn credit_bumps_updated_at() {
        let opened_at = Utc::now();
        let mut stock = Stock::opened(key(), qty(1), opened_at);
        let later = opened_at + chrono::Duration::seconds(5);
        stock.credit(qty(2), later).unwrap();
        assert_eq!(stock.quantity, 3);
        assert_eq!(stock.created_at, opened_at);
        assert_eq!(stock.updated_at, later);
    }

    #[test]
    fn credit_past_maximum_is_rejected_without_change() {
        let opened_at = Utc::now();
        let mut stock = Stock::opened(key(), qty(i64::MAX), opened_at);
        let err = stock.credit(qty(1), Utc::now()).unwrap_err();
        assert_eq!(err, StockOverflow { available: i64::MAX, added: 1 });
        assert_eq!(stock.quantity, i64::MAX);
        assert_eq!(stock.updated_at, opened_at);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(is_low_stock(4, 5));
        assert!(!is_low_stock(5, 5));
        assert!(!is_low_stock(0, 0));
        assert!(!is_low_stock(0, -1));
    }

    #[test]
    fn filter_matches_on_given_fields_only() {
        let stock = Stock::opened(key(), qty(1), Utc::now());
        assert!(StockFilter::default().matches(&stock));
        let by_product = StockFilter {
            product_id: Some(stock.product_id),
            location_id: None,
        };
        assert!(by_product.matches(&stock));
        let other_location = StockFilter {
            product_id: Some(stock.product_id),
            location_id: Some(LocationId::new()),
        };
        assert!(!other_location.matches(&stock));
    }

    proptest! {
        #[test]
        fn debit_then_credit_restores_quantity(start in 1i64..1_000_000, take in 1i64..1_000_000) {
            let mut stock = Stock::opened(key(), qty(start), Utc::now());
            match stock.debit(qty(take), Utc::now()) {
                Ok(()) => {
                    prop_assert!(take <= start);
                    prop_assert_eq!(stock.quantity, start - take);
                    prop_assert!(stock.credit(qty(take), Utc::now()).is_ok());
                    prop_assert_eq!(stock.quantity, start);
                }
                Err(e) => {
                    prop_assert!(take > start);
                    prop_assert_eq!(e.available, start);
                    prop_assert_eq!(stock.quantity, start);
                }
            }
        }

        #[test]
        fn quantities_never_report_low_for_non_positive_thresholds(q in 0i64..1_000_000, t in -1_000i64..=0) {
            prop_assert!(!is_low_stock(q, t));
        }
    }
}
