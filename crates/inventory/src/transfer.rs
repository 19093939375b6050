//! Validation and planning for a transfer between two locations.

use stockroom_core::{InventoryError, InventoryResult, LocationId, ProductId};

use crate::stock::{Quantity, StockKey};

/// A transfer request that passed argument validation.
///
/// Construction checks, in order: the quantity is positive, then source and
/// destination differ. Both checks run before any store access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub product_id: ProductId,
    pub from: LocationId,
    pub to: LocationId,
    pub quantity: Quantity,
}

impl TransferRequest {
    pub fn new(
        product_id: ProductId,
        from: LocationId,
        to: LocationId,
        quantity: i64,
    ) -> InventoryResult<Self> {
        let quantity = Quantity::new(quantity)?;
        if from == to {
            return Err(InventoryError::invalid_argument(
                "source and destination cannot be the same",
            ));
        }
        Ok(Self {
            product_id,
            from,
            to,
            quantity,
        })
    }

    pub fn source(&self) -> StockKey {
        StockKey::new(self.product_id, self.from)
    }

    pub fn destination(&self) -> StockKey {
        StockKey::new(self.product_id, self.to)
    }

    /// Both stock keys in the order rows must be locked.
    ///
    /// Two transfers in opposite directions lock in the same order, so they
    /// queue behind each other instead of deadlocking.
    pub fn lock_order(&self) -> [StockKey; 2] {
        let (a, b) = (self.source(), self.destination());
        if a <= b { [a, b] } else { [b, a] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quantity_is_checked_before_locations() {
        let loc = LocationId::new();
        let err = TransferRequest::new(ProductId::new(), loc, loc, 0).unwrap_err();
        assert_eq!(
            err,
            InventoryError::invalid_argument("quantity must be greater than zero")
        );
    }

    #[test]
    fn same_location_is_rejected() {
        let loc = LocationId::new();
        let err = TransferRequest::new(ProductId::new(), loc, loc, 3).unwrap_err();
        assert_eq!(
            err,
            InventoryError::invalid_argument("source and destination cannot be the same")
        );
    }

    #[test]
    fn lock_order_is_direction_independent() {
        let p = ProductId::new();
        let a = LocationId::new();
        let b = LocationId::new();
        let forward = TransferRequest::new(p, a, b, 1).unwrap();
        let backward = TransferRequest::new(p, b, a, 1).unwrap();
        assert_eq!(forward.lock_order(), backward.lock_order());
    }

    proptest! {
        #[test]
        fn non_positive_quantities_never_validate(q in i64::MIN..=0) {
            let r = TransferRequest::new(ProductId::new(), LocationId::new(), LocationId::new(), q);
            prop_assert!(matches!(r, Err(InventoryError::InvalidArgument(_))));
        }
    }
}
