use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, InventoryError, InventoryResult, LocationId, MovementId, ProductId};

use crate::stock::Quantity;

/// Kind of stock mutation recorded in the audit trail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    Add,
    Remove,
    Move,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Add => "ADD",
            MovementType::Remove => "REMOVE",
            MovementType::Move => "MOVE",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADD" => Ok(MovementType::Add),
            "REMOVE" => Ok(MovementType::Remove),
            "MOVE" => Ok(MovementType::Move),
            other => Err(InventoryError::invalid_argument(format!(
                "unknown movement type '{other}'"
            ))),
        }
    }
}

/// Immutable, append-only audit record of one stock mutation.
///
/// Shape per type:
/// - `ADD`: only `to_location_id`
/// - `REMOVE`: only `from_location_id`
/// - `MOVE`: both, and they differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub created_at: DateTime<Utc>,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> MovementId {
        self.id
    }
}

impl StockMovement {
    pub fn addition(
        product_id: ProductId,
        to: LocationId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            from_location_id: None,
            to_location_id: Some(to),
            quantity: quantity.get(),
            movement_type: MovementType::Add,
            created_at: now,
        }
    }

    pub fn removal(
        product_id: ProductId,
        from: LocationId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            from_location_id: Some(from),
            to_location_id: None,
            quantity: quantity.get(),
            movement_type: MovementType::Remove,
            created_at: now,
        }
    }

    pub fn transfer(
        product_id: ProductId,
        from: LocationId,
        to: LocationId,
        quantity: Quantity,
        now: DateTime<Utc>,
    ) -> InventoryResult<Self> {
        if from == to {
            return Err(InventoryError::invalid_argument(
                "source and destination cannot be the same",
            ));
        }
        Ok(Self {
            id: MovementId::new(),
            product_id,
            from_location_id: Some(from),
            to_location_id: Some(to),
            quantity: quantity.get(),
            movement_type: MovementType::Move,
            created_at: now,
        })
    }

    /// Check the per-type shape. Used when rebuilding records read from storage.
    pub fn validate(&self) -> InventoryResult<()> {
        if self.quantity <= 0 {
            return Err(InventoryError::internal(format!(
                "movement {} has non-positive quantity {}",
                self.id, self.quantity
            )));
        }
        let shape_ok = match self.movement_type {
            MovementType::Add => self.from_location_id.is_none() && self.to_location_id.is_some(),
            MovementType::Remove => self.from_location_id.is_some() && self.to_location_id.is_none(),
            MovementType::Move => match (self.from_location_id, self.to_location_id) {
                (Some(from), Some(to)) => from != to,
                _ => false,
            },
        };
        if !shape_ok {
            return Err(InventoryError::internal(format!(
                "movement {} has locations inconsistent with type {}",
                self.id, self.movement_type
            )));
        }
        Ok(())
    }

    /// Whether the movement touched `location` on either side.
    pub fn involves(&self, location: LocationId) -> bool {
        self.from_location_id == Some(location) || self.to_location_id == Some(location)
    }
}

/// Optional restriction of the audit trail to one product and/or location.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    pub location_id: Option<LocationId>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &StockMovement) -> bool {
        self.product_id.is_none_or(|p| p == movement.product_id)
            && self.location_id.is_none_or(|l| movement.involves(l))
    }
}
