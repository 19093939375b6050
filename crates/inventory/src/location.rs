use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, InventoryError, InventoryResult, LocationId};

/// A place stock can be held (warehouse, bin, shelf...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }
}

/// Validated input for registering a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    name: String,
}

impl NewLocation {
    pub fn new(name: impl AsRef<str>) -> InventoryResult<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(InventoryError::invalid_argument("location name cannot be empty"));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_location(self, id: LocationId, created_at: DateTime<Utc>) -> Location {
        Location {
            id,
            name: self.name,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_name() {
        let loc = NewLocation::new("  WH-01 ").unwrap();
        assert_eq!(loc.name(), "WH-01");
        let loc = loc.into_location(LocationId::new(), Utc::now());
        assert_eq!(loc.name, "WH-01");
    }

    #[test]
    fn rejects_blank_name() {
        let err = NewLocation::new(" \t").unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));
    }
}
