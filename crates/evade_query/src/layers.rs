//! Collision layers and filtering

use serde::{Deserialize, Serialize};

/// A collision layer identifier (bit index, 0..32)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Static environment that does not block escape routes (floors, decals)
    pub const ENVIRONMENT: Self = Self(5);
    /// Static obstacles probed by escape rays
    pub const OBSTACLES: Self = Self(6);

    /// Get the layer as a bitmask. Layers past bit 31 map to an empty mask.
    pub fn as_mask(&self) -> u32 {
        1u32.checked_shl(self.0).unwrap_or(0)
    }
}

/// Collision groups for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Which groups this object belongs to (membership)
    pub memberships: u32,
    /// Which groups this object can collide with (filter)
    pub filter: u32,
}

impl CollisionGroups {
    /// Collide with everything
    pub const ALL: Self = Self {
        memberships: u32::MAX,
        filter: u32::MAX,
    };

    /// Groups for a static object living on `layer` that any query may hit
    pub fn member_of(layer: CollisionLayer) -> Self {
        Self {
            memberships: layer.as_mask(),
            filter: u32::MAX,
        }
    }

    /// Groups for a query that only hits objects on the given layers
    pub fn query(layer: CollisionLayer) -> Self {
        Self {
            memberships: u32::MAX,
            filter: layer.as_mask(),
        }
    }

    /// Check if two groups can collide
    pub fn can_collide(&self, other: &CollisionGroups) -> bool {
        (self.memberships & other.filter) != 0 && (other.memberships & self.filter) != 0
    }
}
