//! Collision layers for filtering which colliders may interact.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// A bitmask for collision layers.
///
/// Each of the 32 bits represents one layer. Masks can be combined with the
/// usual bitwise operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Contains all layers.
    pub const ALL: Self = Self(0xFFFF_FFFF);
    /// Contains no layers.
    pub const NONE: Self = Self(0);

    /// Adds the given layers to the mask.
    #[inline]
    pub fn add(&mut self, layers: impl Into<LayerMask>) {
        self.0 |= layers.into().0;
    }

    /// Removes the given layers from the mask.
    #[inline]
    pub fn remove(&mut self, layers: impl Into<LayerMask>) {
        self.0 &= !layers.into().0;
    }

    /// Returns `true` if the mask contains all of the given layers.
    #[inline]
    pub fn has_all(self, layers: impl Into<LayerMask>) -> bool {
        let layers = layers.into();
        self.0 & layers.0 == layers.0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<u32> for LayerMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for LayerMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for LayerMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Not for LayerMask {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Defines the collision layers of a collider using *memberships* and *filters*.
///
/// Two colliders `A` and `B` can interact if and only if:
///
/// - The memberships of `A` contain a layer that is also in the filters of `B`
/// - The memberships of `B` contain a layer that is also in the filters of `A`
///
/// The test is symmetric: both conditions must hold, so a one-sided filter is
/// enough to suppress a pair. The default layers belong to every layer and
/// filter nothing out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionLayers {
    /// The layers this collider belongs to.
    pub memberships: LayerMask,
    /// The layers this collider is allowed to interact with.
    pub filters: LayerMask,
}

impl CollisionLayers {
    /// Contains all memberships and filters.
    pub const ALL: Self = Self {
        memberships: LayerMask::ALL,
        filters: LayerMask::ALL,
    };

    /// Creates collision layers from the given memberships and filters.
    pub fn new(memberships: impl Into<LayerMask>, filters: impl Into<LayerMask>) -> Self {
        Self {
            memberships: memberships.into(),
            filters: filters.into(),
        }
    }

    /// Returns `true` if `self` and `other` are allowed to interact.
    #[inline]
    pub fn interacts_with(self, other: Self) -> bool {
        (self.memberships & other.filters) != LayerMask::NONE
            && (other.memberships & self.filters) != LayerMask::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_interaction_test() {
        let player = CollisionLayers::new(0b0001, 0b0110);
        let enemy = CollisionLayers::new(0b0010, 0b0001);
        let ghost = CollisionLayers::new(0b0100, 0b0000);

        assert!(player.interacts_with(enemy));
        assert!(enemy.interacts_with(player));

        // The ghost filters everything out, so the pair is suppressed
        // even though the player would interact with it.
        assert!(!player.interacts_with(ghost));
        assert!(!ghost.interacts_with(player));
    }

    #[test]
    fn default_interacts_with_everything() {
        assert!(CollisionLayers::default().interacts_with(CollisionLayers::ALL));
    }
}
