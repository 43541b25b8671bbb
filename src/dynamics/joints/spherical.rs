//! The spherical joint.

use crate::math::Point;

/// A spherical joint (ball-and-socket) pins two anchor points together while
/// allowing rotation around all axes.
///
/// Spherical joints can be useful for things like pendula, chains, and
/// ragdoll shoulders and hips.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SphericalJoint {
    /// The joint anchor point in the first body's local frame.
    pub local_anchor1: Point,
    /// The joint anchor point in the second body's local frame.
    pub local_anchor2: Point,
}

impl Default for SphericalJoint {
    fn default() -> Self {
        Self::new()
    }
}

impl SphericalJoint {
    /// Creates a new [`SphericalJoint`] anchored at both bodies' local origins.
    pub fn new() -> Self {
        Self {
            local_anchor1: Point::origin(),
            local_anchor2: Point::origin(),
        }
    }

    /// Sets the anchor point in the first body's local frame.
    pub fn with_local_anchor_1(mut self, anchor: Point) -> Self {
        self.local_anchor1 = anchor;
        self
    }

    /// Sets the anchor point in the second body's local frame.
    pub fn with_local_anchor_2(mut self, anchor: Point) -> Self {
        self.local_anchor2 = anchor;
        self
    }
}
