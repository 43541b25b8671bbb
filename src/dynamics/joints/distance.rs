//! The distance joint.

use crate::math::{Point, Scalar};

/// A distance joint keeps the attached anchor points at a fixed distance
/// from each other while allowing rotation around all axes.
///
/// Distance joints can be useful for things like ropes, rods, and
/// mass-spring networks.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceJoint {
    /// The joint anchor point in the first body's local frame.
    pub local_anchor1: Point,
    /// The joint anchor point in the second body's local frame.
    pub local_anchor2: Point,
    /// The distance the anchor points are kept at.
    pub rest_length: Scalar,
}

impl Default for DistanceJoint {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl DistanceJoint {
    /// Creates a new [`DistanceJoint`] keeping both bodies' local origins
    /// at the given distance.
    pub fn new(rest_length: Scalar) -> Self {
        Self {
            local_anchor1: Point::origin(),
            local_anchor2: Point::origin(),
            rest_length,
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

    /// Sets the rest length, or distance the anchor points are kept at.
    pub fn with_rest_length(mut self, rest_length: Scalar) -> Self {
        self.rest_length = rest_length;
        self
    }
}
