//! The fixed joint.

use crate::math::{Point, Rotation};

/// A fixed joint locks the attached bodies together rigidly, removing all
/// six relative degrees of freedom.
///
/// Fixed joints can be useful for things like breakable structures and
/// temporarily gluing bodies together. For permanently rigid assemblies,
/// attaching several colliders to one body is cheaper and more stable.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedJoint {
    /// The joint anchor point in the first body's local frame.
    pub local_anchor1: Point,
    /// The joint anchor point in the second body's local frame.
    pub local_anchor2: Point,
    /// The relative rotation from the first body to the second that the
    /// joint maintains.
    pub reference_rotation: Rotation,
}

impl Default for FixedJoint {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedJoint {
    /// Creates a new [`FixedJoint`] anchored at both bodies' local origins,
    /// maintaining their identity relative rotation.
    pub fn new() -> Self {
        Self {
            local_anchor1: Point::origin(),
            local_anchor2: Point::origin(),
            reference_rotation: Rotation::identity(),
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

    /// Sets the relative rotation the joint maintains between the bodies.
    pub fn with_reference_rotation(mut self, rotation: Rotation) -> Self {
        self.reference_rotation = rotation;
        self
    }
}
