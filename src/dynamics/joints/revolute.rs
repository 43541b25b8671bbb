//! The revolute joint.

use crate::math::{Point, UnitVector, Vector};

/// A revolute joint (hinge) pins two anchor points together and only allows
/// relative rotation around one aligned axis.
///
/// Revolute joints can be useful for things like doors, wheels, and elbows.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RevoluteJoint {
    /// The joint anchor point in the first body's local frame.
    pub local_anchor1: Point,
    /// The joint anchor point in the second body's local frame.
    pub local_anchor2: Point,
    /// The hinge axis in the first body's local frame.
    pub local_axis1: UnitVector,
    /// The hinge axis in the second body's local frame.
    pub local_axis2: UnitVector,
}

impl RevoluteJoint {
    /// Creates a new [`RevoluteJoint`] rotating around the given axis,
    /// expressed in both bodies' local frames.
    pub fn new(axis: UnitVector) -> Self {
        Self {
            local_anchor1: Point::origin(),
            local_anchor2: Point::origin(),
            local_axis1: axis,
            local_axis2: axis,
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

    /// Sets the hinge axis in the first body's local frame.
    pub fn with_local_axis_1(mut self, axis: UnitVector) -> Self {
        self.local_axis1 = axis;
        self
    }

    /// Sets the hinge axis in the second body's local frame.
    pub fn with_local_axis_2(mut self, axis: UnitVector) -> Self {
        self.local_axis2 = axis;
        self
    }
}

impl Default for RevoluteJoint {
    fn default() -> Self {
        Self::new(UnitVector::new_normalize(Vector::y()))
    }
}
