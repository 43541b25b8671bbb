//! The prismatic joint.

use crate::math::{Point, Rotation, UnitVector, Vector};

/// A prismatic joint (slider) locks all relative rotation and only allows
/// relative translation along one axis.
///
/// Prismatic joints can be useful for things like elevators, pistons, and
/// sliding doors.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PrismaticJoint {
    /// The joint anchor point in the first body's local frame.
    pub local_anchor1: Point,
    /// The joint anchor point in the second body's local frame.
    pub local_anchor2: Point,
    /// The slide axis in the first body's local frame.
    pub local_axis1: UnitVector,
    /// The relative rotation from the first body to the second that the
    /// joint maintains.
    pub reference_rotation: Rotation,
    /// The extents of the allowed relative translation along the axis,
    /// or `None` for an unlimited slide.
    pub limits: Option<[crate::math::Scalar; 2]>,
}

impl PrismaticJoint {
    /// Creates a new [`PrismaticJoint`] sliding along the given axis,
    /// expressed in the first body's local frame.
    pub fn new(axis: UnitVector) -> Self {
        Self {
            local_anchor1: Point::origin(),
            local_anchor2: Point::origin(),
            local_axis1: axis,
            reference_rotation: Rotation::identity(),
            limits: None,
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

    /// Sets the minimum and maximum allowed translation along the axis.
    pub fn with_limits(mut self, min: crate::math::Scalar, max: crate::math::Scalar) -> Self {
        self.limits = Some([min, max]);
        self
    }
}

impl Default for PrismaticJoint {
    fn default() -> Self {
        Self::new(UnitVector::new_normalize(Vector::x()))
    }
}
