//! Joints constraining the relative motion of body pairs.
//!
//! A [`Joint`] references its two endpoint bodies by handle. The relation is
//! non-owning: removing either referenced body removes the joint as well.

mod distance;
mod fixed;
mod prismatic;
mod revolute;
mod spherical;

pub use distance::DistanceJoint;
pub use fixed::FixedJoint;
pub use prismatic::PrismaticJoint;
pub use revolute::RevoluteJoint;
pub use spherical::SphericalJoint;

use thiserror::Error;

use crate::arena::{Arena, Handle};
use crate::dynamics::rigid_body::RigidBodyHandle;
use crate::dynamics::rigid_body_set::RigidBodySet;

/// A stable handle to a [`Joint`] in a [`JointSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct JointHandle(pub Handle);

impl JointHandle {
    /// The arena slot index of this handle.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0.index()
    }
}

/// The kind-specific parameters of a [`Joint`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum JointKind {
    /// See [`FixedJoint`].
    Fixed(FixedJoint),
    /// See [`SphericalJoint`].
    Spherical(SphericalJoint),
    /// See [`RevoluteJoint`].
    Revolute(RevoluteJoint),
    /// See [`PrismaticJoint`].
    Prismatic(PrismaticJoint),
    /// See [`DistanceJoint`].
    Distance(DistanceJoint),
}

impl From<FixedJoint> for JointKind {
    fn from(joint: FixedJoint) -> Self {
        Self::Fixed(joint)
    }
}

impl From<SphericalJoint> for JointKind {
    fn from(joint: SphericalJoint) -> Self {
        Self::Spherical(joint)
    }
}

impl From<RevoluteJoint> for JointKind {
    fn from(joint: RevoluteJoint) -> Self {
        Self::Revolute(joint)
    }
}

impl From<PrismaticJoint> for JointKind {
    fn from(joint: PrismaticJoint) -> Self {
        Self::Prismatic(joint)
    }
}

impl From<DistanceJoint> for JointKind {
    fn from(joint: DistanceJoint) -> Self {
        Self::Distance(joint)
    }
}

/// A constraint between two bodies restricting their relative motion.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    /// The first body constrained by the joint.
    pub body1: RigidBodyHandle,
    /// The second body constrained by the joint.
    pub body2: RigidBodyHandle,
    /// The joint's kind-specific parameters.
    pub kind: JointKind,
}

/// An invalid joint insertion.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum JointError {
    /// One of the endpoint body handles does not refer to a live body.
    #[error("a joint endpoint body handle is stale")]
    StaleBodyHandle,
    /// Both endpoints refer to the same body.
    #[error("a joint cannot constrain a body to itself")]
    SameBody,
}

/// A set owning all the joints of a simulation.
#[derive(Clone, Debug, Default)]
pub struct JointSet {
    joints: Arena<Joint>,
}

impl JointSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of joints in the set.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Returns `true` if the set contains no joints.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Inserts a joint between the two bodies and returns its handle.
    ///
    /// Both endpoint handles must refer to distinct live bodies, which are
    /// woken up by the insertion.
    pub fn insert(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        kind: impl Into<JointKind>,
        bodies: &mut RigidBodySet,
    ) -> Result<JointHandle, JointError> {
        if body1 == body2 {
            return Err(JointError::SameBody);
        }
        if !bodies.contains(body1) || !bodies.contains(body2) {
            return Err(JointError::StaleBodyHandle);
        }

        bodies.wake_up(body1);
        bodies.wake_up(body2);

        Ok(JointHandle(self.joints.insert(Joint {
            body1,
            body2,
            kind: kind.into(),
        })))
    }

    /// Returns the joint behind `handle`, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle.0)
    }

    /// Returns the joint behind `handle` mutably, or `None` if the handle
    /// is stale.
    #[inline]
    pub fn get_mut(&mut self, handle: JointHandle) -> Option<&mut Joint> {
        self.joints.get_mut(handle.0)
    }

    /// Returns `true` if `handle` refers to a live joint.
    #[inline]
    pub fn contains(&self, handle: JointHandle) -> bool {
        self.joints.contains(handle.0)
    }

    /// Removes the joint behind `handle`, waking both endpoint bodies.
    pub fn remove(&mut self, handle: JointHandle, bodies: &mut RigidBodySet) -> Option<Joint> {
        let joint = self.joints.remove(handle.0)?;
        bodies.wake_up(joint.body1);
        bodies.wake_up(joint.body2);
        Some(joint)
    }

    /// Removes every joint with an endpoint at the given body, waking the
    /// bodies at the other endpoints.
    ///
    /// Called when a body is removed from its set.
    pub fn remove_joints_attached_to_body(
        &mut self,
        body: RigidBodyHandle,
        bodies: &mut RigidBodySet,
    ) {
        let attached: Vec<JointHandle> = self
            .joints
            .iter()
            .filter(|(_, joint)| joint.body1 == body || joint.body2 == body)
            .map(|(handle, _)| JointHandle(handle))
            .collect();
        for handle in attached {
            self.remove(handle, bodies);
        }
    }

    /// Iterates over all joints with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (JointHandle, &Joint)> {
        self.joints
            .iter()
            .map(|(handle, joint)| (JointHandle(handle), joint))
    }

    /// Iterates over the joints attached to the given body.
    pub fn joints_attached_to_body(
        &self,
        body: RigidBodyHandle,
    ) -> impl Iterator<Item = (JointHandle, &Joint)> {
        self.iter()
            .filter(move |(_, joint)| joint.body1 == body || joint.body2 == body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::RigidBodyBuilder;

    #[test]
    fn insert_validates_endpoints() {
        let mut bodies = RigidBodySet::new();
        let mut joints = JointSet::new();

        let a = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        let b = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());

        assert_eq!(
            joints.insert(a, a, SphericalJoint::new(), &mut bodies),
            Err(JointError::SameBody)
        );

        let handle = joints
            .insert(a, b, SphericalJoint::new(), &mut bodies)
            .unwrap();
        assert!(joints.contains(handle));

        let mut colliders = crate::collision::ColliderSet::new();
        bodies.remove(b, &mut colliders, &mut joints);

        // The joint was removed together with its endpoint body.
        assert!(!joints.contains(handle));
        assert_eq!(
            joints.insert(a, b, SphericalJoint::new(), &mut bodies),
            Err(JointError::StaleBodyHandle)
        );
    }
}
