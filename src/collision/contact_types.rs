//! Contact types and data structures used in the collision pipeline.

use parry3d::shape::PackedFeatureId;

use crate::collision::collider::ColliderHandle;
use crate::dynamics::RigidBodyHandle;
use crate::math::{Point, Scalar, Vector};

/// Flags indicating the status and type of a [contact pair](ContactPair).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactPairFlags(u8);

bitflags::bitflags! {
    impl ContactPairFlags: u8 {
        /// Set if the collider shapes are touching.
        const TOUCHING = 1 << 0;
        /// Set if the shapes are touching and were not touching previously.
        const STARTED_TOUCHING = 1 << 1;
        /// Set if the shapes are not touching and were touching previously.
        const STOPPED_TOUCHING = 1 << 2;
        /// Set if the contact pair should emit contact events.
        const CONTACT_EVENTS = 1 << 3;
        /// Set if [`PhysicsHooks::modify_contacts`](crate::collision::PhysicsHooks::modify_contacts)
        /// should be applied to the contact pair.
        const MODIFY_CONTACTS = 1 << 4;
        /// Set if [`PhysicsHooks::filter_pairs`](crate::collision::PhysicsHooks::filter_pairs)
        /// should be applied to the contact pair.
        const CUSTOM_FILTER = 1 << 5;
    }
}

/// A single contact point in a [`ContactManifold`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactPoint {
    /// The contact point on the first shape, in world space.
    pub point1: Point,
    /// The contact point on the second shape, in world space.
    pub point2: Point,
    /// The signed distance between the shapes along the contact normal.
    /// Negative when the shapes are penetrating.
    pub dist: Scalar,
    /// The shape feature of the first collider this point belongs to.
    pub feature_id1: PackedFeatureId,
    /// The shape feature of the second collider this point belongs to.
    pub feature_id2: PackedFeatureId,
    /// The impulse applied along the contact normal during the last solve.
    pub normal_impulse: Scalar,
    /// The impulses applied along the two friction tangents during the last solve.
    pub tangent_impulse: [Scalar; 2],
}

impl ContactPoint {
    /// The penetration depth at this point, or zero if the shapes are separated.
    #[inline]
    pub fn penetration(&self) -> Scalar {
        (-self.dist).max(0.0)
    }
}

/// A contact surface between two colliders, represented by a set of
/// [contact points](ContactPoint) sharing one normal.
///
/// A manifold can typically be a single point, a line segment, or a polygon
/// formed by its contact points.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactManifold {
    /// The contact points in this manifold. Each point shares `normal`.
    pub points: Vec<ContactPoint>,
    /// The unit contact normal in world space, pointing from the first
    /// shape towards the second.
    pub normal: Vector,
    /// The effective coefficient of dynamic friction for the contact surface.
    pub friction: Scalar,
    /// The effective coefficient of restitution for the contact surface.
    pub restitution: Scalar,
}

impl ContactManifold {
    /// Copies accumulated impulses from previous contact points to matching
    /// points in `self`, for warm starting the solver.
    ///
    /// Points are matched by their shape feature IDs; unknown feature IDs
    /// never match, so fresh contacts start from zero impulse.
    pub fn match_contacts(&mut self, previous_points: &[ContactPoint]) {
        for point in self.points.iter_mut() {
            for previous in previous_points {
                if point.feature_id1 == PackedFeatureId::UNKNOWN {
                    continue;
                }
                // Both orderings are checked because the broad phase can swap
                // the pair between steps.
                let matched = (point.feature_id1 == previous.feature_id1
                    && point.feature_id2 == previous.feature_id2)
                    || (point.feature_id1 == previous.feature_id2
                        && point.feature_id2 == previous.feature_id1);
                if matched {
                    point.normal_impulse = previous.normal_impulse;
                    point.tangent_impulse = previous.tangent_impulse;
                    break;
                }
            }
        }
    }

    /// Returns the contact point with the largest penetration depth.
    pub fn find_deepest_contact(&self) -> Option<&ContactPoint> {
        self.points.iter().min_by(|a, b| {
            a.dist
                .partial_cmp(&b.dist)
                .unwrap_or(core::cmp::Ordering::Equal)
        })
    }
}

/// A contact pair between two non-sensor colliders.
///
/// A contact pair exists in the [`ContactGraph`](super::ContactGraph) for
/// every candidate pair produced by the broad phase, even when the shapes are
/// not actually touching yet; use [`is_touching`](Self::is_touching) to check
/// for real contact.
pub struct ContactPair {
    /// The first collider in the contact.
    pub collider1: ColliderHandle,
    /// The second collider in the contact.
    pub collider2: ColliderHandle,
    /// The body the first collider is attached to.
    pub body1: RigidBodyHandle,
    /// The body the second collider is attached to.
    pub body2: RigidBodyHandle,
    /// The contact manifolds between the two colliders. Each manifold
    /// carries one or more contact points sharing a normal.
    pub manifolds: Vec<ContactManifold>,
    /// Flags indicating the status of the contact pair.
    pub flags: ContactPairFlags,
    /// Manifolds in the dispatcher's own representation, kept across steps
    /// so contact tracking stays stable.
    pub(crate) dispatcher_manifolds: Vec<parry3d::query::ContactManifold<(), ()>>,
    /// Dispatcher workspace for persistent manifold computation.
    pub(crate) workspace: Option<parry3d::query::ContactManifoldsWorkspace>,
}

impl core::fmt::Debug for ContactPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContactPair")
            .field("collider1", &self.collider1)
            .field("collider2", &self.collider2)
            .field("body1", &self.body1)
            .field("body2", &self.body2)
            .field("manifolds", &self.manifolds)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Clone for ContactPair {
    fn clone(&self) -> Self {
        Self {
            collider1: self.collider1,
            collider2: self.collider2,
            body1: self.body1,
            body2: self.body2,
            manifolds: self.manifolds.clone(),
            flags: self.flags,
            // The dispatcher state is rebuilt on the next narrow-phase
            // update; cloning it buys nothing but warm-start continuity.
            dispatcher_manifolds: Vec::new(),
            workspace: None,
        }
    }
}

impl ContactPair {
    /// Creates a new empty contact pair between the given colliders.
    pub fn new(
        collider1: ColliderHandle,
        collider2: ColliderHandle,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        flags: ContactPairFlags,
    ) -> Self {
        Self {
            collider1,
            collider2,
            body1,
            body2,
            manifolds: Vec::new(),
            flags,
            dispatcher_manifolds: Vec::new(),
            workspace: None,
        }
    }

    /// Returns `true` if the collider shapes are touching.
    #[inline]
    pub fn is_touching(&self) -> bool {
        self.flags.contains(ContactPairFlags::TOUCHING)
    }

    /// Returns `true` if the shapes started touching during the last step.
    #[inline]
    pub fn started_touching(&self) -> bool {
        self.flags.contains(ContactPairFlags::STARTED_TOUCHING)
    }

    /// Returns `true` if the shapes stopped touching during the last step.
    #[inline]
    pub fn stopped_touching(&self) -> bool {
        self.flags.contains(ContactPairFlags::STOPPED_TOUCHING)
    }

    /// The number of contact points across all manifolds, including
    /// speculative points within the prediction distance.
    pub fn point_count(&self) -> usize {
        self.manifolds
            .iter()
            .map(|manifold| manifold.points.len())
            .sum()
    }

    /// Computes the sum of all impulses applied along contact normals.
    pub fn total_normal_impulse(&self) -> Vector {
        self.manifolds.iter().fold(Vector::zeros(), |acc, manifold| {
            let magnitude: Scalar = manifold
                .points
                .iter()
                .map(|point| point.normal_impulse)
                .sum();
            acc + manifold.normal * magnitude
        })
    }

    /// Returns the contact point with the largest penetration depth
    /// across all manifolds, or `None` if there are no contacts.
    pub fn find_deepest_contact(&self) -> Option<&ContactPoint> {
        self.manifolds
            .iter()
            .filter_map(|manifold| manifold.find_deepest_contact())
            .min_by(|a, b| {
                a.dist
                    .partial_cmp(&b.dist)
                    .unwrap_or(core::cmp::Ordering::Equal)
            })
    }
}

/// An intersection pair between two colliders of which at least one is a sensor.
///
/// Sensor pairs never produce contact constraints; only a boolean
/// intersection status tracked across steps.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionPair {
    /// The first collider of the pair.
    pub collider1: ColliderHandle,
    /// The second collider of the pair.
    pub collider2: ColliderHandle,
    /// Whether the shapes are currently intersecting.
    pub intersecting: bool,
    /// Whether intersection events are enabled for the pair.
    pub(crate) events_enabled: bool,
    /// Whether a custom filter hook applies to the pair.
    pub(crate) custom_filter: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(dist: Scalar, fid: u32, impulse: Scalar) -> ContactPoint {
        ContactPoint {
            point1: Point::origin(),
            point2: Point::origin(),
            dist,
            feature_id1: PackedFeatureId::vertex(fid),
            feature_id2: PackedFeatureId::vertex(fid),
            normal_impulse: impulse,
            tangent_impulse: [0.0; 2],
        }
    }

    #[test]
    fn match_contacts_restores_impulses_by_feature() {
        let previous = [point(-0.01, 1, 2.5), point(-0.02, 2, 4.0)];

        let mut manifold = ContactManifold {
            points: vec![point(-0.015, 2, 0.0), point(-0.01, 3, 0.0)],
            normal: Vector::y(),
            friction: 0.5,
            restitution: 0.0,
        };
        manifold.match_contacts(&previous);

        // Feature 2 matched, feature 3 is a fresh contact.
        assert_eq!(manifold.points[0].normal_impulse, 4.0);
        assert_eq!(manifold.points[1].normal_impulse, 0.0);
    }

    #[test]
    fn deepest_contact() {
        let manifold = ContactManifold {
            points: vec![point(-0.01, 1, 0.0), point(-0.05, 2, 0.0), point(0.01, 3, 0.0)],
            normal: Vector::y(),
            friction: 0.5,
            restitution: 0.0,
        };
        assert_eq!(manifold.find_deepest_contact().unwrap().dist, -0.05);
    }
}
