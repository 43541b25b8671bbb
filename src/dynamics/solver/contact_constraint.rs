//! Velocity-level contact constraints solved with sequential impulses.

use arrayvec::ArrayVec;
use nalgebra::Matrix3;

use crate::collision::ContactPair;
use crate::data_structures::EdgeIndex;
use crate::dynamics::{RigidBody, RigidBodyHandle, RigidBodySet};
use crate::math::{Scalar, Vector, tangent_basis};
use crate::parameters::IntegrationParameters;

/// The maximum number of contact points solved per manifold.
///
/// Manifolds between convex shapes have at most four points; deeper
/// manifolds from composite shapes are truncated to their first four.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// Precomputed per-point solver state.
#[derive(Clone, Copy, Debug)]
struct ContactPointConstraint {
    /// Offset from the first body's center of mass to the contact point.
    r1: Vector,
    /// Offset from the second body's center of mass to the contact point.
    r2: Vector,
    /// Inverse effective mass along the contact normal.
    normal_mass: Scalar,
    /// Inverse effective masses along the two friction tangents.
    tangent_mass: [Scalar; 2],
    /// The separating velocity the solver drives the point towards:
    /// positive for penetration correction and restitution, negative for
    /// speculative contacts that may still close their gap.
    target_velocity: Scalar,
    /// Accumulated impulse along the normal. Never negative.
    normal_impulse: Scalar,
    /// Accumulated impulses along the tangents, clamped to the friction cone.
    tangent_impulse: [Scalar; 2],
    /// Index of the source point in its manifold, for impulse write-back.
    point_index: usize,
}

/// A solver constraint covering one contact manifold.
#[derive(Clone, Debug)]
pub struct ContactConstraint {
    body1: RigidBodyHandle,
    body2: RigidBodyHandle,
    inv_mass1: Scalar,
    inv_mass2: Scalar,
    inv_inertia1: Matrix3<Scalar>,
    inv_inertia2: Matrix3<Scalar>,
    normal: Vector,
    tangents: [Vector; 2],
    friction: Scalar,
    points: ArrayVec<ContactPointConstraint, MAX_MANIFOLD_POINTS>,
    /// The contact-graph edge this constraint was built from.
    edge: EdgeIndex,
    /// The manifold index within the pair.
    manifold_index: usize,
}

impl ContactConstraint {
    /// Builds the solver constraints for one contact pair, one per manifold
    /// with at least one point, and warm-starts the accumulated impulses.
    pub fn build_for_pair(
        pair: &ContactPair,
        edge: EdgeIndex,
        params: &IntegrationParameters,
        bodies: &mut RigidBodySet,
        out: &mut Vec<ContactConstraint>,
    ) {
        // Copy the body state needed for assembly up front; the set is
        // borrowed mutably again below for warm starting.
        let (inv_mass1, inv_inertia1, com1, linvel1, angvel1) = {
            let Some(body) = bodies.get(pair.body1) else {
                return;
            };
            (
                body.effective_inv_mass(),
                body.effective_world_inv_inertia(),
                body.center_of_mass(),
                body.linvel(),
                body.angvel(),
            )
        };
        let (inv_mass2, inv_inertia2, com2, linvel2, angvel2) = {
            let Some(body) = bodies.get(pair.body2) else {
                return;
            };
            (
                body.effective_inv_mass(),
                body.effective_world_inv_inertia(),
                body.center_of_mass(),
                body.linvel(),
                body.angvel(),
            )
        };

        for (manifold_index, manifold) in pair.manifolds.iter().enumerate() {
            if manifold.points.is_empty() {
                continue;
            }

            let normal = manifold.normal;
            let tangents = tangent_basis(&normal);
            let mut constraint = ContactConstraint {
                body1: pair.body1,
                body2: pair.body2,
                inv_mass1,
                inv_mass2,
                inv_inertia1,
                inv_inertia2,
                normal,
                tangents,
                friction: manifold.friction,
                points: ArrayVec::new(),
                edge,
                manifold_index,
            };

            for (point_index, point) in
                manifold.points.iter().take(MAX_MANIFOLD_POINTS).enumerate()
            {
                let r1 = point.point1 - com1;
                let r2 = point.point2 - com2;

                let normal_mass = effective_mass(
                    &normal,
                    &r1,
                    &r2,
                    inv_mass1,
                    inv_mass2,
                    &inv_inertia1,
                    &inv_inertia2,
                );
                let tangent_mass = [
                    effective_mass(
                        &tangents[0],
                        &r1,
                        &r2,
                        inv_mass1,
                        inv_mass2,
                        &inv_inertia1,
                        &inv_inertia2,
                    ),
                    effective_mass(
                        &tangents[1],
                        &r1,
                        &r2,
                        inv_mass1,
                        inv_mass2,
                        &inv_inertia1,
                        &inv_inertia2,
                    ),
                ];

                // Approach velocity before the solve, for restitution.
                let dv = linvel2 + angvel2.cross(&r2) - linvel1 - angvel1.cross(&r1);
                let vn = dv.dot(&normal);

                let target_velocity = if point.dist > 0.0 {
                    // Speculative contact: the bodies may close the remaining
                    // gap during this step, but no further.
                    -point.dist * params.inv_dt()
                } else {
                    let bias = params.erp
                        * params.inv_dt()
                        * (point.penetration() - params.allowed_penetration).max(0.0);
                    let restitution = if vn < -params.restitution_threshold {
                        -manifold.restitution * vn
                    } else {
                        0.0
                    };
                    bias.max(restitution)
                };

                constraint.points.push(ContactPointConstraint {
                    r1,
                    r2,
                    normal_mass,
                    tangent_mass,
                    target_velocity,
                    normal_impulse: point.normal_impulse,
                    tangent_impulse: point.tangent_impulse,
                    point_index,
                });
            }

            constraint.warm_start(bodies);
            out.push(constraint);
        }
    }

    /// Re-applies last step's accumulated impulses so the iterative solve
    /// starts near the converged solution.
    fn warm_start(&self, bodies: &mut RigidBodySet) {
        let Some((body1, body2)) = bodies.get2_mut(self.body1, self.body2) else {
            return;
        };
        for point in &self.points {
            let impulse = self.normal * point.normal_impulse
                + self.tangents[0] * point.tangent_impulse[0]
                + self.tangents[1] * point.tangent_impulse[1];
            self.apply_impulse(body1, body2, point, impulse);
        }
    }

    /// Runs one sequential-impulse iteration over the manifold's points.
    pub fn solve(&mut self, bodies: &mut RigidBodySet) {
        let Some((body1, body2)) = bodies.get2_mut(self.body1, self.body2) else {
            return;
        };

        let normal = self.normal;
        let tangents = self.tangents;
        let friction = self.friction;

        for i in 0..self.points.len() {
            let point = self.points[i];

            // Non-penetration along the normal, with accumulated clamping.
            let dv = relative_velocity(body1, body2, &point.r1, &point.r2);
            let vn = dv.dot(&normal);
            let delta = -point.normal_mass * (vn - point.target_velocity);
            let new_impulse = (point.normal_impulse + delta).max(0.0);
            let applied = new_impulse - point.normal_impulse;
            self.points[i].normal_impulse = new_impulse;
            self.apply_impulse(body1, body2, &point, normal * applied);

            // Coulomb friction along both tangents, clamped to the cone.
            let max_tangent_impulse = friction * self.points[i].normal_impulse;
            for (axis, tangent) in tangents.iter().enumerate() {
                let point = self.points[i];
                let dv = relative_velocity(body1, body2, &point.r1, &point.r2);
                let vt = dv.dot(tangent);
                let delta = -point.tangent_mass[axis] * vt;
                let new_impulse = (point.tangent_impulse[axis] + delta)
                    .clamp(-max_tangent_impulse, max_tangent_impulse);
                let applied = new_impulse - point.tangent_impulse[axis];
                self.points[i].tangent_impulse[axis] = new_impulse;
                self.apply_impulse(body1, body2, &point, tangent * applied);
            }
        }
    }

    /// Copies the accumulated impulses back into the contact pair, so the
    /// next step can warm-start from them and users can query them.
    pub fn writeback_impulses(&self, pair: &mut ContactPair) {
        let Some(manifold) = pair.manifolds.get_mut(self.manifold_index) else {
            return;
        };
        for point in &self.points {
            if let Some(target) = manifold.points.get_mut(point.point_index) {
                target.normal_impulse = point.normal_impulse;
                target.tangent_impulse = point.tangent_impulse;
            }
        }
    }

    /// The contact-graph edge this constraint was built from.
    #[inline]
    pub fn edge(&self) -> EdgeIndex {
        self.edge
    }

    /// The two constrained bodies.
    #[inline]
    pub fn bodies(&self) -> (RigidBodyHandle, RigidBodyHandle) {
        (self.body1, self.body2)
    }

    /// Applies `impulse` to the second body and its opposite to the first.
    #[inline]
    fn apply_impulse(
        &self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        point: &ContactPointConstraint,
        impulse: Vector,
    ) {
        body1.linvel -= impulse * self.inv_mass1;
        body1.angvel -= self.inv_inertia1 * point.r1.cross(&impulse);
        body2.linvel += impulse * self.inv_mass2;
        body2.angvel += self.inv_inertia2 * point.r2.cross(&impulse);
    }
}

/// The relative velocity of the contact point as seen from the two bodies.
#[inline]
fn relative_velocity(body1: &RigidBody, body2: &RigidBody, r1: &Vector, r2: &Vector) -> Vector {
    body2.linvel + body2.angvel.cross(r2) - body1.linvel - body1.angvel.cross(r1)
}

/// Inverse of the effective mass seen by an impulse along `direction`
/// applied at the two lever arms.
#[inline]
fn effective_mass(
    direction: &Vector,
    r1: &Vector,
    r2: &Vector,
    inv_mass1: Scalar,
    inv_mass2: Scalar,
    inv_inertia1: &Matrix3<Scalar>,
    inv_inertia2: &Matrix3<Scalar>,
) -> Scalar {
    let angular1 = (inv_inertia1 * r1.cross(direction)).cross(r1);
    let angular2 = (inv_inertia2 * r2.cross(direction)).cross(r2);
    let k = inv_mass1 + inv_mass2 + (angular1 + angular2).dot(direction);
    if k > 0.0 { 1.0 / k } else { 0.0 }
}
