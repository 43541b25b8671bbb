//! Velocity-level joint constraints solved with sequential impulses.

use nalgebra::Matrix3;

use crate::dynamics::joints::{Joint, JointKind};
use crate::dynamics::{RigidBody, RigidBodyHandle, RigidBodySet};
use crate::math::{Point, Scalar, Vector, tangent_basis};
use crate::parameters::IntegrationParameters;

/// Shared per-joint solver state: body handles, mass data, and anchors.
#[derive(Clone, Debug)]
struct JointBodies {
    body1: RigidBodyHandle,
    body2: RigidBodyHandle,
    inv_mass1: Scalar,
    inv_mass2: Scalar,
    inv_inertia1: Matrix3<Scalar>,
    inv_inertia2: Matrix3<Scalar>,
    /// World-space lever arm from the first body's center of mass.
    r1: Vector,
    /// World-space lever arm from the second body's center of mass.
    r2: Vector,
}

impl JointBodies {
    fn relative_anchor_velocity(&self, body1: &RigidBody, body2: &RigidBody) -> Vector {
        body2.linvel + body2.angvel.cross(&self.r2) - body1.linvel - body1.angvel.cross(&self.r1)
    }

    /// Applies `impulse` at the anchors: positively to the second body,
    /// negatively to the first.
    fn apply_anchor_impulse(&self, body1: &mut RigidBody, body2: &mut RigidBody, impulse: Vector) {
        body1.linvel -= impulse * self.inv_mass1;
        body1.angvel -= self.inv_inertia1 * self.r1.cross(&impulse);
        body2.linvel += impulse * self.inv_mass2;
        body2.angvel += self.inv_inertia2 * self.r2.cross(&impulse);
    }

    /// Applies a pure torque impulse: positively to the second body,
    /// negatively to the first.
    fn apply_angular_impulse(
        &self,
        body1: &mut RigidBody,
        body2: &mut RigidBody,
        impulse: Vector,
    ) {
        body1.angvel -= self.inv_inertia1 * impulse;
        body2.angvel += self.inv_inertia2 * impulse;
    }

    /// Inverse effective mass for an anchor impulse along `direction`.
    fn effective_mass(&self, direction: &Vector) -> Scalar {
        let angular1 = (self.inv_inertia1 * self.r1.cross(direction)).cross(&self.r1);
        let angular2 = (self.inv_inertia2 * self.r2.cross(direction)).cross(&self.r2);
        let k = self.inv_mass1 + self.inv_mass2 + (angular1 + angular2).dot(direction);
        if k > 0.0 { 1.0 / k } else { 0.0 }
    }

    /// The 3×3 effective-mass matrix of the point-to-point constraint,
    /// inverted, or `None` when both bodies are immovable.
    fn point_constraint_inv_k(&self) -> Option<Matrix3<Scalar>> {
        let skew1 = self.r1.cross_matrix();
        let skew2 = self.r2.cross_matrix();
        let k = Matrix3::from_diagonal_element(self.inv_mass1 + self.inv_mass2)
            - skew1 * self.inv_inertia1 * skew1
            - skew2 * self.inv_inertia2 * skew2;
        k.try_inverse()
    }

    /// The 3×3 effective-mass matrix of the angular-lock constraint,
    /// inverted, or `None` when both bodies are immovable.
    fn angular_lock_inv_k(&self) -> Option<Matrix3<Scalar>> {
        (self.inv_inertia1 + self.inv_inertia2).try_inverse()
    }
}

/// A point-to-point block: pins the two world anchors together.
#[derive(Clone, Debug)]
struct PointPart {
    inv_k: Matrix3<Scalar>,
    /// `erp / dt` times the current anchor separation.
    bias: Vector,
}

impl PointPart {
    fn new(shared: &JointBodies, anchor1: Point, anchor2: Point, bias_coefficient: Scalar) -> Option<Self> {
        Some(Self {
            inv_k: shared.point_constraint_inv_k()?,
            bias: (anchor2 - anchor1) * bias_coefficient,
        })
    }

    fn solve(&self, shared: &JointBodies, body1: &mut RigidBody, body2: &mut RigidBody) {
        let dv = shared.relative_anchor_velocity(body1, body2);
        let impulse = self.inv_k * -(dv + self.bias);
        shared.apply_anchor_impulse(body1, body2, impulse);
    }
}

/// An angular lock block: drives the relative angular velocity to zero while
/// correcting accumulated orientation drift.
#[derive(Clone, Debug)]
struct AngularLockPart {
    inv_k: Matrix3<Scalar>,
    bias: Vector,
}

impl AngularLockPart {
    fn new(
        shared: &JointBodies,
        body1: &RigidBody,
        body2: &RigidBody,
        reference_rotation: &crate::math::Rotation,
        bias_coefficient: Scalar,
    ) -> Option<Self> {
        // Orientation drift of body2 relative to where the joint wants it.
        let target = body1.position().rotation * reference_rotation;
        let error = (body2.position().rotation * target.inverse()).scaled_axis();
        Some(Self {
            inv_k: shared.angular_lock_inv_k()?,
            bias: error * bias_coefficient,
        })
    }

    fn solve(&self, shared: &JointBodies, body1: &mut RigidBody, body2: &mut RigidBody) {
        let dw = body2.angvel - body1.angvel;
        let impulse = self.inv_k * -(dw + self.bias);
        shared.apply_angular_impulse(body1, body2, impulse);
    }
}

/// The two angular rows of a hinge: keep the body axes aligned while leaving
/// rotation around the shared axis free.
#[derive(Clone, Debug)]
struct HingeAxesPart {
    /// Basis orthogonal to the hinge axis.
    basis: [Vector; 2],
    /// Inverse effective masses of the two rows.
    row_mass: [Scalar; 2],
    bias: [Scalar; 2],
}

impl HingeAxesPart {
    fn new(
        shared: &JointBodies,
        axis1_world: Vector,
        axis2_world: Vector,
        bias_coefficient: Scalar,
    ) -> Self {
        let basis = tangent_basis(&axis1_world);
        let angular_k = shared.inv_inertia1 + shared.inv_inertia2;
        // Misalignment of the second body's axis relative to the first's.
        let error = axis1_world.cross(&axis2_world);

        let mass_of = |direction: &Vector| {
            let k = (angular_k * direction).dot(direction);
            if k > 0.0 { 1.0 / k } else { 0.0 }
        };

        Self {
            row_mass: [mass_of(&basis[0]), mass_of(&basis[1])],
            bias: [
                error.dot(&basis[0]) * bias_coefficient,
                error.dot(&basis[1]) * bias_coefficient,
            ],
            basis,
        }
    }

    fn solve(&self, shared: &JointBodies, body1: &mut RigidBody, body2: &mut RigidBody) {
        for row in 0..2 {
            let dw = (body2.angvel - body1.angvel).dot(&self.basis[row]);
            let impulse = -self.row_mass[row] * (dw + self.bias[row]);
            shared.apply_angular_impulse(body1, body2, self.basis[row] * impulse);
        }
    }
}

/// The prepared, kind-specific constraint blocks of one joint.
#[derive(Clone, Debug)]
enum JointParts {
    Fixed {
        point: PointPart,
        angular: AngularLockPart,
    },
    Spherical {
        point: PointPart,
    },
    Revolute {
        point: PointPart,
        axes: HingeAxesPart,
    },
    Prismatic {
        angular: AngularLockPart,
        /// Directions orthogonal to the slide axis.
        basis: [Vector; 2],
        row_mass: [Scalar; 2],
        bias: [Scalar; 2],
        /// One-sided limit row along the axis, when a limit is violated:
        /// `(direction, effective mass, bias)`.
        limit: Option<(Vector, Scalar, Scalar)>,
    },
    Distance {
        /// Unit direction from the first anchor to the second.
        direction: Vector,
        /// Effective mass of the scalar distance row.
        mass: Scalar,
        bias: Scalar,
    },
}

/// A prepared velocity constraint for one joint.
#[derive(Clone, Debug)]
pub struct JointConstraint {
    shared: JointBodies,
    parts: JointParts,
}

impl JointConstraint {
    /// Prepares the constraint blocks for one joint, or returns `None` when
    /// the joint is degenerate this step (stale bodies, both endpoints
    /// immovable, or a zero-length distance configuration).
    pub fn build(
        joint: &Joint,
        params: &IntegrationParameters,
        bodies: &RigidBodySet,
    ) -> Option<JointConstraint> {
        let body1 = bodies.get(joint.body1)?;
        let body2 = bodies.get(joint.body2)?;
        if !body1.is_dynamic() && !body2.is_dynamic() {
            return None;
        }

        let bias_coefficient = params.erp * params.inv_dt();
        let (local_anchor1, local_anchor2) = match &joint.kind {
            JointKind::Fixed(fixed) => (fixed.local_anchor1, fixed.local_anchor2),
            JointKind::Spherical(spherical) => {
                (spherical.local_anchor1, spherical.local_anchor2)
            }
            JointKind::Revolute(revolute) => (revolute.local_anchor1, revolute.local_anchor2),
            JointKind::Prismatic(prismatic) => {
                (prismatic.local_anchor1, prismatic.local_anchor2)
            }
            JointKind::Distance(distance) => (distance.local_anchor1, distance.local_anchor2),
        };

        let anchor1 = body1.position() * local_anchor1;
        let anchor2 = body2.position() * local_anchor2;
        let shared = JointBodies {
            body1: joint.body1,
            body2: joint.body2,
            inv_mass1: body1.effective_inv_mass(),
            inv_mass2: body2.effective_inv_mass(),
            inv_inertia1: body1.effective_world_inv_inertia(),
            inv_inertia2: body2.effective_world_inv_inertia(),
            r1: anchor1 - body1.center_of_mass(),
            r2: anchor2 - body2.center_of_mass(),
        };

        let parts = match &joint.kind {
            JointKind::Fixed(fixed) => JointParts::Fixed {
                point: PointPart::new(&shared, anchor1, anchor2, bias_coefficient)?,
                angular: AngularLockPart::new(
                    &shared,
                    body1,
                    body2,
                    &fixed.reference_rotation,
                    bias_coefficient,
                )?,
            },
            JointKind::Spherical(_) => JointParts::Spherical {
                point: PointPart::new(&shared, anchor1, anchor2, bias_coefficient)?,
            },
            JointKind::Revolute(revolute) => {
                let axis1 = body1.position() * revolute.local_axis1.into_inner();
                let axis2 = body2.position() * revolute.local_axis2.into_inner();
                JointParts::Revolute {
                    point: PointPart::new(&shared, anchor1, anchor2, bias_coefficient)?,
                    axes: HingeAxesPart::new(&shared, axis1, axis2, bias_coefficient),
                }
            }
            JointKind::Prismatic(prismatic) => {
                let axis = body1.position() * prismatic.local_axis1.into_inner();
                let basis = tangent_basis(&axis);
                let separation = anchor2 - anchor1;

                let limit = prismatic.limits.and_then(|[min, max]| {
                    let along = separation.dot(&axis);
                    if along < min {
                        // Push the second body forwards along the axis.
                        Some((axis, shared.effective_mass(&axis), (along - min) * bias_coefficient))
                    } else if along > max {
                        Some((axis, shared.effective_mass(&axis), (along - max) * bias_coefficient))
                    } else {
                        None
                    }
                });

                JointParts::Prismatic {
                    angular: AngularLockPart::new(
                        &shared,
                        body1,
                        body2,
                        &prismatic.reference_rotation,
                        bias_coefficient,
                    )?,
                    row_mass: [
                        shared.effective_mass(&basis[0]),
                        shared.effective_mass(&basis[1]),
                    ],
                    bias: [
                        separation.dot(&basis[0]) * bias_coefficient,
                        separation.dot(&basis[1]) * bias_coefficient,
                    ],
                    basis,
                    limit,
                }
            }
            JointKind::Distance(distance) => {
                let separation = anchor2 - anchor1;
                let length = separation.norm();
                if length < 1.0e-6 {
                    return None;
                }
                let direction = separation / length;
                JointParts::Distance {
                    direction,
                    mass: shared.effective_mass(&direction),
                    bias: (length - distance.rest_length) * bias_coefficient,
                }
            }
        };

        Some(JointConstraint { shared, parts })
    }

    /// The two constrained bodies.
    #[inline]
    pub fn bodies(&self) -> (RigidBodyHandle, RigidBodyHandle) {
        (self.shared.body1, self.shared.body2)
    }

    /// Runs one sequential-impulse iteration over the joint's blocks.
    pub fn solve(&mut self, bodies: &mut RigidBodySet) {
        let Some((body1, body2)) = bodies.get2_mut(self.shared.body1, self.shared.body2) else {
            return;
        };
        let shared = &self.shared;

        match &self.parts {
            JointParts::Fixed { point, angular } => {
                angular.solve(shared, body1, body2);
                point.solve(shared, body1, body2);
            }
            JointParts::Spherical { point } => {
                point.solve(shared, body1, body2);
            }
            JointParts::Revolute { point, axes } => {
                axes.solve(shared, body1, body2);
                point.solve(shared, body1, body2);
            }
            JointParts::Prismatic {
                angular,
                basis,
                row_mass,
                bias,
                limit,
            } => {
                angular.solve(shared, body1, body2);
                for row in 0..2 {
                    let dv = shared.relative_anchor_velocity(body1, body2).dot(&basis[row]);
                    let impulse = -row_mass[row] * (dv + bias[row]);
                    shared.apply_anchor_impulse(body1, body2, basis[row] * impulse);
                }
                if let Some((direction, mass, bias)) = limit {
                    let dv = shared.relative_anchor_velocity(body1, body2).dot(direction);
                    let impulse = -mass * (dv + bias);
                    shared.apply_anchor_impulse(body1, body2, direction * impulse);
                }
            }
            JointParts::Distance {
                direction,
                mass,
                bias,
            } => {
                let dv = shared.relative_anchor_velocity(body1, body2).dot(direction);
                let impulse = -mass * (dv + bias);
                shared.apply_anchor_impulse(body1, body2, direction * impulse);
            }
        }
    }
}
