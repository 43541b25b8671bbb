//! Force application and semi-implicit Euler pose integration.

use crate::dynamics::island::IslandManager;
use crate::dynamics::RigidBodySet;
use crate::math::{Rotation, Vector};
use crate::parameters::IntegrationParameters;

/// Applies gravity and accumulated forces to all awake dynamic bodies,
/// producing the pre-solve velocities.
///
/// Gravity is a uniform acceleration scaled by each body's gravity scale;
/// bodies with zero mass (no colliders and no explicit mass) are immune to
/// both gravity and forces.
pub fn apply_forces_and_gravity(
    params: &IntegrationParameters,
    gravity: &Vector,
    islands: &IslandManager,
    bodies: &mut RigidBodySet,
) {
    for handle in islands.active_bodies() {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        let inv_mass = body.effective_inv_mass();
        if inv_mass > 0.0 {
            let acceleration = gravity * body.gravity_scale() + body.force * inv_mass;
            body.linvel += acceleration * params.dt;
            let angular = body.effective_world_inv_inertia() * body.torque;
            body.angvel += angular * params.dt;
        }
    }
}

/// Infers the velocity of every kinematic body from its pose target.
///
/// A kinematic body with a target moves so that it lands exactly on the
/// target at the end of the step; the inferred velocity is what dynamic
/// bodies in contact react to. A kinematic body without a target holds
/// still.
pub fn infer_kinematic_velocities(params: &IntegrationParameters, bodies: &mut RigidBodySet) {
    let inv_dt = params.inv_dt();
    for (_, body) in bodies.iter_mut() {
        if !body.is_kinematic() {
            continue;
        }
        match body.next_kinematic_position {
            Some(target) => {
                body.linvel =
                    (target.translation.vector - body.position.translation.vector) * inv_dt;
                body.angvel =
                    (target.rotation * body.position.rotation.inverse()).scaled_axis() * inv_dt;
            }
            None => {
                body.linvel = Vector::zeros();
                body.angvel = Vector::zeros();
            }
        }
    }
}

/// Integrates the poses of all awake dynamic bodies from their post-solve
/// velocities, and moves kinematic bodies onto their targets.
pub fn integrate_poses(
    params: &IntegrationParameters,
    islands: &IslandManager,
    bodies: &mut RigidBodySet,
) {
    for handle in islands.active_bodies() {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        body.position.translation.vector += body.linvel * params.dt;
        body.position.rotation =
            Rotation::from_scaled_axis(body.angvel * params.dt) * body.position.rotation;
    }

    for (_, body) in bodies.iter_mut() {
        if !body.is_kinematic() {
            continue;
        }
        if let Some(target) = body.next_kinematic_position.take() {
            // Land exactly on the target; no drift from the velocity
            // integration above.
            body.position = target;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::NarrowPhase;
    use crate::dynamics::joints::JointSet;
    use crate::dynamics::RigidBodyBuilder;
    use crate::math::Isometry;
    use approx::assert_relative_eq;

    #[test]
    fn gravity_accelerates_only_bodies_with_mass() {
        let params = IntegrationParameters::default();
        let gravity = Vector::new(0.0, -9.81, 0.0);

        let mut bodies = RigidBodySet::new();
        let massless = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        let massive = bodies.insert(
            RigidBodyBuilder::dynamic().additional_mass(2.0).build().unwrap(),
        );

        let mut islands = IslandManager::new();
        islands.update(&mut bodies, &NarrowPhase::new(), &JointSet::new());
        apply_forces_and_gravity(&params, &gravity, &islands, &mut bodies);

        assert_eq!(bodies.get(massless).unwrap().linvel(), Vector::zeros());
        assert_relative_eq!(
            bodies.get(massive).unwrap().linvel().y,
            -9.81 * params.dt,
            epsilon = 1.0e-6
        );
    }

    #[test]
    fn kinematic_body_lands_exactly_on_target() {
        let params = IntegrationParameters::default();
        let mut bodies = RigidBodySet::new();
        let handle = bodies.insert(RigidBodyBuilder::kinematic().build().unwrap());

        let target = Isometry::translation(1.0, 2.0, 3.0);
        bodies
            .get_mut(handle)
            .unwrap()
            .set_next_kinematic_position(target);

        infer_kinematic_velocities(&params, &mut bodies);
        let implied = bodies.get(handle).unwrap().linvel();
        assert_relative_eq!(implied.x, 1.0 / params.dt, epsilon = 1.0e-3);

        let mut islands = IslandManager::new();
        islands.update(&mut bodies, &NarrowPhase::new(), &JointSet::new());
        integrate_poses(&params, &islands, &mut bodies);

        let body = bodies.get(handle).unwrap();
        assert_eq!(body.position().translation.vector, Vector::new(1.0, 2.0, 3.0));

        // Without a new target the body holds still.
        infer_kinematic_velocities(&params, &mut bodies);
        assert_eq!(bodies.get(handle).unwrap().linvel(), Vector::zeros());
    }
}
