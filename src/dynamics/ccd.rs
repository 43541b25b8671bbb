//! Continuous collision detection for fast-moving bodies.
//!
//! Physics stepping is discrete: a body moving further than its own size in
//! one step can pass through thin geometry without the narrow phase ever
//! seeing an overlap (*tunneling*). For bodies that opted in with the CCD
//! flag, the [`CcdSolver`] sweeps the step's motion and clamps it to the
//! earliest time of impact, so the next step's narrow phase finds the
//! contact and resolves it normally.
//!
//! Only bodies whose per-step travel exceeds a size-relative threshold are
//! swept, which bounds the cost to genuinely fast bodies.

use parry3d::query::{self, ShapeCastOptions};

use crate::collision::ColliderSet;
use crate::dynamics::island::IslandManager;
use crate::dynamics::{RigidBodyHandle, RigidBodySet};
use crate::math::{Isometry, Scalar, Vector};
use crate::parameters::IntegrationParameters;

/// The swept CCD solver.
///
/// Holds only per-step workspace; all state lives in the body and collider
/// sets.
#[derive(Clone, Debug, Default)]
pub struct CcdSolver {
    /// Pre-integration poses of this step's CCD candidates.
    start_poses: Vec<(RigidBodyHandle, Isometry)>,
}

impl CcdSolver {
    /// Creates a CCD solver with empty workspaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pre-integration poses of all awake CCD-enabled dynamic
    /// bodies. Called before pose integration.
    pub fn collect_start_poses(&mut self, islands: &IslandManager, bodies: &RigidBodySet) {
        self.start_poses.clear();
        for handle in islands.active_bodies() {
            if let Some(body) = bodies.get(handle) {
                if body.ccd_enabled() {
                    self.start_poses.push((handle, *body.position()));
                }
            }
        }
    }

    /// Sweeps each recorded candidate from its pre-step pose to its
    /// integrated pose and clamps the motion to the earliest time of impact
    /// found against any other collider.
    ///
    /// Called after pose integration. The clamped body keeps its velocity;
    /// the next step's narrow phase sees the near-touching pair and the
    /// solver resolves it, which is what stops tunneling projectiles dead
    /// instead of letting them pass through thin walls.
    pub fn solve(
        &mut self,
        params: &IntegrationParameters,
        bodies: &mut RigidBodySet,
        colliders: &ColliderSet,
    ) {
        for &(handle, start_pose) in &self.start_poses {
            let Some(body) = bodies.get(handle) else {
                continue;
            };

            let motion =
                body.position().translation.vector - start_pose.translation.vector;
            let travel = motion.norm();
            let Some(threshold) = motion_threshold(params, body.colliders(), colliders) else {
                continue;
            };
            if travel <= threshold {
                continue;
            }

            let mut min_toi: Scalar = 1.0;
            for &own_handle in body.colliders() {
                let Some(own) = colliders.get(own_handle) else {
                    continue;
                };
                if own.is_sensor() {
                    continue;
                }
                let swept_pose = start_pose * own.position_wrt_parent();

                for (_, other) in colliders.iter() {
                    if other.parent() == handle || other.is_sensor() {
                        continue;
                    }
                    if !own.collision_layers.interacts_with(other.collision_layers) {
                        continue;
                    }

                    // The other body's own motion over the step, so that two
                    // fast bodies flying in formation don't report impacts.
                    let other_motion = bodies
                        .get(other.parent())
                        .map_or(Vector::zeros(), |other_body| {
                            other_body.linvel() * params.dt
                        });

                    let hit = query::cast_shapes(
                        &swept_pose,
                        &motion,
                        &**own.shape(),
                        other.position(),
                        &other_motion,
                        &**other.shape(),
                        ShapeCastOptions {
                            max_time_of_impact: min_toi,
                            target_distance: 0.0,
                            stop_at_penetration: false,
                            compute_impact_geometry_on_penetration: false,
                        },
                    );

                    if let Ok(Some(hit)) = hit {
                        min_toi = min_toi.min(hit.time_of_impact);
                    }
                }
            }

            if min_toi < 1.0 {
                let Some(body) = bodies.get_mut(handle) else {
                    continue;
                };
                // Clamp the translation to the time of impact; the rotation
                // keeps its integrated value (linear sweep). The velocity is
                // left untouched for the next step's contact resolution.
                body.position.translation.vector =
                    start_pose.translation.vector + motion * min_toi;
                body.wake_up();
            }
        }

        self.start_poses.clear();
    }
}

/// The travel distance above which a body's motion is swept: a fraction of
/// its smallest collider extent. Returns `None` for bodies with no
/// colliders, which cannot tunnel through anything.
fn motion_threshold(
    params: &IntegrationParameters,
    collider_handles: &[crate::collision::ColliderHandle],
    colliders: &ColliderSet,
) -> Option<Scalar> {
    collider_handles
        .iter()
        .filter_map(|&handle| colliders.get(handle))
        .map(|collider| collider.smallest_extent())
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal))
        .map(|extent| params.ccd_motion_threshold_factor * extent)
}
