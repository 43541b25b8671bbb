//! The physics pipeline: orchestrates one fixed-timestep advance.

use crate::collision::{BroadPhase, BroadPhasePairs, ColliderSet, EventHandler, NarrowPhase,
    PhysicsHooks};
use crate::dynamics::{CcdSolver, IslandManager, IslandSolver, JointSet, RigidBodySet, integrator};
use crate::math::Vector;
use crate::parameters::{IntegrationParameters, SimulationConfig};

/// The orchestrator of one simulation step.
///
/// The pipeline owns only reusable workspace buffers; all entity and physics
/// *state* lives in the sets passed to [`step`](Self::step) by reference.
/// Discarding and reconstructing a pipeline between steps does not affect
/// simulation results, only allocation behavior.
///
/// Each step runs the stages in a fixed order, where every stage consumes
/// the previous stage's output: broad phase → narrow phase → islands →
/// solver → integration → CCD → sleep bookkeeping.
#[derive(Default)]
pub struct PhysicsPipeline {
    config: SimulationConfig,
    solver: IslandSolver,
    broad_phase_pairs: BroadPhasePairs,
}

impl PhysicsPipeline {
    /// Creates a pipeline with the default (sequential) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pipeline with the given execution configuration.
    ///
    /// Conflicting configurations are rejected by
    /// [`SimulationConfig::new`](crate::parameters::SimulationConfig::new)
    /// before a pipeline can be built from them.
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The pipeline's execution configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advances the simulation state by exactly `params.dt` seconds.
    ///
    /// No condition inside a step is fatal: the pipeline always completes
    /// and returns control, degrading accuracy rather than aborting under
    /// extreme inputs.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        gravity: &Vector,
        params: &IntegrationParameters,
        islands: &mut IslandManager,
        broad_phase: &mut BroadPhase,
        narrow_phase: &mut NarrowPhase,
        bodies: &mut RigidBodySet,
        colliders: &mut ColliderSet,
        joints: &mut JointSet,
        ccd_solver: &mut CcdSolver,
        hooks: &dyn PhysicsHooks,
        events: &dyn EventHandler,
    ) {
        events.step_started();

        // Kinematic velocities must be known before collision detection so
        // the broad phase can inflate AABBs by the step's motion.
        integrator::infer_kinematic_velocities(params, bodies);

        // Collision detection.
        colliders.refresh_positions(bodies);
        let parallel_enabled = self.parallel_enabled();
        broad_phase.update(
            params,
            bodies,
            colliders,
            &mut self.broad_phase_pairs,
            parallel_enabled,
        );
        narrow_phase.register_pairs(bodies, colliders, &self.broad_phase_pairs, events);
        narrow_phase.update(params, bodies, colliders, hooks, events);

        // A moving kinematic body must wake the sleeping bodies it is
        // already resting against, since no touching transition will fire
        // for them.
        wake_bodies_touching_moving_kinematics(narrow_phase, bodies);

        // Island discovery and the constraint solve.
        islands.update(bodies, narrow_phase, joints);
        integrator::apply_forces_and_gravity(params, gravity, islands, bodies);
        ccd_solver.collect_start_poses(islands, bodies);
        self.solver.solve(params, islands, bodies, narrow_phase, joints);
        integrator::integrate_poses(params, islands, bodies);

        // Tunneling correction for fast bodies, on their integrated poses.
        ccd_solver.solve(params, bodies, colliders);

        // Leave collider world poses in sync with the integrated body poses
        // for readers between steps.
        colliders.refresh_positions(bodies);

        islands.update_sleep_state(params, bodies);

        for (_, body) in bodies.iter_mut() {
            body.reset_forces();
        }
    }

    fn parallel_enabled(&self) -> bool {
        cfg!(feature = "parallel") && self.config.parallel()
    }
}

/// Wakes every sleeping dynamic body in touching contact with a moving
/// kinematic body.
fn wake_bodies_touching_moving_kinematics(
    narrow_phase: &NarrowPhase,
    bodies: &mut RigidBodySet,
) {
    let mut to_wake = Vec::new();
    for pair in narrow_phase.contact_graph().iter() {
        if !pair.is_touching() {
            continue;
        }
        for (kinematic, other) in [(pair.body1, pair.body2), (pair.body2, pair.body1)] {
            let moving_kinematic = bodies.get(kinematic).is_some_and(|body| {
                body.is_kinematic()
                    && (body.linvel().norm_squared() > 0.0 || body.angvel().norm_squared() > 0.0)
            });
            let sleeping_dynamic = bodies
                .get(other)
                .is_some_and(|body| body.is_dynamic() && body.is_sleeping());
            if moving_kinematic && sleeping_dynamic {
                to_wake.push(other);
            }
        }
    }
    for handle in to_wake {
        bodies.wake_up(handle);
    }
}
