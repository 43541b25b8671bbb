//! The island constraint solver.
//!
//! Each step, the solver assembles velocity constraints for every touching
//! contact and every joint whose bodies belong to an awake island, runs a
//! fixed number of sequential-impulse iterations (projected Gauss-Seidel),
//! and writes the corrected velocities back to the bodies. Positions are
//! integrated afterwards by the [integrator](super::integrator).
//!
//! Constraints are assembled in ascending pair-key order for contacts and
//! ascending handle order for joints. This is the deterministic tie-break of
//! the sequential execution path; islands share no bodies, so iterating the
//! global ordered constraint list is equivalent to solving each island in
//! isolation.

mod contact_constraint;
mod joint_constraint;

pub use contact_constraint::{ContactConstraint, MAX_MANIFOLD_POINTS};
pub use joint_constraint::JointConstraint;

use crate::collision::NarrowPhase;
use crate::dynamics::island::IslandManager;
use crate::dynamics::joints::JointSet;
use crate::dynamics::RigidBodySet;
use crate::parameters::IntegrationParameters;

/// The constraint solver. Holds only reusable workspace buffers; all
/// simulation state lives in the sets passed to [`solve`](Self::solve).
#[derive(Clone, Debug, Default)]
pub struct IslandSolver {
    contact_constraints: Vec<ContactConstraint>,
    joint_constraints: Vec<JointConstraint>,
}

impl IslandSolver {
    /// Creates a solver with empty workspaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles and solves the contact and joint constraints of all awake
    /// islands, leaving corrected velocities on the bodies and accumulated
    /// impulses on the contact pairs.
    pub fn solve(
        &mut self,
        params: &IntegrationParameters,
        islands: &IslandManager,
        bodies: &mut RigidBodySet,
        narrow_phase: &mut NarrowPhase,
        joints: &JointSet,
    ) {
        self.assemble(params, islands, bodies, narrow_phase, joints);

        // The bounded iterative solve. Never runs unbounded: residual
        // constraint violation after the last iteration is accepted.
        for _ in 0..params.solver_iterations {
            for joint in &mut self.joint_constraints {
                joint.solve(bodies);
            }
            for contact in &mut self.contact_constraints {
                contact.solve(bodies);
            }
        }

        // Persist accumulated impulses for warm starting the next step.
        let contact_graph = narrow_phase.contact_graph_mut();
        for constraint in &self.contact_constraints {
            if let Some(pair) = contact_graph.edge_weight_mut(constraint.edge()) {
                constraint.writeback_impulses(pair);
            }
        }
    }

    /// Builds this step's constraint lists.
    fn assemble(
        &mut self,
        params: &IntegrationParameters,
        islands: &IslandManager,
        bodies: &mut RigidBodySet,
        narrow_phase: &NarrowPhase,
        joints: &JointSet,
    ) {
        self.contact_constraints.clear();
        self.joint_constraints.clear();

        // Joints in ascending handle order. `JointSet::iter` yields slot
        // order, which is exactly that.
        for (_, joint) in joints.iter() {
            let in_awake_island = islands.island_of(joint.body1).is_some()
                || islands.island_of(joint.body2).is_some();
            if !in_awake_island {
                continue;
            }
            if let Some(constraint) = JointConstraint::build(joint, params, bodies) {
                self.joint_constraints.push(constraint);
            }
        }

        // Contacts in ascending pair-key order.
        let mut entries: Vec<_> = narrow_phase.contact_graph().edge_entries().collect();
        entries.sort_unstable_by_key(|(key, _)| *key);

        for (_, edge) in entries {
            let Some(pair) = narrow_phase.contact_graph().edge_weight(edge) else {
                continue;
            };
            // Both touching and speculative manifolds are solved; the latter
            // prevent fast approaches from overshooting within one step.
            if pair.manifolds.iter().all(|manifold| manifold.points.is_empty()) {
                continue;
            }
            // Every dynamic participant must be an awake island member; a
            // sleeping body is only disturbed once an actual touching
            // transition wakes it.
            let member1 = islands.island_of(pair.body1);
            let member2 = islands.island_of(pair.body2);
            let dynamic1 = bodies.get(pair.body1).is_some_and(|body| body.is_dynamic());
            let dynamic2 = bodies.get(pair.body2).is_some_and(|body| body.is_dynamic());
            if (dynamic1 && member1.is_none())
                || (dynamic2 && member2.is_none())
                || (member1.is_none() && member2.is_none())
            {
                continue;
            }
            ContactConstraint::build_for_pair(
                pair,
                edge,
                params,
                bodies,
                &mut self.contact_constraints,
            );
        }
    }
}
