//! Island discovery and sleep management.
//!
//! An island is a maximal set of awake dynamic bodies transitively connected
//! by touching contacts or joints. Islands are solved independently, and an
//! island whose bodies all stay below the sleep velocity thresholds for long
//! enough is deactivated as a unit: sleeping islands are skipped by the
//! solver and the narrow phase until something wakes one of their bodies.

use std::collections::HashMap;

use crate::collision::NarrowPhase;
use crate::dynamics::joints::JointSet;
use crate::dynamics::{RigidBodyHandle, RigidBodySet};
use crate::parameters::IntegrationParameters;

/// One island of connected awake dynamic bodies.
#[derive(Clone, Debug, Default)]
pub struct Island {
    /// The dynamic bodies in this island.
    bodies: Vec<RigidBodyHandle>,
}

impl Island {
    /// The dynamic bodies in this island.
    #[inline]
    pub fn bodies(&self) -> &[RigidBodyHandle] {
        &self.bodies
    }

    /// The number of bodies in this island.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns `true` if the island has no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Partitions awake dynamic bodies into independent islands and manages
/// their sleep state.
#[derive(Clone, Debug, Default)]
pub struct IslandManager {
    islands: Vec<Island>,
    island_of: HashMap<RigidBodyHandle, usize>,
    // Workspaces reused across steps.
    adjacency: HashMap<RigidBodyHandle, Vec<RigidBodyHandle>>,
    stack: Vec<RigidBodyHandle>,
}

impl IslandManager {
    /// Creates an empty island manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The islands discovered by the last [`update`](Self::update).
    #[inline]
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    /// The island index of the given body, if it is an awake dynamic body.
    pub fn island_of(&self, body: RigidBodyHandle) -> Option<usize> {
        self.island_of.get(&body).copied()
    }

    /// Iterates over the handles of all awake dynamic bodies.
    pub fn active_bodies(&self) -> impl Iterator<Item = RigidBodyHandle> + '_ {
        self.islands.iter().flat_map(|island| island.bodies()).copied()
    }

    /// Rebuilds the islands from the current contact and joint connectivity
    /// and propagates wake-ups within them.
    ///
    /// Only dynamic bodies become island members; static and kinematic
    /// bodies act as boundaries, never as bridges, so two dynamic bodies
    /// resting on the same static floor still belong to separate islands.
    ///
    /// An island with at least one awake member wakes all of its members,
    /// since they are dynamically coupled. Islands whose members are all
    /// asleep are discarded entirely: nothing downstream sees them until
    /// something wakes one of their bodies.
    pub fn update(
        &mut self,
        bodies: &mut RigidBodySet,
        narrow_phase: &NarrowPhase,
        joints: &JointSet,
    ) {
        self.islands.clear();
        self.island_of.clear();
        self.adjacency.clear();

        let is_member = |handle: RigidBodyHandle| {
            bodies.get(handle).is_some_and(|body| body.is_dynamic())
        };

        // Touching non-sensor contacts couple their two dynamic bodies.
        for pair in narrow_phase.contact_graph().iter() {
            if pair.is_touching() && is_member(pair.body1) && is_member(pair.body2) {
                self.adjacency.entry(pair.body1).or_default().push(pair.body2);
                self.adjacency.entry(pair.body2).or_default().push(pair.body1);
            }
        }

        // So do joints.
        for (_, joint) in joints.iter() {
            if is_member(joint.body1) && is_member(joint.body2) {
                self.adjacency.entry(joint.body1).or_default().push(joint.body2);
                self.adjacency.entry(joint.body2).or_default().push(joint.body1);
            }
        }

        // Depth-first traversal with an explicit stack, starting from each
        // not-yet-visited dynamic body in storage order.
        let mut visited: std::collections::HashSet<RigidBodyHandle> = std::collections::HashSet::new();
        let roots: Vec<RigidBodyHandle> = bodies
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .map(|(handle, _)| handle)
            .collect();

        for handle in roots {
            if visited.contains(&handle) {
                continue;
            }

            let mut island = Island::default();
            let mut any_awake = false;

            self.stack.clear();
            self.stack.push(handle);
            visited.insert(handle);

            while let Some(current) = self.stack.pop() {
                any_awake |= bodies.get(current).is_some_and(|body| !body.is_sleeping());
                island.bodies.push(current);
                if let Some(neighbors) = self.adjacency.get(&current) {
                    for &neighbor in neighbors {
                        if visited.insert(neighbor) {
                            self.stack.push(neighbor);
                        }
                    }
                }
            }

            // A fully sleeping island is skipped entirely; nothing downstream
            // sees it until something wakes one of its bodies.
            if !any_awake {
                continue;
            }

            // Wake propagation: one awake member wakes the whole island.
            let island_index = self.islands.len();
            for &member in &island.bodies {
                self.island_of.insert(member, island_index);
                if let Some(body) = bodies.get_mut(member) {
                    if body.is_sleeping() {
                        body.wake_up();
                    }
                }
            }
            self.islands.push(island);
        }
    }

    /// Advances the sleep timers after a solve and puts islands whose bodies
    /// all stayed below the velocity thresholds for long enough to sleep.
    ///
    /// An island sleeps as a unit: a single fast body keeps every body of
    /// its island awake, since they are dynamically coupled.
    pub fn update_sleep_state(&self, params: &IntegrationParameters, bodies: &mut RigidBodySet) {
        if params.sleep_linear_threshold < 0.0 {
            return;
        }

        let linear_sq = params.sleep_linear_threshold * params.sleep_linear_threshold;
        let angular_sq = params.sleep_angular_threshold * params.sleep_angular_threshold;

        for island in &self.islands {
            let mut can_sleep = true;
            for &handle in island.bodies() {
                let Some(body) = bodies.get(handle) else {
                    continue;
                };
                if !body.can_sleep()
                    || body.linvel().norm_squared() > linear_sq
                    || body.angvel().norm_squared() > angular_sq
                {
                    can_sleep = false;
                    break;
                }
            }

            if !can_sleep {
                for &handle in island.bodies() {
                    if let Some(body) = bodies.get_mut(handle) {
                        body.time_sleeping = 0.0;
                    }
                }
                continue;
            }

            let mut min_time = crate::math::Scalar::MAX;
            for &handle in island.bodies() {
                if let Some(body) = bodies.get_mut(handle) {
                    body.time_sleeping += params.dt;
                    min_time = min_time.min(body.time_sleeping);
                }
            }

            if min_time >= params.sleep_time_threshold {
                for &handle in island.bodies() {
                    if let Some(body) = bodies.get_mut(handle) {
                        body.sleep();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::RigidBodyBuilder;
    use crate::dynamics::joints::SphericalJoint;

    #[test]
    fn joints_bridge_islands_static_bodies_do_not() {
        let mut bodies = RigidBodySet::new();
        let mut joints = JointSet::new();
        let narrow_phase = NarrowPhase::new();

        let a = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        let b = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        let c = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        let anchor = bodies.insert(RigidBodyBuilder::fixed().build().unwrap());

        joints
            .insert(a, b, SphericalJoint::new(), &mut bodies)
            .unwrap();
        // A joint to a static body does not merge islands.
        joints
            .insert(c, anchor, SphericalJoint::new(), &mut bodies)
            .unwrap();

        let mut islands = IslandManager::new();
        islands.update(&mut bodies, &narrow_phase, &joints);

        assert_eq!(islands.islands().len(), 2);
        assert_eq!(islands.island_of(a), islands.island_of(b));
        assert_ne!(islands.island_of(a), islands.island_of(c));
        assert_eq!(islands.island_of(anchor), None);
    }

    #[test]
    fn sleep_requires_sustained_low_velocity() {
        let mut bodies = RigidBodySet::new();
        let joints = JointSet::new();
        let narrow_phase = NarrowPhase::new();
        let params = IntegrationParameters::default();

        let handle = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());

        let mut islands = IslandManager::new();
        let steps_needed =
            (params.sleep_time_threshold / params.dt).ceil() as usize + 1;

        for _ in 0..steps_needed {
            islands.update(&mut bodies, &narrow_phase, &joints);
            islands.update_sleep_state(&params, &mut bodies);
        }
        assert!(bodies.get(handle).unwrap().is_sleeping());

        // Waking resets the timer.
        bodies.get_mut(handle).unwrap().wake_up();
        islands.update(&mut bodies, &narrow_phase, &joints);
        islands.update_sleep_state(&params, &mut bodies);
        assert!(!bodies.get(handle).unwrap().is_sleeping());
    }
}
