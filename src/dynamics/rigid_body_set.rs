//! The arena of rigid bodies.

use crate::arena::Arena;
use crate::collision::ColliderSet;
use crate::dynamics::joints::JointSet;
use crate::dynamics::rigid_body::{RigidBody, RigidBodyHandle};

/// A set owning all the rigid bodies of a simulation.
///
/// Bodies are addressed through [`RigidBodyHandle`]s; a stale handle returns
/// `None` from every accessor. Removing a body cascades: its attached
/// colliders and incident joints are removed as well.
#[derive(Clone, Debug, Default)]
pub struct RigidBodySet {
    bodies: Arena<RigidBody>,
}

impl RigidBodySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of bodies in the set.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns `true` if the set contains no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Inserts a body and returns its handle.
    pub fn insert(&mut self, body: RigidBody) -> RigidBodyHandle {
        RigidBodyHandle(self.bodies.insert(body))
    }

    /// Returns the body behind `handle`, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.0)
    }

    /// Returns the body behind `handle` mutably, or `None` if the handle
    /// is stale.
    #[inline]
    pub fn get_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.0)
    }

    /// Returns two distinct bodies mutably, or `None` if either handle is
    /// stale or the handles alias.
    pub fn get2_mut(
        &mut self,
        a: RigidBodyHandle,
        b: RigidBodyHandle,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        self.bodies.get2_mut(a.0, b.0)
    }

    /// Returns `true` if `handle` refers to a live body.
    #[inline]
    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Removes the body behind `handle`, cascading the removal to its
    /// attached colliders and incident joints.
    ///
    /// Returns the removed body, or `None` if the handle was stale. The
    /// broad and narrow phases notice the removed colliders during the next
    /// step and retire their pairs, emitting stopped/exited events for pairs
    /// that were active.
    pub fn remove(
        &mut self,
        handle: RigidBodyHandle,
        colliders: &mut ColliderSet,
        joints: &mut JointSet,
    ) -> Option<RigidBody> {
        let body = self.bodies.remove(handle.0)?;
        for &collider_handle in &body.colliders {
            colliders.detach_and_remove(collider_handle);
        }
        joints.remove_joints_attached_to_body(handle, self);
        Some(body)
    }

    /// Wakes the body behind `handle` up, if it is live.
    pub fn wake_up(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.get_mut(handle) {
            body.wake_up();
        }
    }

    /// Iterates over all bodies with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (RigidBodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .map(|(handle, body)| (RigidBodyHandle(handle), body))
    }

    /// Iterates over all bodies mutably, with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (RigidBodyHandle, &mut RigidBody)> {
        self.bodies
            .iter_mut()
            .map(|(handle, body)| (RigidBodyHandle(handle), body))
    }

    /// Attaches an already-inserted collider to a body, updating the body's
    /// mass properties.
    pub(crate) fn attach_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        collider_handle: crate::collision::ColliderHandle,
        colliders: &ColliderSet,
    ) {
        if let Some(body) = self.get_mut(body_handle) {
            body.colliders.push(collider_handle);
            body.wake_up();
            body.recompute_mass_properties(colliders);
        }
    }

    /// Detaches a collider from its parent body, updating the body's mass
    /// properties.
    pub(crate) fn detach_collider(
        &mut self,
        body_handle: RigidBodyHandle,
        collider_handle: crate::collision::ColliderHandle,
        colliders: &ColliderSet,
    ) {
        if let Some(body) = self.get_mut(body_handle) {
            body.colliders.retain(|&handle| handle != collider_handle);
            body.wake_up();
            body.recompute_mass_properties(colliders);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::RigidBodyBuilder;

    #[test]
    fn stale_handles_return_none() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut joints = JointSet::new();

        let handle = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        assert!(bodies.get(handle).is_some());

        bodies.remove(handle, &mut colliders, &mut joints);
        assert!(bodies.get(handle).is_none());
        assert!(bodies.get_mut(handle).is_none());

        // Slot reuse keeps the stale handle invalid.
        let reused = bodies.insert(RigidBodyBuilder::fixed().build().unwrap());
        assert_eq!(reused.index(), handle.index());
        assert_ne!(reused, handle);
        assert!(bodies.get(handle).is_none());
    }
}
