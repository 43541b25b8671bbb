//! The arena of colliders.

use crate::arena::Arena;
use crate::collision::collider::{Collider, ColliderHandle};
use crate::dynamics::{RigidBodyHandle, RigidBodySet};

/// A set owning all the colliders of a simulation.
///
/// Every collider is attached to a parent body at insertion time and stays
/// attached for its whole lifetime. Removing a collider updates the parent's
/// mass properties; the broad and narrow phases retire the collider's pairs
/// during the next step.
#[derive(Clone, Default)]
pub struct ColliderSet {
    colliders: Arena<Collider>,
}

impl ColliderSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of colliders in the set.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Returns `true` if the set contains no colliders.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Inserts a collider and attaches it to the given parent body,
    /// returning the collider's handle.
    ///
    /// The parent's mass properties are updated with the collider's
    /// contribution, and the collider's world pose is initialized from the
    /// parent's pose. Returns `None` without inserting if `parent` is stale.
    pub fn insert_with_parent(
        &mut self,
        mut collider: Collider,
        parent: RigidBodyHandle,
        bodies: &mut RigidBodySet,
    ) -> Option<ColliderHandle> {
        let body = bodies.get(parent)?;
        collider.parent = parent;
        collider.position = body.position() * collider.position_wrt_parent();

        let handle = ColliderHandle(self.colliders.insert(collider));
        bodies.attach_collider(parent, handle, self);
        Some(handle)
    }

    /// Returns the collider behind `handle`, or `None` if the handle is stale.
    #[inline]
    pub fn get(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.0)
    }

    /// Returns the collider behind `handle` mutably, or `None` if the
    /// handle is stale.
    #[inline]
    pub fn get_mut(&mut self, handle: ColliderHandle) -> Option<&mut Collider> {
        self.colliders.get_mut(handle.0)
    }

    /// Returns `true` if `handle` refers to a live collider.
    #[inline]
    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains(handle.0)
    }

    /// Returns the parent body of the collider behind `handle`.
    pub fn parent(&self, handle: ColliderHandle) -> Option<RigidBodyHandle> {
        self.get(handle).map(Collider::parent)
    }

    /// Removes the collider behind `handle`, detaching it from its parent
    /// body and updating the parent's mass properties.
    ///
    /// Returns the removed collider, or `None` if the handle was stale.
    pub fn remove(
        &mut self,
        handle: ColliderHandle,
        bodies: &mut RigidBodySet,
    ) -> Option<Collider> {
        let collider = self.colliders.remove(handle.0)?;
        bodies.detach_collider(collider.parent(), handle, self);
        Some(collider)
    }

    /// Removes a collider whose parent body is itself being removed, without
    /// touching the parent.
    pub(crate) fn detach_and_remove(&mut self, handle: ColliderHandle) {
        self.colliders.remove(handle.0);
    }

    /// Iterates over all colliders with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders
            .iter()
            .map(|(handle, collider)| (ColliderHandle(handle), collider))
    }

    /// Iterates over all colliders mutably, with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ColliderHandle, &mut Collider)> {
        self.colliders
            .iter_mut()
            .map(|(handle, collider)| (ColliderHandle(handle), collider))
    }

    /// Refreshes the world-space pose of every collider from its parent
    /// body's pose. Called by the pipeline before collision detection.
    pub(crate) fn refresh_positions(&mut self, bodies: &RigidBodySet) {
        for (_, collider) in self.colliders.iter_mut() {
            if let Some(body) = bodies.get(collider.parent) {
                collider.position = body.position() * collider.position_wrt_parent();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ColliderBuilder;
    use crate::dynamics::RigidBodyBuilder;
    use crate::math::Vector;

    #[test]
    fn attachment_updates_parent_mass() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let body_handle = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        assert_eq!(bodies.get(body_handle).unwrap().mass(), 0.0);

        let collider = ColliderBuilder::ball(1.0).density(1.0).build().unwrap();
        let expected_mass = 1.0 / collider.mass_properties().inv_mass;
        let collider_handle = colliders
            .insert_with_parent(collider, body_handle, &mut bodies)
            .unwrap();

        let body = bodies.get(body_handle).unwrap();
        assert!((body.mass() - expected_mass).abs() < 1.0e-4);
        assert_eq!(body.colliders(), &[collider_handle]);
        assert_eq!(colliders.parent(collider_handle), Some(body_handle));

        colliders.remove(collider_handle, &mut bodies);
        let body = bodies.get(body_handle).unwrap();
        assert_eq!(body.mass(), 0.0);
        assert!(body.colliders().is_empty());
    }

    #[test]
    fn insert_with_stale_parent_fails() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut joints = crate::dynamics::JointSet::new();

        let body_handle = bodies.insert(RigidBodyBuilder::dynamic().build().unwrap());
        bodies.remove(body_handle, &mut colliders, &mut joints);

        let collider = ColliderBuilder::ball(1.0).build().unwrap();
        assert!(
            colliders
                .insert_with_parent(collider, body_handle, &mut bodies)
                .is_none()
        );
        assert!(colliders.is_empty());
    }

    #[test]
    fn world_pose_follows_parent() {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let body_handle = bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(Vector::new(1.0, 2.0, 3.0))
                .build()
                .unwrap(),
        );
        let collider_handle = colliders
            .insert_with_parent(
                ColliderBuilder::ball(0.5)
                    .translation(Vector::new(0.0, 1.0, 0.0))
                    .build()
                    .unwrap(),
                body_handle,
                &mut bodies,
            )
            .unwrap();

        let position = *colliders.get(collider_handle).unwrap().position();
        assert_eq!(position.translation.vector, Vector::new(1.0, 3.0, 3.0));
    }
}
