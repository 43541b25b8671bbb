//! Physics hooks for filtering and modifying contacts.
//!
//! See the [`PhysicsHooks`] trait for more information.

use crate::collision::collider::{Collider, ColliderHandle};
use crate::collision::contact_types::ContactPair;

bitflags::bitflags! {
    /// Flags selecting which [`PhysicsHooks`] are called for pairs
    /// involving a collider.
    ///
    /// Hooks are *only* called for pairs where at least one collider has the
    /// corresponding flag set. By default, no hooks are called.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
    pub struct ActiveHooks: u8 {
        /// Set if [`PhysicsHooks::filter_pairs`] should be called
        /// for pairs involving this collider.
        const FILTER_PAIRS = 1 << 0;
        /// Set if [`PhysicsHooks::modify_contacts`] should be called
        /// for pairs involving this collider.
        const MODIFY_CONTACTS = 1 << 1;
    }
}

/// The context passed to [`PhysicsHooks::filter_pairs`].
#[derive(Clone, Copy)]
pub struct PairFilterContext<'a> {
    /// The first collider of the candidate pair.
    pub collider1: ColliderHandle,
    /// The second collider of the candidate pair.
    pub collider2: ColliderHandle,
    /// The first collider's data.
    pub collider_data1: &'a Collider,
    /// The second collider's data.
    pub collider_data2: &'a Collider,
}

/// User-defined hooks that can filter and modify contacts.
///
/// This can be useful for advanced contact scenarios, such as:
///
/// - One-way platforms
/// - Conveyor belts
/// - Non-uniform friction and restitution
///
/// Hooks are more flexible than [`CollisionLayers`](super::CollisionLayers),
/// but have more overhead, so they are opt-in: a hook is only invoked for a
/// pair when at least one of the two colliders carries the corresponding
/// [`ActiveHooks`] flag.
///
/// The no-hook default is the unit type `()`: allow every pair, modify
/// nothing.
pub trait PhysicsHooks {
    /// Decides whether the given candidate pair should proceed to contact
    /// computation. Returning `false` suppresses the pair entirely: no
    /// manifolds are computed and no events are emitted for it.
    ///
    /// Called during the narrow phase, before manifold computation, for
    /// pairs with the [`ActiveHooks::FILTER_PAIRS`] flag.
    fn filter_pairs(&self, _context: &PairFilterContext) -> bool {
        true
    }

    /// Modifies the freshly computed contacts of a pair before they are
    /// handed to the constraint solver.
    ///
    /// The hook may adjust friction and restitution per manifold, or remove
    /// contact points. Called for pairs with the
    /// [`ActiveHooks::MODIFY_CONTACTS`] flag.
    fn modify_contacts(&self, _pair: &mut ContactPair) {}
}

impl PhysicsHooks for () {}
