//! Collision detection: colliders, broad phase, narrow phase, interaction
//! graphs, hooks, and events.

mod broad_phase;
mod collider;
mod collider_set;
mod contact_graph;
mod contact_types;
mod events;
mod hooks;
mod layers;
mod narrow_phase;

pub use broad_phase::{BroadPhase, BroadPhasePairs};
pub use collider::{Collider, ColliderBuildError, ColliderBuilder, ColliderHandle};
pub use collider_set::ColliderSet;
pub use contact_graph::{ContactGraph, IntersectionGraph, PairGraph};
pub use contact_types::{
    ContactManifold, ContactPair, ContactPairFlags, ContactPoint, IntersectionPair,
};
pub use events::{
    CollisionEventQueue, ContactEvent, EventHandler, IntersectionEvent, QueuePolicy,
};
pub use hooks::{ActiveHooks, PairFilterContext, PhysicsHooks};
pub use layers::{CollisionLayers, LayerMask};

pub use narrow_phase::NarrowPhase;
