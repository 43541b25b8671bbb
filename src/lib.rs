//! # impulse3d
//!
//! **impulse3d** is a 3D rigid-body physics engine core for games, robotics,
//! and animation: given a population of rigid bodies, collision shapes, and
//! joint constraints, it advances their positions, velocities, and contact
//! state by discrete fixed time steps.
//!
//! ## Design
//!
//! All simulation state lives in three caller-owned, handle-indexed sets:
//!
//! - [`RigidBodySet`](dynamics::RigidBodySet) for bodies,
//! - [`ColliderSet`](collision::ColliderSet) for the shapes attached to them,
//! - [`JointSet`](dynamics::JointSet) for constraints between body pairs.
//!
//! Each set is a generational [`Arena`](arena::Arena): a handle pairs a slot
//! index with a generation, so handles to removed entities keep returning
//! "not found" even after their slots are reused, and no lookup ever
//! observes another entity's data through a stale handle.
//!
//! One call to [`PhysicsPipeline::step`](pipeline::PhysicsPipeline::step)
//! advances the simulation by exactly one timestep, running in order:
//!
//! 1. the sweep-and-prune [`BroadPhase`](collision::BroadPhase), which
//!    produces candidate collider pairs from inflated AABB overlaps;
//! 2. the [`NarrowPhase`](collision::NarrowPhase), which computes exact
//!    contact manifolds and intersection states over persistent interaction
//!    graphs and emits started/stopped transition events;
//! 3. island discovery ([`IslandManager`](dynamics::IslandManager)) over
//!    bodies coupled by contacts and joints, with island-wide sleeping;
//! 4. the sequential-impulse [`IslandSolver`](dynamics::IslandSolver) for
//!    contact and joint constraints, followed by pose integration;
//! 5. swept continuous collision detection
//!    ([`CcdSolver`](dynamics::CcdSolver)) for fast bodies that opted in.
//!
//! Collision shapes and geometric queries come from
//! [`parry3d`](https://parry.rs), and isometries and vectors from
//! [`nalgebra`](https://nalgebra.org).
//!
//! ## Example
//!
//! ```
//! use impulse3d::prelude::*;
//!
//! // The entity sets own all simulation state.
//! let mut bodies = RigidBodySet::new();
//! let mut colliders = ColliderSet::new();
//! let mut joints = JointSet::new();
//!
//! // A static floor.
//! let floor = bodies.insert(RigidBodyBuilder::fixed().build()?);
//! colliders
//!     .insert_with_parent(
//!         ColliderBuilder::cuboid(10.0, 0.5, 10.0).build()?,
//!         floor,
//!         &mut bodies,
//!     )
//!     .unwrap();
//!
//! // A ball dropped from above.
//! let ball = bodies.insert(
//!     RigidBodyBuilder::dynamic()
//!         .translation(Vector::new(0.0, 3.0, 0.0))
//!         .build()?,
//! );
//! colliders
//!     .insert_with_parent(ColliderBuilder::ball(0.5).build()?, ball, &mut bodies)
//!     .unwrap();
//!
//! // The stepping machinery holds only workspace buffers.
//! let gravity = Vector::new(0.0, -9.81, 0.0);
//! let params = IntegrationParameters::default();
//! let mut pipeline = PhysicsPipeline::new();
//! let mut islands = IslandManager::new();
//! let mut broad_phase = BroadPhase::new();
//! let mut narrow_phase = NarrowPhase::new();
//! let mut ccd_solver = CcdSolver::new();
//!
//! for _ in 0..200 {
//!     pipeline.step(
//!         &gravity,
//!         &params,
//!         &mut islands,
//!         &mut broad_phase,
//!         &mut narrow_phase,
//!         &mut bodies,
//!         &mut colliders,
//!         &mut joints,
//!         &mut ccd_solver,
//!         &(),
//!         &(),
//!     );
//! }
//!
//! // The ball came to rest on the floor.
//! let ball = bodies.get(ball).unwrap();
//! assert!(ball.translation().y > 0.8 && ball.translation().y < 1.1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Events and hooks
//!
//! Contact and intersection transitions are delivered through the
//! [`EventHandler`](collision::EventHandler) sink passed to `step`: either a
//! user implementation invoked inline, or a buffered
//! [`CollisionEventQueue`](collision::CollisionEventQueue) drained between
//! steps. Pair filtering and contact modification are available through the
//! [`PhysicsHooks`](collision::PhysicsHooks) trait for colliders that opt in
//! with [`ActiveHooks`](collision::ActiveHooks) flags; `()` disables both.
//!
//! ## Feature flags
//!
//! - `parallel` — runs independent broad-phase proxy refreshes on a rayon
//!   thread pool. Requesting it together with strict determinism is rejected
//!   by [`SimulationConfig::new`](parameters::SimulationConfig::new).
//! - `serialize` — serde derives for handles, parameters, events, and other
//!   plain data.

pub mod arena;
pub mod collision;
pub mod data_structures;
pub mod dynamics;
pub mod math;
pub mod parameters;
pub mod pipeline;

/// Re-exports of the types needed by most simulations.
pub mod prelude {
    pub use crate::arena::Handle;
    pub use crate::collision::{
        ActiveHooks, BroadPhase, Collider, ColliderBuilder, ColliderHandle, ColliderSet,
        CollisionEventQueue, CollisionLayers, ContactEvent, EventHandler, IntersectionEvent,
        LayerMask, NarrowPhase, PairFilterContext, PhysicsHooks, QueuePolicy,
    };
    pub use crate::dynamics::{
        CcdSolver, DistanceJoint, FixedJoint, IslandManager, Joint, JointHandle, JointSet,
        PrismaticJoint, RevoluteJoint, RigidBody, RigidBodyBuilder, RigidBodyHandle,
        RigidBodySet, RigidBodyType, SphericalJoint,
    };
    pub use crate::math::{Isometry, Point, Rotation, Scalar, UnitVector, Vector};
    pub use crate::parameters::{IntegrationParameters, SimulationConfig};
    pub use crate::pipeline::PhysicsPipeline;
}
