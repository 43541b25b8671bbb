//! Rigid-body dynamics: bodies, joints, islands, the constraint solver,
//! integration, and continuous collision detection.

pub mod ccd;
pub mod integrator;
pub mod island;
pub mod joints;
pub mod solver;

mod rigid_body;
mod rigid_body_set;

pub use ccd::CcdSolver;
pub use island::{Island, IslandManager};
pub use joints::{
    DistanceJoint, FixedJoint, Joint, JointError, JointHandle, JointKind, JointSet,
    PrismaticJoint, RevoluteJoint, SphericalJoint,
};
pub use rigid_body::{
    RigidBody, RigidBodyBuildError, RigidBodyBuilder, RigidBodyHandle, RigidBodyType,
};
pub use rigid_body_set::RigidBodySet;
pub use solver::IslandSolver;
