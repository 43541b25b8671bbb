//! Colliders: shapes attached to rigid bodies that generate contacts.

use parry3d::mass_properties::MassProperties;
use parry3d::shape::SharedShape;
use thiserror::Error;

use crate::arena::Handle;
use crate::collision::hooks::ActiveHooks;
use crate::collision::layers::CollisionLayers;
use crate::dynamics::RigidBodyHandle;
use crate::math::{Isometry, Scalar, Vector};

/// A stable handle to a [`Collider`] in a [`ColliderSet`](super::ColliderSet).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ColliderHandle(pub Handle);

impl ColliderHandle {
    /// An always-invalid collider handle.
    pub const INVALID: Self = Self(Handle::INVALID);

    /// The arena slot index of this handle.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0.index()
    }
}

/// A geometric shape attached to a rigid body, generating contacts or
/// intersection events against other colliders.
///
/// A collider carries a shared shape, a pose relative to its parent body,
/// surface material coefficients, and filtering state. A collider with the
/// sensor flag set never produces contact constraints, only intersection
/// events. Colliders with positive density contribute mass and angular
/// inertia to their parent body.
#[derive(Clone)]
pub struct Collider {
    shape: SharedShape,
    /// Pose of the collider relative to its parent body.
    position_wrt_parent: Isometry,
    /// World-space pose, refreshed from the parent body each step.
    pub(crate) position: Isometry,
    pub(crate) parent: RigidBodyHandle,
    density: Scalar,
    /// Coefficient of dynamic friction.
    pub friction: Scalar,
    /// Coefficient of restitution (bounciness).
    pub restitution: Scalar,
    sensor: bool,
    /// The collision layers used for pair filtering.
    pub collision_layers: CollisionLayers,
    /// Which [`PhysicsHooks`](crate::collision::PhysicsHooks) apply to
    /// pairs involving this collider.
    pub active_hooks: ActiveHooks,
    pub(crate) events_enabled: bool,
}

impl Collider {
    /// The collider's shape.
    #[inline]
    pub fn shape(&self) -> &SharedShape {
        &self.shape
    }

    /// The collider's current world-space pose.
    #[inline]
    pub fn position(&self) -> &Isometry {
        &self.position
    }

    /// The collider's pose relative to its parent body.
    #[inline]
    pub fn position_wrt_parent(&self) -> &Isometry {
        &self.position_wrt_parent
    }

    /// The handle of the body this collider is attached to.
    #[inline]
    pub fn parent(&self) -> RigidBodyHandle {
        self.parent
    }

    /// The collider's mass density.
    #[inline]
    pub fn density(&self) -> Scalar {
        self.density
    }

    /// Returns `true` if this collider is a sensor.
    #[inline]
    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    /// The mass properties this collider contributes to its parent body,
    /// expressed in the parent's local frame.
    pub fn mass_properties(&self) -> MassProperties {
        self.shape
            .mass_properties(self.density)
            .transform_by(&self.position_wrt_parent)
    }

    /// The length of the collider's smallest local-space extent.
    ///
    /// Used as the size reference for the CCD motion threshold.
    pub fn smallest_extent(&self) -> Scalar {
        let aabb = self.shape.compute_local_aabb();
        let extents = aabb.extents();
        extents.x.min(extents.y).min(extents.z)
    }
}

/// An invalid collider configuration, rejected at build time.
#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum ColliderBuildError {
    /// The shape has a non-finite or zero-sized bounding box.
    #[error("the collider shape is degenerate")]
    DegenerateShape,
    /// Density must be positive so the collider contributes finite,
    /// non-negative mass.
    #[error("collider density must be positive, got {0}")]
    NonPositiveDensity(Scalar),
    /// Friction and restitution must be non-negative.
    #[error("friction and restitution coefficients must be non-negative")]
    NegativeMaterialCoefficient,
    /// The pose relative to the parent must be finite.
    #[error("the collider pose is not finite")]
    NonFinitePose,
}

/// A builder for [`Collider`]s.
///
/// All fields have documented defaults; validation happens once, in
/// [`build`](Self::build).
#[derive(Clone)]
pub struct ColliderBuilder {
    shape: SharedShape,
    position_wrt_parent: Isometry,
    /// Default: `1.0`
    density: Scalar,
    /// Default: `0.5`
    friction: Scalar,
    /// Default: `0.0`
    restitution: Scalar,
    /// Default: `false`
    sensor: bool,
    collision_layers: CollisionLayers,
    active_hooks: ActiveHooks,
    /// Default: `true`
    events_enabled: bool,
}

impl ColliderBuilder {
    /// Starts building a collider with the given shape.
    pub fn new(shape: SharedShape) -> Self {
        Self {
            shape,
            position_wrt_parent: Isometry::identity(),
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            sensor: false,
            collision_layers: CollisionLayers::default(),
            active_hooks: ActiveHooks::empty(),
            events_enabled: true,
        }
    }

    /// Starts building a ball collider with the given radius.
    pub fn ball(radius: Scalar) -> Self {
        Self::new(SharedShape::ball(radius))
    }

    /// Starts building a cuboid collider with the given half-extents.
    pub fn cuboid(hx: Scalar, hy: Scalar, hz: Scalar) -> Self {
        Self::new(SharedShape::cuboid(hx, hy, hz))
    }

    /// Starts building a capsule collider aligned with the local `y` axis.
    pub fn capsule_y(half_height: Scalar, radius: Scalar) -> Self {
        use crate::math::Point;
        Self::new(SharedShape::capsule(
            Point::new(0.0, -half_height, 0.0),
            Point::new(0.0, half_height, 0.0),
            radius,
        ))
    }

    /// Sets the collider pose relative to the parent body.
    pub fn position_wrt_parent(mut self, position: Isometry) -> Self {
        self.position_wrt_parent = position;
        self
    }

    /// Sets the translation relative to the parent body.
    pub fn translation(mut self, translation: Vector) -> Self {
        self.position_wrt_parent.translation.vector = translation;
        self
    }

    /// Sets the mass density.
    pub fn density(mut self, density: Scalar) -> Self {
        self.density = density;
        self
    }

    /// Sets the friction coefficient.
    pub fn friction(mut self, friction: Scalar) -> Self {
        self.friction = friction;
        self
    }

    /// Sets the restitution coefficient.
    pub fn restitution(mut self, restitution: Scalar) -> Self {
        self.restitution = restitution;
        self
    }

    /// Marks the collider as a sensor.
    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Sets the collision layers.
    pub fn collision_layers(mut self, layers: CollisionLayers) -> Self {
        self.collision_layers = layers;
        self
    }

    /// Sets which physics hooks apply to pairs involving this collider.
    pub fn active_hooks(mut self, hooks: ActiveHooks) -> Self {
        self.active_hooks = hooks;
        self
    }

    /// Enables or disables contact and intersection events for this collider.
    pub fn events_enabled(mut self, enabled: bool) -> Self {
        self.events_enabled = enabled;
        self
    }

    /// Validates the configuration and builds the collider.
    pub fn build(self) -> Result<Collider, ColliderBuildError> {
        let aabb = self.shape.compute_local_aabb();
        let extents = aabb.extents();
        if !extents.x.is_finite() || !extents.y.is_finite() || !extents.z.is_finite() {
            return Err(ColliderBuildError::DegenerateShape);
        }
        if extents.x.max(extents.y).max(extents.z) <= 0.0 {
            return Err(ColliderBuildError::DegenerateShape);
        }
        if !(self.density > 0.0 && self.density.is_finite()) {
            return Err(ColliderBuildError::NonPositiveDensity(self.density));
        }
        if self.friction < 0.0 || self.restitution < 0.0 {
            return Err(ColliderBuildError::NegativeMaterialCoefficient);
        }
        let translation = self.position_wrt_parent.translation.vector;
        if !translation.x.is_finite() || !translation.y.is_finite() || !translation.z.is_finite() {
            return Err(ColliderBuildError::NonFinitePose);
        }

        Ok(Collider {
            shape: self.shape,
            position_wrt_parent: self.position_wrt_parent,
            position: self.position_wrt_parent,
            parent: RigidBodyHandle::INVALID,
            density: self.density,
            friction: self.friction,
            restitution: self.restitution,
            sensor: self.sensor,
            collision_layers: self.collision_layers,
            active_hooks: self.active_hooks,
            events_enabled: self.events_enabled,
        })
    }
}

/// The effective friction coefficient of a contact surface between two colliders.
#[inline]
pub(crate) fn combine_friction(collider1: &Collider, collider2: &Collider) -> Scalar {
    collider1.friction * collider2.friction
}

/// The effective restitution coefficient of a contact surface between two colliders.
#[inline]
pub(crate) fn combine_restitution(collider1: &Collider, collider2: &Collider) -> Scalar {
    collider1.restitution.max(collider2.restitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validation() {
        assert!(ColliderBuilder::ball(0.5).build().is_ok());
        assert!(matches!(
            ColliderBuilder::ball(0.5).density(0.0).build(),
            Err(ColliderBuildError::NonPositiveDensity(_))
        ));
        assert!(matches!(
            ColliderBuilder::ball(0.5).density(-2.0).build(),
            Err(ColliderBuildError::NonPositiveDensity(_))
        ));
        assert!(matches!(
            ColliderBuilder::ball(0.0).build(),
            Err(ColliderBuildError::DegenerateShape)
        ));
        assert!(matches!(
            ColliderBuilder::cuboid(1.0, 0.0, 1.0).friction(-1.0).build(),
            Err(ColliderBuildError::NegativeMaterialCoefficient)
        ));
        assert!(matches!(
            ColliderBuilder::ball(0.5)
                .translation(Vector::new(Scalar::NAN, 0.0, 0.0))
                .build(),
            Err(ColliderBuildError::NonFinitePose)
        ));
    }

    #[test]
    fn mass_contribution_scales_with_density() {
        let light = ColliderBuilder::ball(1.0).density(1.0).build().unwrap();
        let heavy = ColliderBuilder::ball(1.0).density(2.0).build().unwrap();
        let mass = |collider: &Collider| 1.0 / collider.mass_properties().inv_mass;
        assert!((mass(&heavy) - 2.0 * mass(&light)).abs() < 1.0e-4);
    }
}
