//! Rigid bodies and their construction.

use nalgebra::Matrix3;
use num_traits::Zero;
use parry3d::mass_properties::MassProperties;
use thiserror::Error;

use crate::arena::Handle;
use crate::collision::ColliderHandle;
use crate::math::{Isometry, Point, Rotation, Scalar, Vector, world_inv_inertia};

/// A stable handle to a [`RigidBody`] in a
/// [`RigidBodySet`](super::RigidBodySet).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyHandle(pub Handle);

impl RigidBodyHandle {
    /// An always-invalid body handle.
    pub const INVALID: Self = Self(Handle::INVALID);

    /// The arena slot index of this handle.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0.index()
    }
}

/// How a rigid body is simulated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RigidBodyType {
    /// The body is affected by gravity, contact forces, and joints.
    #[default]
    Dynamic,
    /// The body never moves and has infinite effective mass. Static bodies
    /// collide with dynamic bodies only.
    Static,
    /// The body's pose is driven externally. The solver infers an implied
    /// velocity from pose deltas so dynamic bodies in contact react
    /// realistically, but never moves a kinematic body itself.
    Kinematic,
}

/// A rigid body: position, orientation, velocity, and mass properties.
///
/// Bodies are created with [`RigidBodyBuilder`] and inserted into a
/// [`RigidBodySet`](super::RigidBodySet), which returns the [`RigidBodyHandle`]
/// used for all later access. Colliders are attached through
/// [`ColliderSet::insert_with_parent`](crate::collision::ColliderSet::insert_with_parent)
/// and contribute mass and angular inertia according to their density,
/// unless an explicit additional mass was set on the builder.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) position: Isometry,
    pub(crate) linvel: Vector,
    pub(crate) angvel: Vector,
    /// Combined local-frame mass properties from attached colliders and the
    /// additional mass, if any.
    pub(crate) mprops: MassProperties,
    additional_mass: Option<Scalar>,
    body_type: RigidBodyType,
    gravity_scale: Scalar,
    pub(crate) force: Vector,
    pub(crate) torque: Vector,
    ccd_enabled: bool,
    can_sleep: bool,
    pub(crate) sleeping: bool,
    /// Seconds this body has spent below the sleep velocity thresholds.
    pub(crate) time_sleeping: Scalar,
    pub(crate) next_kinematic_position: Option<Isometry>,
    /// The colliders attached to this body.
    pub(crate) colliders: Vec<ColliderHandle>,
}

impl RigidBody {
    /// The body's world-space pose.
    #[inline]
    pub fn position(&self) -> &Isometry {
        &self.position
    }

    /// The body's world-space translation.
    #[inline]
    pub fn translation(&self) -> Vector {
        self.position.translation.vector
    }

    /// The body's world-space rotation.
    #[inline]
    pub fn rotation(&self) -> &Rotation {
        &self.position.rotation
    }

    /// Sets the body's pose and wakes it up.
    ///
    /// For kinematic bodies, prefer
    /// [`set_next_kinematic_position`](Self::set_next_kinematic_position) so
    /// that a velocity is inferred and contacts behave correctly.
    pub fn set_position(&mut self, position: Isometry) {
        self.position = position;
        self.wake_up();
    }

    /// The body's linear velocity.
    #[inline]
    pub fn linvel(&self) -> Vector {
        self.linvel
    }

    /// The body's angular velocity.
    #[inline]
    pub fn angvel(&self) -> Vector {
        self.angvel
    }

    /// Sets the linear velocity and wakes the body up.
    pub fn set_linvel(&mut self, linvel: Vector) {
        self.linvel = linvel;
        self.wake_up();
    }

    /// Sets the angular velocity and wakes the body up.
    pub fn set_angvel(&mut self, angvel: Vector) {
        self.angvel = angvel;
        self.wake_up();
    }

    /// How this body is simulated.
    #[inline]
    pub fn body_type(&self) -> RigidBodyType {
        self.body_type
    }

    /// Returns `true` if the body is dynamic.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }

    /// Returns `true` if the body is static.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == RigidBodyType::Static
    }

    /// Returns `true` if the body is kinematic.
    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.body_type == RigidBodyType::Kinematic
    }

    /// Returns `true` if the body is currently asleep.
    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Wakes the body up and resets its sleep timer.
    pub fn wake_up(&mut self) {
        self.sleeping = false;
        self.time_sleeping = 0.0;
    }

    /// Puts the body to sleep, zeroing its velocities.
    pub(crate) fn sleep(&mut self) {
        self.sleeping = true;
        self.linvel = Vector::zeros();
        self.angvel = Vector::zeros();
    }

    /// Whether this body is allowed to sleep.
    #[inline]
    pub fn can_sleep(&self) -> bool {
        self.can_sleep && self.body_type == RigidBodyType::Dynamic
    }

    /// Whether continuous collision detection is enabled for this body.
    #[inline]
    pub fn ccd_enabled(&self) -> bool {
        self.ccd_enabled
    }

    /// Enables or disables continuous collision detection for this body.
    pub fn enable_ccd(&mut self, enabled: bool) {
        self.ccd_enabled = enabled;
    }

    /// The gravity multiplier applied to this body. Defaults to `1.0`.
    #[inline]
    pub fn gravity_scale(&self) -> Scalar {
        self.gravity_scale
    }

    /// Sets the gravity multiplier and wakes the body up.
    pub fn set_gravity_scale(&mut self, scale: Scalar) {
        self.gravity_scale = scale;
        self.wake_up();
    }

    /// The body's mass. Zero mass makes the body immune to forces.
    #[inline]
    pub fn mass(&self) -> Scalar {
        if self.mprops.inv_mass > 0.0 {
            1.0 / self.mprops.inv_mass
        } else {
            0.0
        }
    }

    /// The body's inverse mass, taking the body type into account:
    /// non-dynamic bodies have infinite effective mass.
    #[inline]
    pub fn effective_inv_mass(&self) -> Scalar {
        match self.body_type {
            RigidBodyType::Dynamic => self.mprops.inv_mass,
            _ => 0.0,
        }
    }

    /// The world-space inverse angular inertia tensor, taking the body type
    /// into account: non-dynamic bodies have infinite effective inertia.
    pub fn effective_world_inv_inertia(&self) -> Matrix3<Scalar> {
        match self.body_type {
            RigidBodyType::Dynamic => world_inv_inertia(&self.mprops, &self.position.rotation),
            _ => Matrix3::zeros(),
        }
    }

    /// The body's center of mass in world space.
    #[inline]
    pub fn center_of_mass(&self) -> Point {
        self.position * self.mprops.local_com
    }

    /// The velocity of the world-space point `at` as if rigidly attached
    /// to this body.
    pub fn velocity_at_point(&self, at: &Point) -> Vector {
        self.linvel + self.angvel.cross(&(at - self.center_of_mass()))
    }

    /// Adds a force applied at the center of mass, persisting until the end
    /// of the next step. Wakes the body up.
    pub fn add_force(&mut self, force: Vector) {
        if self.is_dynamic() {
            self.force += force;
            self.wake_up();
        }
    }

    /// Adds a torque, persisting until the end of the next step.
    /// Wakes the body up.
    pub fn add_torque(&mut self, torque: Vector) {
        if self.is_dynamic() {
            self.torque += torque;
            self.wake_up();
        }
    }

    /// Applies an impulse at the center of mass, changing the linear
    /// velocity immediately. Wakes the body up.
    pub fn apply_impulse(&mut self, impulse: Vector) {
        if self.is_dynamic() {
            self.linvel += impulse * self.mprops.inv_mass;
            self.wake_up();
        }
    }

    /// Applies an impulse at the given world-space point, changing both the
    /// linear and angular velocity immediately. Wakes the body up.
    pub fn apply_impulse_at_point(&mut self, impulse: Vector, at: Point) {
        if self.is_dynamic() {
            let torque_impulse = (at - self.center_of_mass()).cross(&impulse);
            self.linvel += impulse * self.mprops.inv_mass;
            self.angvel += self.effective_world_inv_inertia() * torque_impulse;
            self.wake_up();
        }
    }

    /// Sets the pose a kinematic body should reach by the end of the next
    /// step. The implied velocity `delta / dt` is what dynamic bodies in
    /// contact will react to.
    ///
    /// Does nothing for non-kinematic bodies.
    pub fn set_next_kinematic_position(&mut self, position: Isometry) {
        if self.is_kinematic() {
            self.next_kinematic_position = Some(position);
        }
    }

    /// The handles of the colliders attached to this body.
    #[inline]
    pub fn colliders(&self) -> &[ColliderHandle] {
        &self.colliders
    }

    /// Recomputes the body's mass properties from its attached colliders,
    /// or from the explicit additional mass when one was set.
    pub(crate) fn recompute_mass_properties(
        &mut self,
        colliders: &crate::collision::ColliderSet,
    ) {
        let mut mprops = MassProperties::zero();
        for &handle in &self.colliders {
            if let Some(collider) = colliders.get(handle) {
                mprops += collider.mass_properties();
            }
        }
        if let Some(mass) = self.additional_mass {
            mprops += MassProperties::new(Point::origin(), mass, Vector::zeros());
        }
        self.mprops = mprops;
    }

    /// Clears the force and torque accumulators. Called at the end of each step.
    pub(crate) fn reset_forces(&mut self) {
        self.force = Vector::zeros();
        self.torque = Vector::zeros();
    }
}

/// An invalid rigid-body configuration, rejected at build time.
#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum RigidBodyBuildError {
    /// Poses and velocities must be finite.
    #[error("the body pose or velocity is not finite")]
    NonFinite,
    /// An explicit mass must be positive.
    #[error("additional mass must be positive, got {0}")]
    NonPositiveMass(Scalar),
}

/// A builder for [`RigidBody`]s.
///
/// All fields have documented defaults; validation happens once, in
/// [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct RigidBodyBuilder {
    body_type: RigidBodyType,
    position: Isometry,
    linvel: Vector,
    angvel: Vector,
    /// Default: `None` (mass derived from attached colliders)
    additional_mass: Option<Scalar>,
    /// Default: `1.0`
    gravity_scale: Scalar,
    /// Default: `true`
    can_sleep: bool,
    /// Default: `false`
    ccd_enabled: bool,
}

impl RigidBodyBuilder {
    /// Starts building a body of the given type.
    pub fn new(body_type: RigidBodyType) -> Self {
        Self {
            body_type,
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            additional_mass: None,
            gravity_scale: 1.0,
            can_sleep: true,
            ccd_enabled: false,
        }
    }

    /// Starts building a dynamic body.
    pub fn dynamic() -> Self {
        Self::new(RigidBodyType::Dynamic)
    }

    /// Starts building a static body.
    pub fn fixed() -> Self {
        Self::new(RigidBodyType::Static)
    }

    /// Starts building a kinematic body.
    pub fn kinematic() -> Self {
        Self::new(RigidBodyType::Kinematic)
    }

    /// Sets the initial pose.
    pub fn position(mut self, position: Isometry) -> Self {
        self.position = position;
        self
    }

    /// Sets the initial translation.
    pub fn translation(mut self, translation: Vector) -> Self {
        self.position.translation.vector = translation;
        self
    }

    /// Sets the initial rotation.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.position.rotation = rotation;
        self
    }

    /// Sets the initial linear velocity.
    pub fn linvel(mut self, linvel: Vector) -> Self {
        self.linvel = linvel;
        self
    }

    /// Sets the initial angular velocity.
    pub fn angvel(mut self, angvel: Vector) -> Self {
        self.angvel = angvel;
        self
    }

    /// Adds a point mass at the local origin on top of whatever the
    /// attached colliders contribute.
    pub fn additional_mass(mut self, mass: Scalar) -> Self {
        self.additional_mass = Some(mass);
        self
    }

    /// Sets the gravity multiplier.
    pub fn gravity_scale(mut self, scale: Scalar) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Allows or forbids the body from sleeping.
    pub fn can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Enables continuous collision detection for the body.
    pub fn ccd_enabled(mut self, enabled: bool) -> Self {
        self.ccd_enabled = enabled;
        self
    }

    /// Validates the configuration and builds the body.
    pub fn build(self) -> Result<RigidBody, RigidBodyBuildError> {
        let finite = self
            .position
            .translation
            .vector
            .iter()
            .chain(self.linvel.iter())
            .chain(self.angvel.iter())
            .all(|x| x.is_finite());
        if !finite {
            return Err(RigidBodyBuildError::NonFinite);
        }
        if let Some(mass) = self.additional_mass {
            if !(mass > 0.0 && mass.is_finite()) {
                return Err(RigidBodyBuildError::NonPositiveMass(mass));
            }
        }

        let mut mprops = MassProperties::zero();
        if let Some(mass) = self.additional_mass {
            mprops += MassProperties::new(Point::origin(), mass, Vector::zeros());
        }

        Ok(RigidBody {
            position: self.position,
            linvel: self.linvel,
            angvel: self.angvel,
            mprops,
            additional_mass: self.additional_mass,
            body_type: self.body_type,
            gravity_scale: self.gravity_scale,
            force: Vector::zeros(),
            torque: Vector::zeros(),
            ccd_enabled: self.ccd_enabled,
            can_sleep: self.can_sleep,
            sleeping: false,
            time_sleeping: 0.0,
            next_kinematic_position: None,
            colliders: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validation() {
        assert!(RigidBodyBuilder::dynamic().build().is_ok());
        assert!(matches!(
            RigidBodyBuilder::dynamic().additional_mass(0.0).build(),
            Err(RigidBodyBuildError::NonPositiveMass(_))
        ));
        assert!(matches!(
            RigidBodyBuilder::dynamic()
                .linvel(Vector::new(Scalar::INFINITY, 0.0, 0.0))
                .build(),
            Err(RigidBodyBuildError::NonFinite)
        ));
    }

    #[test]
    fn non_dynamic_bodies_have_infinite_effective_mass() {
        let fixed = RigidBodyBuilder::fixed().build().unwrap();
        let kinematic = RigidBodyBuilder::kinematic().build().unwrap();
        assert_eq!(fixed.effective_inv_mass(), 0.0);
        assert_eq!(kinematic.effective_inv_mass(), 0.0);
        assert_eq!(fixed.effective_world_inv_inertia(), Matrix3::zeros());
    }

    #[test]
    fn impulse_at_point_spins_the_body() {
        let mut body = RigidBodyBuilder::dynamic().additional_mass(2.0).build().unwrap();
        body.apply_impulse(Vector::new(4.0, 0.0, 0.0));
        assert_eq!(body.linvel(), Vector::new(2.0, 0.0, 0.0));

        // A point mass has no angular inertia, so the angular part is zero
        // and only the linear velocity changes.
        body.apply_impulse_at_point(Vector::new(0.0, 2.0, 0.0), Point::new(1.0, 0.0, 0.0));
        assert_eq!(body.linvel(), Vector::new(2.0, 1.0, 0.0));
    }
}
