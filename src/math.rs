//! Math types and helpers used by the crate.
//!
//! The engine works in 3D with `f32` precision, using [`nalgebra`] types
//! through the aliases that [`parry3d`] uses for its own math.

use nalgebra::{Matrix3, UnitQuaternion};
use parry3d::mass_properties::MassProperties;

/// The scalar type used by the engine.
pub type Scalar = parry3d::math::Real;

/// A 3D vector.
pub type Vector = parry3d::math::Vector<Scalar>;

/// A 3D point.
pub type Point = parry3d::math::Point<Scalar>;

/// A rigid transformation: rotation followed by translation.
pub type Isometry = parry3d::math::Isometry<Scalar>;

/// A unit-length 3D vector.
pub type UnitVector = nalgebra::UnitVector3<Scalar>;

/// A rotation represented as a unit quaternion.
pub type Rotation = UnitQuaternion<Scalar>;

/// Archimedes' constant.
pub const PI: Scalar = core::f32::consts::PI;

/// Computes the world-space inverse angular inertia tensor for a body with the
/// given local mass properties and world rotation.
///
/// The result is zero for bodies with infinite angular inertia.
pub fn world_inv_inertia(mprops: &MassProperties, rotation: &Rotation) -> Matrix3<Scalar> {
    let frame = (rotation * mprops.principal_inertia_local_frame).to_rotation_matrix();
    let inv_diagonal = mprops
        .inv_principal_inertia_sqrt
        .component_mul(&mprops.inv_principal_inertia_sqrt);
    frame.matrix() * Matrix3::from_diagonal(&inv_diagonal) * frame.matrix().transpose()
}

/// Builds an orthonormal basis for the plane orthogonal to `normal`.
///
/// Used to derive the two friction tangent directions of a contact.
pub fn tangent_basis(normal: &Vector) -> [Vector; 2] {
    // Pick the world axis least aligned with the normal to avoid degeneracy.
    let other = if normal.x.abs() < 0.5 {
        Vector::x()
    } else {
        Vector::y()
    };
    let tangent1 = normal.cross(&other).normalize();
    let tangent2 = normal.cross(&tangent1);
    [tangent1, tangent2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tangent_basis_is_orthonormal() {
        for normal in [
            Vector::x(),
            Vector::y(),
            Vector::z(),
            Vector::new(1.0, 2.0, -3.0).normalize(),
        ] {
            let [t1, t2] = tangent_basis(&normal);
            assert_relative_eq!(t1.norm(), 1.0, epsilon = 1.0e-6);
            assert_relative_eq!(t2.norm(), 1.0, epsilon = 1.0e-6);
            assert_relative_eq!(t1.dot(&normal), 0.0, epsilon = 1.0e-6);
            assert_relative_eq!(t2.dot(&normal), 0.0, epsilon = 1.0e-6);
            assert_relative_eq!(t1.dot(&t2), 0.0, epsilon = 1.0e-6);
        }
    }
}
