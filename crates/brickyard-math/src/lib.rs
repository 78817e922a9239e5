#![warn(missing_docs)]

//! Math types for the brickyard importer.
//!
//! Thin wrappers around nalgebra for the transform half of a placement
//! record: conversion from the placement format's right-handed convention
//! into a left-handed, Y-up engine convention, and decomposition of a
//! combined rotation+scale matrix into a unit quaternion and a per-axis
//! scale.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3};

/// A vector (or point) in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 3x3 linear map: rotation, scale, or both combined.
pub type Mat3 = Matrix3<f64>;

/// A unit quaternion rotation.
pub type Quat = UnitQuaternion<f64>;

/// Column norms at or below this are treated as a collapsed axis.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

/// Conversion between the placement format's axes and the engine's axes.
///
/// Z is always negated (the handedness flip). Y is negated as well when
/// `invert_y` is set, which accounts for the format's "-Y is up" habit.
/// The conversion is its own inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinateConversion {
    /// Negate the Y axis in addition to Z.
    pub invert_y: bool,
}

impl CoordinateConversion {
    /// Create a conversion.
    pub fn new(invert_y: bool) -> Self {
        Self { invert_y }
    }

    /// Diagonal correction matrix `diag(1, +/-1, -1)`.
    pub fn correction(&self) -> Mat3 {
        Mat3::from_diagonal(&Vec3::new(1.0, self.y_sign(), -1.0))
    }

    /// Convert a position: `(x, +/-y, -z)`.
    pub fn position(&self, p: &Vec3) -> Vec3 {
        Vec3::new(p.x, self.y_sign() * p.y, -p.z)
    }

    /// Convert a linear map by change of basis: `C * M * C`.
    ///
    /// Conjugating (rather than multiplying on one side) keeps the
    /// determinant, so a proper rotation stays a proper rotation and the
    /// column norms are untouched.
    pub fn matrix(&self, m: &Mat3) -> Mat3 {
        let c = self.correction();
        c * m * c
    }

    fn y_sign(&self) -> f64 {
        if self.invert_y {
            -1.0
        } else {
            1.0
        }
    }
}

/// Local transform of a placed part, ready to hand to a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTransform {
    /// Position relative to the model root, in engine units.
    pub position: Vec3,
    /// Rotation with scale divided out.
    pub rotation: Quat,
    /// Per-axis scale: the norms of the converted matrix's columns, with
    /// `x` negated for a mirrored placement.
    pub scale: Vec3,
}

impl ResolvedTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rebuild the linear part: `R * diag(scale)`.
    pub fn basis(&self) -> Mat3 {
        self.rotation.to_rotation_matrix().into_inner() * Mat3::from_diagonal(&self.scale)
    }

    /// Shift the position by `offset`.
    pub fn translated(mut self, offset: &Vec3) -> Self {
        self.position += offset;
        self
    }
}

impl Default for ResolvedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Resolves raw placement data into engine-space transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformResolver {
    /// Axis convention conversion.
    pub conversion: CoordinateConversion,
    /// File units to engine units, per axis.
    pub unit_scale: Vec3,
}

impl TransformResolver {
    /// Create a resolver.
    pub fn new(invert_y: bool, unit_scale: Vec3) -> Self {
        Self {
            conversion: CoordinateConversion::new(invert_y),
            unit_scale,
        }
    }

    /// Convert, scale, and decompose one placement.
    pub fn resolve(&self, position: &Vec3, matrix: &Mat3) -> ResolvedTransform {
        let mut resolved = resolve_transform(position, matrix, self.conversion.invert_y);
        resolved.position.component_mul_assign(&self.unit_scale);
        resolved
    }
}

impl Default for TransformResolver {
    fn default() -> Self {
        Self::new(false, Vec3::new(1.0, 1.0, 1.0))
    }
}

/// Convert a raw position and matrix, then split the matrix into rotation
/// and scale. Positions stay in file units.
pub fn resolve_transform(position: &Vec3, matrix: &Mat3, invert_y: bool) -> ResolvedTransform {
    let conversion = CoordinateConversion::new(invert_y);
    let (rotation, scale) = decompose(&conversion.matrix(matrix));
    ResolvedTransform {
        position: conversion.position(position),
        rotation,
        scale,
    }
}

/// Split a rotation+scale matrix into `(rotation, scale)`.
///
/// Scale is the Euclidean norm of each column. Each non-degenerate column
/// is divided by its norm before the rotation is extracted; a collapsed
/// column is left as is.
///
/// A mirrored matrix (negative determinant) is made proper by flipping its
/// X column, and the mirror is carried as a negative `scale.x`, so
/// `R * diag(scale)` still rebuilds `m`.
pub fn decompose(m: &Mat3) -> (Quat, Vec3) {
    let mut scale = Vec3::new(m.column(0).norm(), m.column(1).norm(), m.column(2).norm());
    let mut rotation = *m;
    for (i, s) in scale.iter().enumerate() {
        if *s > DEGENERATE_EPSILON {
            let column = m.column(i) / *s;
            rotation.set_column(i, &column);
        }
    }
    if is_mirrored(&rotation) {
        let flipped = -rotation.column(0);
        rotation.set_column(0, &flipped);
        scale.x = -scale.x;
    }
    (quaternion_from_matrix(&rotation), scale)
}

/// Whether `m` reverses orientation.
pub fn is_mirrored(m: &Mat3) -> bool {
    m.determinant() < -DEGENERATE_EPSILON
}

/// Extract a unit quaternion from a rotation matrix.
///
/// Picks the branch on the largest of the trace and the diagonal entries,
/// which keeps the divisor away from zero. A matrix that yields a zero
/// quaternion (all-zero input) maps to the identity.
pub fn quaternion_from_matrix(m: &Mat3) -> Quat {
    let (m00, m01, m02) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (m10, m11, m12) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (m20, m21, m22) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);

    let trace = m00 + m11 + m22;
    let (w, x, y, z) = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        (0.25 * s, (m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s)
    } else if m00 > m11 && m00 > m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
        ((m21 - m12) / s, 0.25 * s, (m01 + m10) / s, (m02 + m20) / s)
    } else if m11 > m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
        ((m02 - m20) / s, (m01 + m10) / s, 0.25 * s, (m12 + m21) / s)
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
        ((m10 - m01) / s, (m02 + m20) / s, (m12 + m21) / s, 0.25 * s)
    };

    Quat::try_new(Quaternion::new(w, x, y, z), DEGENERATE_EPSILON).unwrap_or_else(Quat::identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn rotation(roll: f64, pitch: f64, yaw: f64) -> Mat3 {
        Quat::from_euler_angles(roll, pitch, yaw)
            .to_rotation_matrix()
            .into_inner()
    }

    #[test]
    fn test_identity_quaternion() {
        let q = quaternion_from_matrix(&Mat3::identity());
        assert_abs_diff_eq!(q.w, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(q.i, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(q.j, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(q.k, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_quaternion_roundtrip_sweep() {
        // Steps of 0.37 rad hit every branch, including near-180 degree turns
        // where the trace goes negative.
        let steps: Vec<f64> = (0..17).map(|i| -PI + 0.37 * i as f64).collect();
        for &roll in &steps {
            for &pitch in &steps {
                for &yaw in &steps {
                    let r = rotation(roll, pitch, yaw);
                    let rebuilt = quaternion_from_matrix(&r).to_rotation_matrix().into_inner();
                    assert_abs_diff_eq!(rebuilt, r, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_half_turns_take_diagonal_branches() {
        let x_turn = Mat3::from_diagonal(&Vec3::new(1.0, -1.0, -1.0));
        let q = quaternion_from_matrix(&x_turn);
        assert_abs_diff_eq!(q.i.abs(), 1.0, epsilon = 1e-12);

        let y_turn = Mat3::from_diagonal(&Vec3::new(-1.0, 1.0, -1.0));
        let q = quaternion_from_matrix(&y_turn);
        assert_abs_diff_eq!(q.j.abs(), 1.0, epsilon = 1e-12);

        let z_turn = Mat3::from_diagonal(&Vec3::new(-1.0, -1.0, 1.0));
        let q = quaternion_from_matrix(&z_turn);
        assert_abs_diff_eq!(q.k.abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let r = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let q = quaternion_from_matrix(&r);
        let expected = Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2);
        assert_relative_eq!(q.angle_to(&expected), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_independent_of_rotation() {
        let s = Mat3::from_diagonal(&Vec3::new(2.0, 3.0, 4.0));
        for (roll, pitch, yaw) in [(0.0, 0.0, 0.0), (0.3, -1.1, 2.5), (PI, 0.2, -0.7)] {
            let m = rotation(roll, pitch, yaw) * s;
            for invert_y in [false, true] {
                let t = resolve_transform(&Vec3::zeros(), &m, invert_y);
                assert_abs_diff_eq!(t.scale, Vec3::new(2.0, 3.0, 4.0), epsilon = 1e-4);
                let converted = CoordinateConversion::new(invert_y).matrix(&m);
                assert_abs_diff_eq!(t.basis(), converted, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_conversion_is_involution() {
        let conv = CoordinateConversion::new(true);
        let p = Vec3::new(10.5, -20.0, 5.0);
        assert_abs_diff_eq!(conv.position(&conv.position(&p)), p, epsilon = 1e-5);

        let m = rotation(0.4, 1.2, -0.3) * Mat3::from_diagonal(&Vec3::new(1.0, 2.0, 0.5));
        assert_abs_diff_eq!(conv.matrix(&conv.matrix(&m)), m, epsilon = 1e-5);
    }

    #[test]
    fn test_conversion_keeps_rotation_proper() {
        let m = rotation(0.9, -0.4, 2.0);
        for invert_y in [false, true] {
            let converted = CoordinateConversion::new(invert_y).matrix(&m);
            assert_relative_eq!(converted.determinant(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_position_conversion() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(CoordinateConversion::new(false).position(&p), Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(CoordinateConversion::new(true).position(&p), Vec3::new(1.0, -2.0, -3.0));
    }

    #[test]
    fn test_resolver_applies_unit_scale() {
        let resolver = TransformResolver::new(true, Vec3::new(0.05, 0.05, 0.05));
        let t = resolver.resolve(&Vec3::new(10.5, -20.0, 5.0), &Mat3::identity());
        assert_abs_diff_eq!(t.position, Vec3::new(0.525, 1.0, -0.25), epsilon = 1e-9);
        assert_abs_diff_eq!(t.rotation.angle(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(t.scale, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_mirrored_matrix() {
        // Quarter turn about Z with the Z axis mirrored.
        let m = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0);
        let t = resolve_transform(&Vec3::zeros(), &m, true);
        let converted = CoordinateConversion::new(true).matrix(&m);
        assert!(is_mirrored(&converted));

        assert_abs_diff_eq!(t.scale, Vec3::new(-1.0, 1.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(t.basis(), converted, epsilon = 1e-9);
        let r = t.rotation.to_rotation_matrix().into_inner();
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mirrored_scaled_matrix() {
        let m = rotation(0.3, -1.1, 2.5) * Mat3::from_diagonal(&Vec3::new(2.0, -3.0, 4.0));
        let (q, scale) = decompose(&m);
        assert_abs_diff_eq!(scale, Vec3::new(-2.0, 3.0, 4.0), epsilon = 1e-9);
        let rebuilt = q.to_rotation_matrix().into_inner() * Mat3::from_diagonal(&scale);
        assert_abs_diff_eq!(rebuilt, m, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_matrix() {
        let (q, scale) = decompose(&Mat3::zeros());
        assert_eq!(scale, Vec3::zeros());
        assert_eq!(q, Quat::identity());
    }

    #[test]
    fn test_translated() {
        let t = ResolvedTransform::identity().translated(&Vec3::new(0.0, -1.2, 0.0));
        assert_eq!(t.position, Vec3::new(0.0, -1.2, 0.0));
        assert_eq!(t.scale, Vec3::new(1.0, 1.0, 1.0));
    }
}
