#![warn(missing_docs)]

//! Math types for the kinforge resolution engine.
//!
//! Thin wrappers around nalgebra providing the rigid-body transform
//! type used throughout assembly resolution, plus the tolerance
//! constants shared by the downstream crates.

use nalgebra::{Matrix3, Unit, Vector3};
use thiserror::Error;

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Maximum deviation from orthonormality accepted in a rotation block.
pub const ORTHO_TOL: f64 = 1e-6;

/// Norm below which a direction vector is considered degenerate.
pub const AXIS_EPS: f64 = 1e-9;

/// Errors produced when validating a transform.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The 3x3 rotation block is not orthonormal within [`ORTHO_TOL`].
    #[error("rotation block is not orthonormal (deviation {deviation:.3e})")]
    NotOrthonormal {
        /// Largest absolute entry of `R^T R - I`.
        deviation: f64,
    },

    /// The bottom row of a 4x4 matrix is not `[0 0 0 1]`.
    #[error("matrix is not an affine transform (bottom row {row:?})")]
    NotAffine {
        /// The offending bottom row.
        row: [f64; 4],
    },
}

/// A rigid-body transform: an orthonormal rotation followed by a translation.
///
/// Composition and inversion use the closed rigid forms, so the rotation
/// block stays orthonormal up to floating-point drift; call
/// [`Frame::renormalized`] after long composition chains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The rotation block.
    pub rotation: Matrix3<f64>,
    /// The translation vector.
    pub translation: Vec3,
}

impl Frame {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vec3::zeros(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vec3::new(dx, dy, dz),
        }
    }

    /// Rotation about an axis through the origin by `angle` radians.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self {
            rotation: nalgebra::Rotation3::from_axis_angle(axis, angle)
                .matrix()
                .to_owned(),
            translation: Vec3::zeros(),
        }
    }

    /// Build a frame from a rotation block and translation, validating
    /// that the rotation is orthonormal within [`ORTHO_TOL`].
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vec3) -> Result<Self, TransformError> {
        let frame = Self {
            rotation,
            translation,
        };
        let deviation = frame.orthonormal_deviation();
        if deviation > ORTHO_TOL {
            return Err(TransformError::NotOrthonormal { deviation });
        }
        Ok(frame)
    }

    /// Build a frame from a row-major 4x4 matrix as delivered by the CAD
    /// service, validating affinity and rotation orthonormality.
    pub fn from_matrix(m: &[f64; 16]) -> Result<Self, TransformError> {
        let row = [m[12], m[13], m[14], m[15]];
        if (row[0]).abs() > ORTHO_TOL
            || (row[1]).abs() > ORTHO_TOL
            || (row[2]).abs() > ORTHO_TOL
            || (row[3] - 1.0).abs() > ORTHO_TOL
        {
            return Err(TransformError::NotAffine { row });
        }
        let rotation = Matrix3::new(m[0], m[1], m[2], m[4], m[5], m[6], m[8], m[9], m[10]);
        let translation = Vec3::new(m[3], m[7], m[11]);
        Self::from_parts(rotation, translation)
    }

    /// Row-major 4x4 matrix representation.
    pub fn to_matrix(&self) -> [f64; 16] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            t.x,
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            t.y,
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
            t.z,
            0.0,
            0.0,
            0.0,
            1.0,
        ]
    }

    /// Compose: apply `other`'s frame within `self`'s frame (`self ∘ other`).
    ///
    /// Non-commutative: `a.compose(&b)` applied to a point is `a(b(p))`.
    pub fn compose(&self, other: &Frame) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Rigid inverse (`R^T`, `-R^T t`).
    pub fn inverse(&self) -> Self {
        let rt = self.rotation.transpose();
        Self {
            rotation: rt,
            translation: -(rt * self.translation),
        }
    }

    /// Transform a point.
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    /// Transform a direction vector (rotation only).
    pub fn transform_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation * v
    }

    /// Largest absolute entry of `R^T R - I`.
    pub fn orthonormal_deviation(&self) -> f64 {
        let d = self.rotation.transpose() * self.rotation - Matrix3::identity();
        d.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()))
    }

    /// Re-orthonormalize the rotation block with Gram-Schmidt.
    ///
    /// Composition is numerically stable, but chains of hundreds of
    /// occurrence transforms can accumulate drift past [`ORTHO_TOL`].
    pub fn renormalized(&self) -> Self {
        let x = self.rotation.column(0).normalize();
        let mut y = self.rotation.column(1).into_owned();
        y -= x * y.dot(&x);
        let y = y.normalize();
        let z = x.cross(&y);
        Self {
            rotation: Matrix3::from_columns(&[x, y, z]),
            translation: self.translation,
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}
