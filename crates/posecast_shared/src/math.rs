//! Mathematical types shared between publisher and reader.
//!
//! Everything is `f64`: the buffer stores `f64` slots and the host's
//! single-precision values are widened once, on the way in.
//!
//! Rotation matrices use the column-vector convention: `world = R * local`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position, translation
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Component along `axis`.
    #[must_use]
    pub const fn get(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Mutable component along `axis`.
    pub fn get_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// A coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis (index 0)
    X,
    /// Y axis (index 1)
    Y,
    /// Z axis (index 2)
    Z,
}

impl Axis {
    /// Row/column index of this axis.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Quaternion for rotations (x, y, z imaginary; w real)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
    /// W component
    pub w: f64,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `degrees` about a unit `axis`.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, degrees: f64) -> Self {
        let (s, c) = (degrees.to_radians() * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Euler angles in degrees, one per axis.
///
/// The host's naming is x = pitch, y = roll, z = yaw. The order in which
/// the three elementary rotations compose is a property of the integration,
/// see `EulerOrder`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct EulerDegrees {
    /// Rotation about X in degrees
    pub x: f64,
    /// Rotation about Y in degrees
    pub y: f64,
    /// Rotation about Z in degrees
    pub z: f64,
}

impl EulerDegrees {
    /// Creates a new set of Euler angles
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 3x3 matrix stored row by row: `m[row][col]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat3 {
    /// Rows
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    /// Identity matrix
    pub const IDENTITY: Self = Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Creates a matrix from rows
    #[must_use]
    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// Rotation about X by `radians`.
    #[must_use]
    pub fn rotation_x(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Rotation about Y by `radians`.
    #[must_use]
    pub fn rotation_y(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Rotation about Z by `radians`.
    #[must_use]
    pub fn rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self::from_rows([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rotation matrix of a unit quaternion.
    ///
    /// The input is not normalised; a non-unit quaternion yields a scaled,
    /// non-orthonormal matrix.
    #[must_use]
    pub fn from_quaternion(q: Quaternion) -> Self {
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);

        Self::from_rows([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
        ])
    }

    /// Entry at `row`, `col`.
    #[must_use]
    pub const fn at(&self, row: usize, col: usize) -> f64 {
        self.m[row][col]
    }

    /// Row `i` as a vector.
    #[must_use]
    pub const fn row(&self, i: usize) -> Vec3 {
        Vec3::from_array(self.m[i])
    }

    /// Column `j` as a vector.
    #[must_use]
    pub const fn column(&self, j: usize) -> Vec3 {
        Vec3::new(self.m[0][j], self.m[1][j], self.m[2][j])
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = *self;
        for (i, row) in self.m.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                out.m[j][i] = *value;
            }
        }
        out
    }

    /// Determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Negates row `i` in place.
    pub fn negate_row(&mut self, i: usize) {
        for value in &mut self.m[i] {
            *value = -*value;
        }
    }

    /// Negates column `j` in place.
    pub fn negate_column(&mut self, j: usize) {
        for row in &mut self.m {
            row[j] = -row[j];
        }
    }

    /// Swaps rows `a` and `b` in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        self.m.swap(a, b);
    }

    /// Swaps columns `a` and `b` in place.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        for row in &mut self.m {
            row.swap(a, b);
        }
    }

    /// Largest absolute entry-wise difference to `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat3 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (i, out_row) in out.iter_mut().enumerate() {
            for (j, value) in out_row.iter_mut().enumerate() {
                *value = self.m[i][0] * rhs.m[0][j] + self.m[i][1] * rhs.m[1][j] + self.m[i][2] * rhs.m[2][j];
            }
        }
        Self::from_rows(out)
    }
}

impl std::ops::Mul<Vec3> for Mat3 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.row(0).dot(rhs), self.row(1).dot(rhs), self.row(2).dot(rhs))
    }
}
