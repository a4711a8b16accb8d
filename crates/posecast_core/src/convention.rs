//! # Coordinate Convention Profiles
//!
//! Every host/consumer pairing disagrees on something: handedness, which
//! axis is up, row vs column grouping, world scale. Rather than one
//! hand-written encoder per pairing, a profile declares:
//!
//! 1. the Euler composition order used by the host,
//! 2. an ordered list of [`Adjustment`]s applied after composition,
//! 3. the major order used when packing the transform block,
//! 4. the marker constant stamped into slot 0.
//!
//! Adjustments are applied in declaration order with no branching on data.
//!
//! ```toml
//! [profile]
//! euler_order = "xyz"
//! major_order = "column"
//! adjustments = [
//!     { flip_handedness = "z" },
//!     { scale_translation = 3.0 },
//!     { swap_rows = ["y", "z"] },
//! ]
//! ```

use posecast_shared::constants::{BORDERLANDS3_MARKER, DEFAULT_MARKER};
use posecast_shared::{Axis, CameraToWorld, MajorOrder, Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Order in which the three elementary rotations are multiplied.
///
/// Named left to right: `Zyx` means `R = Rz * Ry * Rx`, so X is applied
/// to a camera-local vector first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EulerOrder {
    /// `Rx * Ry * Rz`
    Xyz,
    /// `Rx * Rz * Ry`
    Xzy,
    /// `Ry * Rx * Rz`
    Yxz,
    /// `Ry * Rz * Rx`
    Yzx,
    /// `Rz * Rx * Ry`
    Zxy,
    /// `Rz * Ry * Rx`
    #[default]
    Zyx,
}

impl EulerOrder {
    /// Multiplies the three elementary rotations in this order.
    #[must_use]
    pub fn compose(self, rx: Mat3, ry: Mat3, rz: Mat3) -> Mat3 {
        match self {
            Self::Xyz => rx * ry * rz,
            Self::Xzy => rx * rz * ry,
            Self::Yxz => ry * rx * rz,
            Self::Yzx => ry * rz * rx,
            Self::Zxy => rz * rx * ry,
            Self::Zyx => rz * ry * rx,
        }
    }
}

/// A single post-composition adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    /// Transpose the rotation.
    Transpose,
    /// Negate rotation column `axis` and translation component `axis`.
    FlipHandedness(Axis),
    /// Negate rotation row `axis`.
    NegateRow(Axis),
    /// Negate rotation column `axis`.
    NegateColumn(Axis),
    /// Negate translation component `axis`.
    NegateTranslation(Axis),
    /// Swap two world axes: rotation rows and translation components.
    SwapAxes(Axis, Axis),
    /// Swap two rotation rows only.
    SwapRows(Axis, Axis),
    /// Swap two rotation columns only.
    SwapColumns(Axis, Axis),
    /// Multiply the translation by a constant (world unit conversion).
    ScaleTranslation(f64),
}

impl Adjustment {
    /// Applies this adjustment in place.
    pub fn apply(self, transform: &mut CameraToWorld) {
        let r = &mut transform.rotation;
        let t = &mut transform.translation;
        match self {
            Self::Transpose => *r = r.transpose(),
            Self::FlipHandedness(axis) => {
                r.negate_column(axis.index());
                let component = t.get_mut(axis);
                *component = -*component;
            }
            Self::NegateRow(axis) => r.negate_row(axis.index()),
            Self::NegateColumn(axis) => r.negate_column(axis.index()),
            Self::NegateTranslation(axis) => {
                let component = t.get_mut(axis);
                *component = -*component;
            }
            Self::SwapAxes(a, b) => {
                r.swap_rows(a.index(), b.index());
                let mut arr = t.to_array();
                arr.swap(a.index(), b.index());
                *t = Vec3::from_array(arr);
            }
            Self::SwapRows(a, b) => r.swap_rows(a.index(), b.index()),
            Self::SwapColumns(a, b) => r.swap_columns(a.index(), b.index()),
            Self::ScaleTranslation(k) => *t = *t * k,
        }
    }
}

fn default_marker() -> f64 {
    DEFAULT_MARKER
}

/// A named, declarative source-to-destination convention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConventionProfile {
    /// Human-readable name (logged at activation).
    #[serde(default = "ConventionProfile::custom_name")]
    pub name: String,
    /// Euler composition order (ignored for quaternion sources).
    #[serde(default)]
    pub euler_order: EulerOrder,
    /// Grouping of the transform block in the buffer.
    #[serde(default)]
    pub major_order: MajorOrder,
    /// Adjustments, applied in order after composition.
    #[serde(default)]
    pub adjustments: Vec<Adjustment>,
    /// Marker stamped into slot 0.
    #[serde(default = "default_marker")]
    pub marker: f64,
}

/// Names accepted by [`ConventionProfile::preset`].
pub const PRESET_NAMES: [&str; 6] = [
    "identity",
    "gtav_row_major",
    "gtav_column_major",
    "gtav_open3d",
    "unity_right_handed",
    "borderlands3",
];

impl ConventionProfile {
    fn custom_name() -> String {
        "custom".to_string()
    }

    /// Reference profile: `Rz * Ry * Rx`, no adjustments, row-major.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            name: "identity".to_string(),
            euler_order: EulerOrder::Zyx,
            major_order: MajorOrder::Row,
            adjustments: Vec::new(),
            marker: DEFAULT_MARKER,
        }
    }

    /// GTA V gameplay camera, host convention untouched, row-major.
    #[must_use]
    pub fn gtav_row_major() -> Self {
        Self {
            name: "gtav_row_major".to_string(),
            ..Self::identity()
        }
    }

    /// GTA V gameplay camera, column-major grouping.
    #[must_use]
    pub fn gtav_column_major() -> Self {
        Self {
            name: "gtav_column_major".to_string(),
            major_order: MajorOrder::Column,
            ..Self::identity()
        }
    }

    /// GTA V camera converted to a right-handed, Y-down (Open3D) consumer.
    ///
    /// The host's math library uses row-vector matrices, so its
    /// `Rx * Ry * Rz` is `(Rz * Ry * Rx)^T` here. Translation is scaled by 3
    /// to match the consumer's world units.
    #[must_use]
    pub fn gtav_open3d() -> Self {
        Self {
            name: "gtav_open3d".to_string(),
            euler_order: EulerOrder::Zyx,
            major_order: MajorOrder::Column,
            adjustments: vec![
                Adjustment::Transpose,
                Adjustment::FlipHandedness(Axis::Z),
                Adjustment::FlipHandedness(Axis::Y),
                Adjustment::ScaleTranslation(3.0),
                Adjustment::SwapRows(Axis::Y, Axis::Z),
                Adjustment::NegateRow(Axis::Z),
            ],
            marker: DEFAULT_MARKER,
        }
    }

    /// Unity main camera (left-handed, Y up) into a right-handed consumer.
    #[must_use]
    pub fn unity_right_handed() -> Self {
        Self {
            name: "unity_right_handed".to_string(),
            euler_order: EulerOrder::Zyx,
            major_order: MajorOrder::Row,
            adjustments: vec![
                Adjustment::FlipHandedness(Axis::Z),
                Adjustment::SwapColumns(Axis::Y, Axis::Z),
            ],
            marker: DEFAULT_MARKER,
        }
    }

    /// Borderlands 3 scripted camera: GTA-style layout, its own marker.
    #[must_use]
    pub fn borderlands3() -> Self {
        Self {
            name: "borderlands3".to_string(),
            marker: BORDERLANDS3_MARKER,
            ..Self::identity()
        }
    }

    /// Looks up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownPreset`] for unrecognised names.
    pub fn preset(name: &str) -> ConfigResult<Self> {
        match name {
            "identity" => Ok(Self::identity()),
            "gtav_row_major" => Ok(Self::gtav_row_major()),
            "gtav_column_major" => Ok(Self::gtav_column_major()),
            "gtav_open3d" => Ok(Self::gtav_open3d()),
            "unity_right_handed" => Ok(Self::unity_right_handed()),
            "borderlands3" => Ok(Self::borderlands3()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    /// Applies every adjustment, in order.
    pub fn adjust(&self, transform: &mut CameraToWorld) {
        for adjustment in &self.adjustments {
            adjustment.apply(transform);
        }
    }

    /// Rejects profiles that cannot be published.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the marker is zero or not finite:
    /// a zeroed buffer would then pass the presence check.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.marker.is_finite() || self.marker == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "profile '{}' has unusable marker {:e}",
                self.name, self.marker
            )));
        }
        Ok(())
    }
}

impl Default for ConventionProfile {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CameraToWorld {
        CameraToWorld::new(
            Mat3::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]),
            Vec3::new(10.0, 20.0, 30.0),
        )
    }

    #[test]
    fn test_every_preset_resolves() {
        for name in PRESET_NAMES {
            let profile = ConventionProfile::preset(name).unwrap();
            assert_eq!(profile.name, name);
            profile.validate().unwrap();
        }
        assert!(matches!(
            ConventionProfile::preset("nope"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_flip_handedness_negates_column_and_translation() {
        let mut t = sample();
        Adjustment::FlipHandedness(Axis::Z).apply(&mut t);
        assert_eq!(t.rotation.column(2).to_array(), [-3.0, -6.0, -9.0]);
        assert_eq!(t.translation, Vec3::new(10.0, 20.0, -30.0));
    }

    #[test]
    fn test_swap_axes_moves_translation_too() {
        let mut t = sample();
        Adjustment::SwapAxes(Axis::Y, Axis::Z).apply(&mut t);
        assert_eq!(t.rotation.row(1).to_array(), [7.0, 8.0, 9.0]);
        assert_eq!(t.translation, Vec3::new(10.0, 30.0, 20.0));
    }

    #[test]
    fn test_swap_rows_leaves_translation() {
        let mut t = sample();
        Adjustment::SwapRows(Axis::X, Axis::Y).apply(&mut t);
        assert_eq!(t.rotation.row(0).to_array(), [4.0, 5.0, 6.0]);
        assert_eq!(t.translation, sample().translation);
    }

    #[test]
    fn test_transpose_twice_is_noop() {
        let mut t = sample();
        Adjustment::Transpose.apply(&mut t);
        assert_eq!(t.rotation.row(0).to_array(), [1.0, 4.0, 7.0]);
        Adjustment::Transpose.apply(&mut t);
        assert_eq!(t, sample());
    }

    #[test]
    fn test_open3d_layout_matches_hand_written_encoder() {
        // The hand-written encoder this preset replaces emitted, per column j:
        // R[0][j], R[2][j], -R[1][j], t[j] after flipping Z and Y. `sample()`
        // plays the role of the composed matrix, so undo the leading transpose.
        let mut profile = ConventionProfile::gtav_open3d();
        assert_eq!(profile.adjustments.remove(0), Adjustment::Transpose);
        let mut t = sample();
        profile.adjust(&mut t);

        let mut flipped = sample();
        flipped.rotation.negate_column(2);
        flipped.rotation.negate_column(1);
        let r = flipped.rotation;
        let block = t.encode(profile.major_order);
        assert_eq!(&block[0..4], &[r.at(0, 0), r.at(2, 0), -r.at(1, 0), 30.0]);
        assert_eq!(&block[4..8], &[r.at(0, 1), r.at(2, 1), -r.at(1, 1), -60.0]);
        assert_eq!(&block[8..12], &[r.at(0, 2), r.at(2, 2), -r.at(1, 2), -90.0]);
    }

    #[test]
    fn test_open3d_pitch_matches_row_vector_host() {
        // Pitch 30 degrees at (1, 2, 3), worked by hand in the host's
        // row-vector convention: RotationX = [[1,0,0],[0,c,s],[0,-s,c]],
        // Z and Y columns negated, C = (1, -2, -3) * 3, then column-major
        // M1j, M3j, -M2j, C[j].
        let (s, c) = 30.0_f64.to_radians().sin_cos();
        let expected = [1.0, 0.0, 0.0, 3.0, 0.0, s, c, -6.0, 0.0, -c, s, -9.0];

        let profile = ConventionProfile::gtav_open3d();
        let composer = crate::composer::RotationComposer::new(profile.clone());
        let pose = crate::source::Pose::euler(
            Vec3::new(1.0, 2.0, 3.0),
            posecast_shared::EulerDegrees::new(30.0, 0.0, 0.0),
            60.0,
        );
        let block = composer.compose(&pose).encode(profile.major_order);
        for (i, (got, want)) in block.iter().zip(expected).enumerate() {
            assert!((got - want).abs() < 1e-12, "slot {i}: got {got}, want {want}");
        }
    }

    #[test]
    fn test_unity_layout_matches_hand_written_encoder() {
        // Row i: m[i][0], m[i][2], m[i][1], t[i], with column 2 and t.z negated first.
        let profile = ConventionProfile::unity_right_handed();
        let mut t = sample();
        profile.adjust(&mut t);
        let block = t.encode(profile.major_order);
        assert_eq!(&block[0..4], &[1.0, -3.0, 2.0, 10.0]);
        assert_eq!(&block[8..12], &[7.0, -9.0, 8.0, -30.0]);
    }

    #[test]
    fn test_profile_from_toml() {
        let profile: ConventionProfile = toml::from_str(
            r#"
            name = "custom_consumer"
            euler_order = "xyz"
            major_order = "column"
            adjustments = [
                "transpose",
                { flip_handedness = "z" },
                { swap_axes = ["y", "z"] },
                { scale_translation = 0.01 },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(profile.euler_order, EulerOrder::Xyz);
        assert_eq!(profile.major_order, MajorOrder::Column);
        assert_eq!(profile.adjustments.len(), 4);
        assert_eq!(profile.adjustments[2], Adjustment::SwapAxes(Axis::Y, Axis::Z));
        assert_eq!(profile.marker.to_bits(), DEFAULT_MARKER.to_bits());
    }

    #[test]
    fn test_zero_marker_rejected() {
        let profile = ConventionProfile {
            marker: 0.0,
            ..ConventionProfile::identity()
        };
        assert!(profile.validate().is_err());
    }
}
