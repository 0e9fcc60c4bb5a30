use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Image orientation hint, passed through to the detector capability.
///
/// Mirrors the eight EXIF orientations. The core never interprets this;
/// bounding-box origin semantics are owned by whichever detector consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    Left,
    LeftMirrored,
    Right,
    RightMirrored,
}

/// Bounding box for a detected face, in normalized 0..1 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One detected face as reported by the detector capability.
///
/// Pose angles are populated only when the detector provides them, which is
/// why derived feature vectors vary in length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    pub bounding_box: BoundingBox,
    /// Yaw angle in radians, if the detector reported it.
    pub yaw: Option<f32>,
    /// Roll angle in radians, if the detector reported it.
    pub roll: Option<f32>,
}

/// Two feature vectors of different lengths were compared.
///
/// This means "not a match", never a fatal error: vectors of differing
/// length come from observations with different pose availability.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("feature length mismatch: {left} vs {right}")]
pub struct LengthMismatch {
    pub left: usize,
    pub right: usize,
}

/// Geometry/pose feature vector derived from one face observation.
///
/// Length is 4, 5, or 6 depending on which pose fields the detector
/// populated; vectors are only comparable at identical length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean per-component closeness between two equal-length vectors.
    ///
    /// `score = mean_i(1 - |a_i - b_i|)`. Higher = more similar. Components
    /// mix unit ranges (normalized coordinates in [0, 1], angles in radians),
    /// so this is NOT a normalized metric: scores can exceed 1.0 or go
    /// negative. Thresholds must be chosen with that in mind.
    pub fn similarity(&self, other: &FeatureVector) -> Result<f32, LengthMismatch> {
        if self.values.len() != other.values.len() {
            return Err(LengthMismatch {
                left: self.values.len(),
                right: other.values.len(),
            });
        }
        if self.values.is_empty() {
            return Ok(0.0);
        }

        let total: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| 1.0 - (a - b).abs())
            .sum();

        Ok(total / self.values.len() as f32)
    }
}
