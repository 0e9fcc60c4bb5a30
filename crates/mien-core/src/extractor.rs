//! Geometry feature extraction.
//!
//! Turns one face observation into its numeric descriptor. The descriptor is
//! a crude spatial/pose fingerprint, not a learned biometric embedding;
//! callers must not assume recognition accuracy beyond coarse pose and
//! position similarity.

use crate::types::{FaceObservation, FeatureVector};

/// Derive the feature vector for one observation.
///
/// Always appends, in fixed order: x, y, width, height of the bounding box,
/// then yaw if present, then roll if present. Output length is therefore 4,
/// 5, or 6 depending on what the detector populated. Pure and infallible.
pub fn extract(observation: &FaceObservation) -> FeatureVector {
    let mut values = Vec::with_capacity(6);
    let bbox = &observation.bounding_box;
    values.push(bbox.x);
    values.push(bbox.y);
    values.push(bbox.width);
    values.push(bbox.height);
    if let Some(yaw) = observation.yaw {
        values.push(yaw);
    }
    if let Some(roll) = observation.roll {
        values.push(roll);
    }
    FeatureVector::new(values)
}
