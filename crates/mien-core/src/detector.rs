//! Face-geometry detector capability.
//!
//! The detection algorithm itself lives outside this crate; the coordinator
//! only needs a seam to call into. Implementations may be slow; the
//! coordinator always runs them off the caller's execution context.

use crate::decode::PixelBuffer;
use crate::types::{FaceObservation, Orientation};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("detector failed: {0}")]
    Failed(String),
}

/// Capability that finds face geometry in a decoded image.
///
/// Zero observations is a valid result, not an error. The orientation hint
/// is forwarded verbatim from the caller; its interpretation (and the origin
/// semantics of returned bounding boxes) belongs to the implementation.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(
        &self,
        pixels: &PixelBuffer,
        orientation: Orientation,
    ) -> Result<Vec<FaceObservation>, DetectorError>;
}
