//! mien-core — face recognition core.
//!
//! Coordinates asynchronous face detection with last-request-wins delivery,
//! derives geometry/pose feature vectors from detected faces, and matches
//! them against a registry of enrolled people. Image decoding and the face
//! detection algorithm itself are external capabilities, supplied through
//! the [`decode::ImageDecoder`] and [`detector::FaceDetector`] traits.

pub mod coordinator;
pub mod decode;
pub mod detector;
pub mod extractor;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use coordinator::{DetectError, DetectionCoordinator, DetectionOutcome, DetectionTicket};
pub use decode::{DecodeError, ImageDecoder, PixelBuffer, StdImageDecoder};
pub use detector::{DetectorError, FaceDetector};
pub use pipeline::{BatchOutcome, Recognition, RecognitionOutcome, RecognitionPipeline};
pub use registry::{
    EnrolledPerson, IdentityMatch, IdentityRegistry, RegistryError, Template,
    DEFAULT_MATCH_THRESHOLD,
};
pub use types::{BoundingBox, FaceObservation, FeatureVector, LengthMismatch, Orientation};
