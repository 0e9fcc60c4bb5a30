//! Recognition pipeline: detection, feature extraction, identity lookup.

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::{DetectError, DetectionCoordinator, DetectionOutcome};
use crate::decode::ImageDecoder;
use crate::detector::FaceDetector;
use crate::extractor;
use crate::registry::{IdentityMatch, IdentityRegistry};
use crate::types::{FaceObservation, Orientation};

/// One face paired with its identification result.
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    pub face: FaceObservation,
    /// `None` when no enrolled template met the threshold.
    pub identity: Option<IdentityMatch>,
}

/// Result of a [`RecognitionPipeline::process`] call.
#[derive(Debug)]
pub enum RecognitionOutcome {
    /// Detection completed while still current; one entry per face, in
    /// detector order.
    Recognized(Vec<Recognition>),
    /// A newer request on the same pipeline superseded this one; no result
    /// exists for it.
    Superseded,
}

/// Result of a [`RecognitionPipeline::process_all`] call.
#[derive(Debug)]
pub enum BatchOutcome {
    /// One recognition list per input image, in input order.
    Recognized(Vec<Vec<Recognition>>),
    /// A concurrent request superseded a batch member; the batch was
    /// abandoned.
    Superseded,
}

/// Composes the coordinator, the feature extractor, and the registry.
///
/// Recognition only reads the registry; enrollment stays an explicit,
/// separate caller action.
pub struct RecognitionPipeline<C, D> {
    coordinator: DetectionCoordinator<C, D>,
    registry: Arc<IdentityRegistry>,
    threshold: f32,
}

impl<C, D> RecognitionPipeline<C, D>
where
    C: ImageDecoder + 'static,
    D: FaceDetector + 'static,
{
    pub fn new(
        coordinator: DetectionCoordinator<C, D>,
        registry: Arc<IdentityRegistry>,
        threshold: f32,
    ) -> Self {
        Self {
            coordinator,
            registry,
            threshold,
        }
    }

    /// The registry this pipeline identifies against.
    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// Detect and identify every face in one encoded image.
    ///
    /// Decode and detector failures propagate unchanged. A call superseded
    /// by a newer one resolves to [`RecognitionOutcome::Superseded`], which
    /// is not an error.
    pub async fn process(
        &self,
        image: Vec<u8>,
        orientation: Orientation,
    ) -> Result<RecognitionOutcome, DetectError> {
        let ticket = self.coordinator.detect(image, orientation);
        match ticket.outcome().await {
            DetectionOutcome::Faces(observations) => {
                let recognitions: Vec<Recognition> = observations
                    .into_iter()
                    .map(|face| {
                        let features = extractor::extract(&face);
                        let identity = self.registry.identify(&features, self.threshold);
                        Recognition { face, identity }
                    })
                    .collect();
                tracing::debug!(
                    faces = recognitions.len(),
                    identified = recognitions.iter().filter(|r| r.identity.is_some()).count(),
                    "recognition complete"
                );
                Ok(RecognitionOutcome::Recognized(recognitions))
            }
            DetectionOutcome::Failed(err) => Err(err),
            DetectionOutcome::Superseded => Ok(RecognitionOutcome::Superseded),
        }
    }

    /// Process several images as one sequential batch.
    ///
    /// Each image's delivery is awaited before the next request is issued,
    /// so batch members never supersede one another. A concurrent caller on
    /// the same pipeline still can; the batch is then abandoned. The first
    /// failure aborts the batch.
    pub async fn process_all(
        &self,
        images: Vec<Vec<u8>>,
        orientation: Orientation,
    ) -> Result<BatchOutcome, DetectError> {
        let mut results = Vec::with_capacity(images.len());
        for image in images {
            match self.process(image, orientation).await? {
                RecognitionOutcome::Recognized(recognitions) => results.push(recognitions),
                RecognitionOutcome::Superseded => return Ok(BatchOutcome::Superseded),
            }
        }
        Ok(BatchOutcome::Recognized(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodeError, PixelBuffer};
    use crate::detector::DetectorError;
    use crate::registry::DEFAULT_MATCH_THRESHOLD;
    use crate::types::BoundingBox;
    use std::time::Duration;

    struct PassThroughDecoder;

    impl ImageDecoder for PassThroughDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
            Ok(PixelBuffer {
                data: bytes.to_vec(),
                width: bytes.len() as u32,
                height: 1,
            })
        }
    }

    fn observation(x: f32) -> FaceObservation {
        FaceObservation {
            bounding_box: BoundingBox {
                x,
                y: 0.2,
                width: 0.3,
                height: 0.4,
            },
            yaw: Some(0.1),
            roll: Some(0.0),
        }
    }

    /// Sleeps for `data[1]` milliseconds, then reports two faces: one with
    /// full pose at x = `data[0]/100`, and one geometry-only face whose
    /// 4-component features can never be scored against 6-component
    /// templates.
    struct TwoFaceDetector;

    impl FaceDetector for TwoFaceDetector {
        fn detect_faces(
            &self,
            pixels: &PixelBuffer,
            _orientation: Orientation,
        ) -> Result<Vec<FaceObservation>, DetectorError> {
            let delay = u64::from(pixels.data.get(1).copied().unwrap_or(0));
            std::thread::sleep(Duration::from_millis(delay));
            let base = f32::from(pixels.data[0]) / 100.0;
            let stranger = FaceObservation {
                bounding_box: BoundingBox {
                    x: base + 0.5,
                    y: 0.9,
                    width: 0.05,
                    height: 0.05,
                },
                yaw: None,
                roll: None,
            };
            Ok(vec![observation(base), stranger])
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect_faces(
            &self,
            _pixels: &PixelBuffer,
            _orientation: Orientation,
        ) -> Result<Vec<FaceObservation>, DetectorError> {
            Err(DetectorError::Failed("backend unavailable".into()))
        }
    }

    fn pipeline_with<D: FaceDetector + 'static>(
        detector: D,
        registry: Arc<IdentityRegistry>,
    ) -> RecognitionPipeline<PassThroughDecoder, D> {
        RecognitionPipeline::new(
            DetectionCoordinator::new(PassThroughDecoder, detector),
            registry,
            DEFAULT_MATCH_THRESHOLD,
        )
    }

    #[tokio::test]
    async fn test_process_pairs_faces_with_identities() {
        let registry = Arc::new(IdentityRegistry::new());
        // Enroll the exact features of the first detected face; the second
        // face is geometry-only, so its 4-component vector is skipped
        // against the 6-component template.
        registry
            .enroll("alice", extractor::extract(&observation(0.1)))
            .unwrap();

        let pipeline = pipeline_with(TwoFaceDetector, registry);
        match pipeline.process(vec![10, 0], Orientation::Up).await.unwrap() {
            RecognitionOutcome::Recognized(recognitions) => {
                assert_eq!(recognitions.len(), 2);
                let alice = recognitions[0].identity.as_ref().unwrap();
                assert_eq!(alice.name, "alice");
                assert!((alice.similarity - 1.0).abs() < 1e-6);
                assert!(recognitions[1].identity.is_none());
            }
            other => panic!("expected recognitions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_empty_registry_yields_unknowns() {
        let pipeline = pipeline_with(TwoFaceDetector, Arc::new(IdentityRegistry::new()));
        match pipeline.process(vec![10, 0], Orientation::Up).await.unwrap() {
            RecognitionOutcome::Recognized(recognitions) => {
                assert_eq!(recognitions.len(), 2);
                assert!(recognitions.iter().all(|r| r.identity.is_none()));
            }
            other => panic!("expected recognitions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_propagates_detector_failure() {
        let pipeline = pipeline_with(FailingDetector, Arc::new(IdentityRegistry::new()));
        let err = pipeline
            .process(vec![10, 0], Orientation::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, DetectError::Detector(_)));
    }

    #[tokio::test]
    async fn test_concurrent_process_last_wins() {
        let pipeline = Arc::new(pipeline_with(
            TwoFaceDetector,
            Arc::new(IdentityRegistry::new()),
        ));

        // First call's detector sleeps 150ms; the second supersedes it.
        let slow = pipeline.process(vec![10, 150], Orientation::Up);
        let fast = pipeline.process(vec![20, 10], Orientation::Up);
        let (slow_outcome, fast_outcome) = tokio::join!(slow, fast);

        assert!(matches!(
            slow_outcome.unwrap(),
            RecognitionOutcome::Superseded
        ));
        match fast_outcome.unwrap() {
            RecognitionOutcome::Recognized(recognitions) => {
                assert!((recognitions[0].face.bounding_box.x - 0.2).abs() < 1e-6);
            }
            other => panic!("expected recognitions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_all_sequential_batch() {
        let registry = Arc::new(IdentityRegistry::new());
        registry
            .enroll("alice", extractor::extract(&observation(0.1)))
            .unwrap();

        let pipeline = pipeline_with(TwoFaceDetector, registry);
        // Second image's face sits at x = 2.0, far enough from the enrolled
        // template that even this forgiving metric scores it below 0.8.
        match pipeline
            .process_all(vec![vec![10, 20], vec![200, 20]], Orientation::Up)
            .await
            .unwrap()
        {
            BatchOutcome::Recognized(batches) => {
                assert_eq!(batches.len(), 2);
                // First image carries the enrolled face, second does not.
                assert!(batches[0][0].identity.is_some());
                assert!(batches[1].iter().all(|r| r.identity.is_none()));
            }
            other => panic!("expected batch results, got {other:?}"),
        }
    }
}
