//! Detection request coordination.
//!
//! Owns the single-in-flight-request policy: every [`detect`] call issues a
//! new generation token synchronously, and a completion is delivered only if
//! its token is still the latest when the detector finishes. Completions for
//! superseded requests are discarded: they produce no result at all, which
//! is distinct from failing.
//!
//! [`detect`]: DetectionCoordinator::detect

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::decode::{DecodeError, ImageDecoder};
use crate::detector::{DetectorError, FaceDetector};
use crate::types::{FaceObservation, Orientation};

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("image decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
}

/// Final disposition of one detection request.
#[derive(Debug)]
pub enum DetectionOutcome {
    /// The request was still current at completion. Zero faces is a valid
    /// outcome.
    Faces(Vec<FaceObservation>),
    /// Decode or detector failure, delivered through the same channel as
    /// success and subject to the same supersede check.
    Failed(DetectError),
    /// A newer request was issued before this one finished; its result was
    /// discarded and no completion exists.
    Superseded,
}

/// Pending result handle returned by [`DetectionCoordinator::detect`].
pub struct DetectionTicket {
    token: u64,
    rx: oneshot::Receiver<Result<Vec<FaceObservation>, DetectError>>,
}

impl DetectionTicket {
    /// Generation token issued for this request.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Wait for this request's disposition. Resolves exactly once, on the
    /// awaiting caller's context.
    pub async fn outcome(self) -> DetectionOutcome {
        match self.rx.await {
            Ok(Ok(faces)) => DetectionOutcome::Faces(faces),
            Ok(Err(err)) => DetectionOutcome::Failed(err),
            // Sender dropped: the coordinator discarded a stale completion.
            Err(_) => DetectionOutcome::Superseded,
        }
    }
}

/// Generation bookkeeping. The bump in `detect()` and the compare-and-send
/// at completion hold this same mutex, so a stale completion can never
/// observe its own token as current.
#[derive(Default)]
struct Generation {
    next: u64,
    current: u64,
}

/// Coordinates detection requests against the decode and detector
/// capabilities, enforcing last-request-wins delivery.
pub struct DetectionCoordinator<C, D> {
    decoder: Arc<C>,
    detector: Arc<D>,
    generation: Arc<Mutex<Generation>>,
}

impl<C, D> DetectionCoordinator<C, D>
where
    C: ImageDecoder + 'static,
    D: FaceDetector + 'static,
{
    pub fn new(decoder: C, detector: D) -> Self {
        Self {
            decoder: Arc::new(decoder),
            detector: Arc::new(detector),
            generation: Arc::new(Mutex::new(Generation::default())),
        }
    }

    /// Issue a detection request for one encoded image.
    ///
    /// Returns immediately: decode and detection run on the blocking pool,
    /// never on the caller's context. Issuing a new request supersedes any
    /// outstanding one; the older ticket resolves to
    /// [`DetectionOutcome::Superseded`] and its detector result is dropped.
    /// There is no explicit cancel; calling `detect` again is the
    /// cancellation mechanism.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn detect(&self, image: Vec<u8>, orientation: Orientation) -> DetectionTicket {
        let token = {
            let mut gen = self.generation.lock().expect("generation lock poisoned");
            let token = gen.next;
            gen.next += 1;
            gen.current = token;
            token
        };
        tracing::debug!(token, bytes = image.len(), "detection request issued");

        let (tx, rx) = oneshot::channel();
        let decoder = Arc::clone(&self.decoder);
        let detector = Arc::clone(&self.detector);
        let generation = Arc::clone(&self.generation);

        tokio::spawn(async move {
            let work = tokio::task::spawn_blocking(move || {
                let pixels = decoder.decode(&image)?;
                detector
                    .detect_faces(&pixels, orientation)
                    .map_err(DetectError::from)
            });

            let result = match work.await {
                Ok(result) => result,
                Err(join_err) => Err(DetectError::Detector(DetectorError::Failed(format!(
                    "detection task panicked: {join_err}"
                )))),
            };

            // Compare and send while holding the generation lock: a detect()
            // call bumping the token concurrently cannot interleave between
            // the staleness check and the delivery.
            let gen = generation.lock().expect("generation lock poisoned");
            if gen.current == token {
                if tx.send(result).is_err() {
                    tracing::debug!(token, "detection caller dropped its ticket");
                }
            } else {
                tracing::debug!(
                    token,
                    current = gen.current,
                    "stale detection completion discarded"
                );
            }
        });

        DetectionTicket { token, rx }
    }
}
