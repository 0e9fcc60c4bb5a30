//! Fixture-backed face detector for offline use.
//!
//! The detection algorithm is not part of this tool: faces are read from a
//! JSON sidecar recorded next to each image (`IMAGE.faces.json`). The
//! detector is armed with the sidecar contents before each request; a real
//! deployment plugs an actual detector into the pipeline instead.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use mien_core::{DetectorError, FaceDetector, FaceObservation, Orientation, PixelBuffer};

/// Path of the sidecar that records faces for `image`.
pub fn sidecar_path(image: &Path) -> PathBuf {
    let mut os = image.as_os_str().to_owned();
    os.push(".faces.json");
    PathBuf::from(os)
}

/// Load the recorded observations for an image.
pub fn load(image: &Path) -> Result<Vec<FaceObservation>> {
    let path = sidecar_path(image);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading face sidecar {}", path.display()))?;
    parse(&json).with_context(|| format!("parsing face sidecar {}", path.display()))
}

fn parse(json: &str) -> Result<Vec<FaceObservation>> {
    Ok(serde_json::from_str(json)?)
}

/// Detector capability that replays pre-recorded observations.
#[derive(Clone, Default)]
pub struct SidecarDetector {
    queued: Arc<Mutex<Vec<FaceObservation>>>,
}

impl SidecarDetector {
    /// Queue the observations the next detection should report.
    pub fn arm(&self, faces: Vec<FaceObservation>) {
        *self.queued.lock().expect("sidecar queue poisoned") = faces;
    }
}

impl FaceDetector for SidecarDetector {
    fn detect_faces(
        &self,
        _pixels: &PixelBuffer,
        _orientation: Orientation,
    ) -> Result<Vec<FaceObservation>, DetectorError> {
        Ok(self.queued.lock().expect("sidecar queue poisoned").clone())
    }
}
