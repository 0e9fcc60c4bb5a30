use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mien_core::{
    extractor, DetectionCoordinator, IdentityRegistry, ImageDecoder, Orientation,
    RecognitionOutcome, RecognitionPipeline, StdImageDecoder,
};

mod config;
mod sidecar;

use sidecar::SidecarDetector;

#[derive(Parser)]
#[command(name = "mien", about = "Mien face recognition CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll faces, then identify every face in the probe images
    Identify {
        /// NAME=IMAGE pair to enroll before identification (repeatable)
        #[arg(short, long = "enroll", value_name = "NAME=IMAGE")]
        enroll: Vec<String>,
        /// Similarity threshold for a positive match
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Print the registry listing after enrollment
        #[arg(long)]
        list: bool,
        /// Images to identify
        #[arg(required = true)]
        probes: Vec<PathBuf>,
    },
    /// Print the feature vectors for every recorded face in an image
    Features { image: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Identify {
            enroll,
            threshold,
            list,
            probes,
        } => run_identify(enroll, threshold, list, probes).await,
        Commands::Features { image } => run_features(image),
    }
}

async fn run_identify(
    enroll: Vec<String>,
    threshold: Option<f32>,
    list: bool,
    probes: Vec<PathBuf>,
) -> Result<()> {
    let config = config::Config::resolve(threshold);
    let registry = Arc::new(IdentityRegistry::new());
    let detector = SidecarDetector::default();
    let pipeline = RecognitionPipeline::new(
        DetectionCoordinator::new(StdImageDecoder, detector.clone()),
        Arc::clone(&registry),
        config.threshold,
    );

    for pair in &enroll {
        let (name, image) = split_enroll_pair(pair)?;
        enroll_from_image(&registry, name, &image)?;
    }

    if list {
        println!("{}", serde_json::to_string_pretty(&registry.list())?);
    }

    for probe in &probes {
        let image = std::fs::read(probe)
            .with_context(|| format!("reading image {}", probe.display()))?;
        detector.arm(sidecar::load(probe)?);

        match pipeline.process(image, Orientation::Up).await? {
            RecognitionOutcome::Recognized(recognitions) => {
                let report = serde_json::json!({
                    "image": probe,
                    "faces": recognitions,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            RecognitionOutcome::Superseded => {
                // Not reachable for this sequential caller, but the outcome
                // must still be handled.
                tracing::warn!(image = %probe.display(), "request superseded");
            }
        }
    }

    Ok(())
}

fn run_features(image: PathBuf) -> Result<()> {
    let bytes =
        std::fs::read(&image).with_context(|| format!("reading image {}", image.display()))?;
    let pixels = StdImageDecoder.decode(&bytes)?;
    let observations = sidecar::load(&image)?;
    tracing::info!(
        width = pixels.width,
        height = pixels.height,
        faces = observations.len(),
        "image decoded"
    );

    let report: Vec<_> = observations
        .iter()
        .map(|face| {
            serde_json::json!({
                "face": face,
                "features": extractor::extract(face),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn enroll_from_image(registry: &IdentityRegistry, name: &str, image: &Path) -> Result<()> {
    let bytes =
        std::fs::read(image).with_context(|| format!("reading image {}", image.display()))?;
    let pixels = StdImageDecoder.decode(&bytes)?;
    let observations = sidecar::load(image)?;

    let Some(face) = observations.first() else {
        tracing::warn!(name, image = %image.display(), "no recorded face; skipping enrollment");
        return Ok(());
    };

    let template_id = registry.enroll(name, extractor::extract(face))?;
    tracing::info!(
        name,
        template_id = %template_id,
        width = pixels.width,
        height = pixels.height,
        "enrolled"
    );
    Ok(())
}

fn split_enroll_pair(pair: &str) -> Result<(&str, PathBuf)> {
    match pair.split_once('=') {
        Some((name, image)) if !image.is_empty() => Ok((name, PathBuf::from(image))),
        _ => bail!("expected NAME=IMAGE, got {pair:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_enroll_pair() {
        let (name, image) = split_enroll_pair("alice=photos/alice.jpg").unwrap();
        assert_eq!(name, "alice");
        assert_eq!(image, PathBuf::from("photos/alice.jpg"));
    }

    #[test]
    fn test_split_enroll_pair_rejects_missing_image() {
        assert!(split_enroll_pair("alice").is_err());
        assert!(split_enroll_pair("alice=").is_err());
    }
}
