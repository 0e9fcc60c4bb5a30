use mien_core::DEFAULT_MATCH_THRESHOLD;

/// Resolved CLI configuration. A flag takes precedence over the matching
/// `MIEN_*` environment variable, which falls back to the built-in default.
pub struct Config {
    /// Similarity threshold for a positive match.
    pub threshold: f32,
}

impl Config {
    pub fn resolve(threshold_flag: Option<f32>) -> Self {
        Self {
            threshold: threshold_flag
                .unwrap_or_else(|| env_f32("MIEN_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
