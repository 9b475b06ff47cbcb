//! Tracing limits and their optional file override.
//!
//! The candidate search in `VectorGlyph::combine_edges` is bounded by two
//! heuristic safety valves. They are configuration, not constants, so that
//! boundary behavior can be tuned and tested deterministically.

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Limits applied while enumerating collapse candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Maximum number of vertices in a candidate path.
    pub max_path_len: usize,
    /// Soft cap on the total number of candidates collected per pass.
    /// Exceeding it abandons further expansion but keeps what was found.
    pub max_candidates: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            max_path_len: 16,
            max_candidates: 100_000,
        }
    }
}

impl TraceConfig {
    /// Loads the config from the JSON file named by `FONTSCALE_CONFIG`,
    /// falling back to defaults when unset or unreadable.
    pub fn load() -> Self {
        let Ok(path) = std::env::var("FONTSCALE_CONFIG") else {
            return TraceConfig::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring unparsable config {}: {}", path, e);
                    TraceConfig::default()
                }
            },
            Err(e) => {
                warn!("ignoring unreadable config {}: {}", path, e);
                TraceConfig::default()
            }
        }
    }
}

/// Process-wide trace limits, resolved once on first use.
pub static CONFIG: Lazy<TraceConfig> = Lazy::new(TraceConfig::load);
