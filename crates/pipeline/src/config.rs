//! Pipeline configuration loaded from environment variables.

use trustlens_core::fusion::{FusionConfig, FusionWeights};
use trustlens_core::heatmap::{GridSize, DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS};

/// Pipeline configuration.
///
/// All fields have defaults suitable for local development; in production,
/// override via environment variables.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub fusion: FusionConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `FUSION_WEIGHT_AI`    | `1.0`   |
    /// | `FUSION_WEIGHT_MANIP` | `1.0`   |
    /// | `FUSION_WEIGHT_PATCH` | `1.0`   |
    /// | `FUSION_WEIGHT_META`  | `1.0`   |
    /// | `FUSION_META_BOOST`   | `false` |
    /// | `HEATMAP_GRID_ROWS`   | `256`   |
    /// | `HEATMAP_GRID_COLS`   | `256`   |
    pub fn from_env() -> Self {
        let weights = FusionWeights {
            ai: env_f64("FUSION_WEIGHT_AI", 1.0),
            manip: env_f64("FUSION_WEIGHT_MANIP", 1.0),
            patch: env_f64("FUSION_WEIGHT_PATCH", 1.0),
            meta: env_f64("FUSION_WEIGHT_META", 1.0),
        };

        let metadata_boost = std::env::var("FUSION_META_BOOST")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let heatmap_grid = GridSize {
            rows: env_usize("HEATMAP_GRID_ROWS", DEFAULT_GRID_ROWS),
            cols: env_usize("HEATMAP_GRID_COLS", DEFAULT_GRID_COLS),
        };

        Self {
            fusion: FusionConfig {
                weights,
                metadata_boost,
                heatmap_grid,
            },
        }
    }
}

fn env_f64(name: &str, default: f64) -> f64 {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid float")),
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid integer")),
        Err(_) => default,
    }
}
