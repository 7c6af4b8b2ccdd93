//! Fusion Engine: one calibrated suspicion score from four module signals.
//!
//! The default policy is a weighted mean over the modules that produced a
//! verdict. Absent modules are excluded from both numerator and
//! denominator, never imputed. When no module produced a verdict the
//! engine reports the neutral midpoint, a deliberate "unknown" sentinel
//! callers can distinguish by the all-absent module scores.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::heatmap::{self, GridSize};
use crate::matrix::Matrix;
use crate::normalize::ModuleResult;
use crate::risk::RiskTier;
use crate::types::Score;

// ---------------------------------------------------------------------------
// Policy constants
// ---------------------------------------------------------------------------

/// Fusion score reported when every module is absent.
pub const NEUTRAL_FUSION_SCORE: Score = 0.5;

/// Metadata suspicion above this engages the optional metadata boost.
pub const META_BOOST_THRESHOLD: Score = 0.75;

/// Largest fraction of the remaining headroom the metadata boost may add.
pub const META_MAX_BOOST: f64 = 0.25;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The four normalized module outputs for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleSet {
    pub ai: ModuleResult,
    pub manip: ModuleResult,
    pub patch: ModuleResult,
    pub meta: ModuleResult,
}

/// The four scalar module scores, each absent when the module did not run
/// or produced no verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleScores {
    pub ai: Option<Score>,
    pub manip: Option<Score>,
    pub patch: Option<Score>,
    pub meta: Option<Score>,
}

impl ModuleScores {
    /// True when no module produced a verdict (the sentinel state).
    pub fn all_absent(&self) -> bool {
        self.ai.is_none() && self.manip.is_none() && self.patch.is_none() && self.meta.is_none()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-module fusion weights. Equal weighting is the baseline policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub ai: f64,
    pub manip: f64,
    pub patch: f64,
    pub meta: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            ai: 1.0,
            manip: 1.0,
            patch: 1.0,
            meta: 1.0,
        }
    }
}

/// Fusion Engine configuration.
///
/// `metadata_boost` gates the threshold-based metadata escalation: when
/// enabled and the metadata score exceeds [`META_BOOST_THRESHOLD`], the
/// fused score is raised by a fraction of its remaining headroom. Disabled
/// by default, so the default policy is exactly the weighted mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub weights: FusionWeights,
    pub metadata_boost: bool,
    /// Output resolution of the combined heatmap.
    pub heatmap_grid: GridSize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            metadata_boost: false,
            heatmap_grid: GridSize::default(),
        }
    }
}

impl FusionConfig {
    /// Validate the configuration: weights must be finite and
    /// non-negative, the heatmap grid non-degenerate.
    pub fn validate(&self) -> Result<(), CoreError> {
        let named = [
            ("ai", self.weights.ai),
            ("manip", self.weights.manip),
            ("patch", self.weights.patch),
            ("meta", self.weights.meta),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CoreError::Validation(format!(
                    "fusion weight for '{name}' must be a non-negative finite number, got {weight}"
                )));
            }
        }
        if self.heatmap_grid.rows == 0 || self.heatmap_grid.cols == 0 {
            return Err(CoreError::Validation(format!(
                "heatmap grid must be non-empty, got {}x{}",
                self.heatmap_grid.rows, self.heatmap_grid.cols
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The combined verdict for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    /// Suspicion in `[0,1]`; 0 = fully credible, 1 = fully suspicious.
    pub fusion_score: Score,
    pub module_scores: ModuleScores,
    pub combined_heatmap: Option<Matrix>,
}

impl FusionResult {
    /// Derived credibility, `1 - fusion_score`.
    pub fn credibility(&self) -> Score {
        1.0 - self.fusion_score
    }

    /// Risk tier of the fused score.
    pub fn tier(&self) -> RiskTier {
        RiskTier::from_score(self.fusion_score)
    }
}

// ---------------------------------------------------------------------------
// Fusion policy
// ---------------------------------------------------------------------------

/// Fuse the four scalar scores under the given configuration.
///
/// Scores are assumed already validated to `[0,1]` by the normalizer.
/// Returns [`NEUTRAL_FUSION_SCORE`] when no module contributes, including
/// the case where every present module carries zero weight.
pub fn fuse_scores(scores: &ModuleScores, config: &FusionConfig) -> Score {
    let weighted = [
        (scores.ai, config.weights.ai),
        (scores.manip, config.weights.manip),
        (scores.patch, config.weights.patch),
        (scores.meta, config.weights.meta),
    ];

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (score, weight) in weighted {
        if let Some(score) = score {
            numerator += weight * score;
            denominator += weight;
        }
    }

    if denominator == 0.0 {
        return NEUTRAL_FUSION_SCORE;
    }

    let mut fused = numerator / denominator;

    if config.metadata_boost {
        if let Some(meta) = scores.meta {
            fused = apply_metadata_boost(fused, meta);
        }
    }

    fused
}

/// Escalate a fused score when the metadata signal is strongly suspicious.
///
/// For metadata suspicion `m` above [`META_BOOST_THRESHOLD`], adds
/// `boost * (1 - s)` where `boost` scales linearly from 0 at the threshold
/// to [`META_MAX_BOOST`] at `m = 1`. At or below the threshold the score
/// is returned unchanged.
fn apply_metadata_boost(fused: Score, meta: Score) -> Score {
    if meta <= META_BOOST_THRESHOLD {
        return fused;
    }
    let over = (meta - META_BOOST_THRESHOLD) / (1.0 - META_BOOST_THRESHOLD);
    let boost = META_MAX_BOOST * over.clamp(0.0, 1.0);
    fused + boost * (1.0 - fused)
}

/// Fuse a full module set: scalar fusion plus the combined heatmap.
///
/// The combined heatmap blends the `ai`, `manip`, and derived `patch`
/// maps; the metadata module never contributes spatial data. When no
/// source map exists the combined heatmap is absent, never a synthesized
/// all-zero grid.
pub fn fuse(modules: &ModuleSet, config: &FusionConfig) -> FusionResult {
    let module_scores = ModuleScores {
        ai: modules.ai.score,
        manip: modules.manip.score,
        patch: modules.patch.score,
        meta: modules.meta.score,
    };

    let sources: Vec<&Matrix> = [&modules.ai, &modules.manip, &modules.patch]
        .into_iter()
        .filter_map(|module| module.heatmap.as_ref())
        .collect();

    FusionResult {
        fusion_score: fuse_scores(&module_scores, config),
        module_scores,
        combined_heatmap: heatmap::composite(&sources, config.heatmap_grid),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
