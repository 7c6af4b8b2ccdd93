//! Risk tier discretization of suspicion scores.
//!
//! The two thresholds below are shared between the per-image verdict and
//! the history bucket statistics; they must never diverge.

use serde::{Deserialize, Serialize};

use crate::types::Score;

/// Suspicion strictly below this is [`RiskTier::Low`].
pub const LOW_SUSPICION_MAX: Score = 0.3;

/// Suspicion at or above this is [`RiskTier::High`].
pub const HIGH_SUSPICION_MIN: Score = 0.7;

/// Discrete suspicion band for display and bucketed statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Mid,
    High,
}

impl RiskTier {
    /// Classify a suspicion score: `[0, 0.3)` low, `[0.3, 0.7)` mid,
    /// `[0.7, 1]` high.
    pub fn from_score(score: Score) -> Self {
        if score < LOW_SUSPICION_MAX {
            Self::Low
        } else if score < HIGH_SUSPICION_MIN {
            Self::Mid
        } else {
            Self::High
        }
    }

    /// Stable lowercase label, matching the persisted statistics keys.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
