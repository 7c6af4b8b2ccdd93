//! Compact score-summary serialization shared with the persistence layer.
//!
//! The persisted form of one analysis is a single line,
//! `"AI=<v>, manip=<v>, patch=<v>, meta=<v>, fusion=<v>"`, with `.` as the
//! decimal separator and absent scores omitted entirely (never written as
//! `"null"`). The format is a bit-exact contract with the persistence
//! collaborator; parsing is deliberately lenient so aggregation survives
//! mixed-quality historical data.

use serde::Serialize;

use crate::fusion::FusionResult;
use crate::types::Score;

/// Pair separator written between fields.
const PAIR_SEPARATOR: &str = ", ";

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Serialize a fusion result's scalar scores into the summary line.
///
/// Values use Rust's shortest round-trip float formatting, so
/// `parse_summary(&format_summary(r))` reproduces the scores exactly.
/// Heatmaps are never persisted in history.
pub fn format_summary(result: &FusionResult) -> String {
    let scores = &result.module_scores;
    let mut parts: Vec<String> = Vec::with_capacity(5);

    if let Some(v) = scores.ai {
        parts.push(format!("AI={v}"));
    }
    if let Some(v) = scores.manip {
        parts.push(format!("manip={v}"));
    }
    if let Some(v) = scores.patch {
        parts.push(format!("patch={v}"));
    }
    if let Some(v) = scores.meta {
        parts.push(format!("meta={v}"));
    }
    parts.push(format!("fusion={}", result.fusion_score));

    parts.join(PAIR_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Scores recovered from one summary line. Every field is optional; a
/// fully unparseable line yields the all-absent value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParsedSummary {
    pub ai: Option<Score>,
    pub manip: Option<Score>,
    pub patch: Option<Score>,
    pub meta: Option<Score>,
    pub fusion: Option<Score>,
}

impl ParsedSummary {
    /// True when no field parsed.
    pub fn is_empty(&self) -> bool {
        self.ai.is_none()
            && self.manip.is_none()
            && self.patch.is_none()
            && self.meta.is_none()
            && self.fusion.is_none()
    }
}

/// Parse a summary line into its recognized fields.
///
/// Pairs are split on the written `", "` separator, keys map
/// case-sensitively (`AI`, `manip`, `patch`, `meta`, `fusion`), unknown
/// keys are ignored, and a value that fails numeric parsing — including
/// locale variants with `,` as the decimal separator — is dropped for that
/// key only. The rest of the line is still used.
pub fn parse_summary(summary: &str) -> ParsedSummary {
    let mut parsed = ParsedSummary::default();

    for part in summary.split(PAIR_SEPARATOR) {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }

        let Ok(number) = value.parse::<f64>() else {
            continue;
        };
        if !number.is_finite() {
            continue;
        }

        match key {
            "AI" => parsed.ai = Some(number),
            "manip" => parsed.manip = Some(number),
            "patch" => parsed.patch = Some(number),
            "meta" => parsed.meta = Some(number),
            "fusion" => parsed.fusion = Some(number),
            _ => {}
        }
    }

    parsed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
