//! Score Normalizer: loose detector output into a typed [`ModuleResult`].
//!
//! Detection modules are external collaborators returning loosely shaped
//! JSON (`{"score": .., "heatmap": ..}`). This module validates each field
//! explicitly: anything that is not a finite in-range score or a
//! well-formed grid becomes absent, never a hard error, so the analysis
//! pipeline stays total.

use serde::Serialize;
use serde_json::Value;

use crate::matrix::Matrix;
use crate::types::Score;

/// Canonical, validated output of one detection module.
///
/// `software_tag` and `reason` are only populated for the metadata module
/// and are informational; they never participate in scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleResult {
    pub score: Option<Score>,
    pub heatmap: Option<Matrix>,
    pub software_tag: Option<String>,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// Validate a raw score value.
///
/// Accepts only finite numbers inside `[0.0, 1.0]`. Out-of-range values
/// are discarded rather than clamped: a detector emitting 1.3 has a bug
/// upstream, and clamping would hide it.
pub fn normalize_score(raw: &Value) -> Option<Score> {
    let score = raw.as_f64()?;
    if !score.is_finite() {
        return None;
    }
    if !(0.0..=1.0).contains(&score) {
        return None;
    }
    Some(score)
}

/// Validate a raw heatmap value.
///
/// Accepts a non-empty rectangular 2D numeric array. A flat 1D numeric
/// array is coerced into a single-row matrix. Ragged, empty, or
/// non-numeric inputs normalize to `None`.
pub fn normalize_heatmap(raw: &Value) -> Option<Matrix> {
    let outer = raw.as_array()?;
    if outer.is_empty() {
        return None;
    }

    if outer.iter().all(|v| v.is_array()) {
        let mut rows = Vec::with_capacity(outer.len());
        for row_value in outer {
            rows.push(numeric_row(row_value)?);
        }
        return Matrix::from_rows(rows);
    }

    // Flat vector shape: interpret as a single row.
    Matrix::from_flat(numeric_row(raw)?)
}

fn numeric_row(raw: &Value) -> Option<Vec<f64>> {
    let cells = raw.as_array()?;
    let mut row = Vec::with_capacity(cells.len());
    for cell in cells {
        let value = cell.as_f64()?;
        if !value.is_finite() {
            return None;
        }
        row.push(value);
    }
    Some(row)
}

// ---------------------------------------------------------------------------
// Module output normalization
// ---------------------------------------------------------------------------

/// Normalize a full raw module payload of unknown shape.
///
/// Recognized fields: `score`, `heatmap`, `software`, `reason`. A payload
/// that is not an object yields an all-absent result.
pub fn normalize_module_output(raw: &Value) -> ModuleResult {
    let Some(obj) = raw.as_object() else {
        return ModuleResult::default();
    };

    ModuleResult {
        score: obj.get("score").and_then(normalize_score),
        heatmap: obj.get("heatmap").and_then(normalize_heatmap),
        software_tag: obj
            .get("software")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        reason: obj
            .get("reason")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

/// Derive the patch module from the manipulation module.
///
/// The patch scalar is the mean activation of the manipulation heatmap;
/// its heatmap is the manipulation heatmap itself. The derived mean goes
/// through the same acceptance rule as any other score, so a heatmap whose
/// mean falls outside `[0,1]` yields a heatmap-only patch result.
pub fn derive_patch(manip: &ModuleResult) -> ModuleResult {
    let Some(heatmap) = &manip.heatmap else {
        return ModuleResult::default();
    };

    let mean = heatmap.mean();
    let score = if mean.is_finite() && (0.0..=1.0).contains(&mean) {
        Some(mean)
    } else {
        None
    };

    ModuleResult {
        score,
        heatmap: Some(heatmap.clone()),
        software_tag: None,
        reason: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
