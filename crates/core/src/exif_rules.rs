//! EXIF suspiciousness rules.
//!
//! The metadata reader (external) yields a flat tag map; this module turns
//! it into the metadata module's score. The rules are a fixed ladder: an
//! AI/generative service named in `Software` dominates, known photo
//! editors come next, and an EXIF block missing its core camera fields
//! raises a floor below both.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Score;

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

/// `Software` substrings that indicate an AI or generative pipeline.
pub const AI_SOFTWARE_KEYWORDS: &[&str] = &[
    "midjourney",
    "stable diffusion",
    "dall-e",
    "dalle",
    "ai generated",
    "ai image",
    "generative",
    "diffusion",
];

/// `Software` substrings that indicate a conventional photo editor.
pub const EDIT_SOFTWARE_KEYWORDS: &[&str] = &[
    "photoshop",
    "lightroom",
    "gimp",
    "paint.net",
    "affinity",
    "snapseed",
    "vsco",
    "pixlr",
    "fotor",
    "canva",
    "topaz",
    "skylum",
    "luminar",
    "photo editor",
];

// ---------------------------------------------------------------------------
// Rule scores
// ---------------------------------------------------------------------------

/// Score when `Software` names an AI/generative service.
pub const AI_SOFTWARE_SCORE: Score = 1.0;

/// Score when `Software` names a known photo editor.
pub const EDIT_SOFTWARE_SCORE: Score = 0.85;

/// Floor applied when core camera fields (Make/Model/DateTime) are
/// missing, unless an editor match already scored higher.
pub const INCOMPLETE_EXIF_SCORE: Score = 0.6;

/// Core camera fields whose absence is itself a signal.
const CORE_FIELDS: &[&str] = &["Make", "Model", "DateTime"];

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Outcome of the metadata rules for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifAssessment {
    /// Metadata suspicion in `[0,1]`; 0.0 means absent or typical EXIF.
    pub score: Score,
    /// The `Software` tag value, when present.
    pub software: Option<String>,
    /// Human-readable explanation; informational only.
    pub reason: String,
}

/// Evaluate the rules over an extracted EXIF tag map.
///
/// An empty map is neutral: the metadata module then reports 0.0 and does
/// not push the fused score in either direction.
pub fn assess_exif(fields: &HashMap<String, String>) -> ExifAssessment {
    if fields.is_empty() {
        return ExifAssessment {
            score: 0.0,
            software: None,
            reason: "EXIF is absent or empty; the metadata module does not affect the overall score."
                .to_string(),
        };
    }

    let software = fields
        .get("Software")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut score: Score = 0.0;
    let mut reasons: Vec<String> = Vec::new();

    if let Some(software) = &software {
        let lowered = software.to_lowercase();
        if AI_SOFTWARE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            score = score.max(AI_SOFTWARE_SCORE);
            reasons.push(
                "Software field mentions an AI/generative service (strong sign of synthesis)."
                    .to_string(),
            );
        } else if EDIT_SOFTWARE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            score = score.max(EDIT_SOFTWARE_SCORE);
            reasons.push("EXIF carries traces of a photo editor.".to_string());
        } else {
            reasons.push(
                "Software field is present but shows no sign of heavy editing.".to_string(),
            );
        }
    }

    let missing: Vec<&str> = CORE_FIELDS
        .iter()
        .copied()
        .filter(|field| {
            fields
                .get(*field)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .collect();

    if !missing.is_empty() {
        if score < EDIT_SOFTWARE_SCORE {
            score = score.max(INCOMPLETE_EXIF_SCORE);
        }
        reasons.push(format!(
            "EXIF is incomplete (missing fields: {}).",
            missing.join(", ")
        ));
    }

    if score == 0.0 && reasons.is_empty() {
        reasons.push("EXIF looks typical; no clear signs of editing found.".to_string());
    }

    ExifAssessment {
        score: score.clamp(0.0, 1.0),
        software,
        reason: reasons.join(" "),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn exif(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_camera_exif() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Make", "Canon"),
            ("Model", "EOS R5"),
            ("DateTime", "2026:01:15 10:30:00"),
        ]
    }

    #[test]
    fn empty_exif_is_neutral() {
        let a = assess_exif(&HashMap::new());
        assert_eq!(a.score, 0.0);
        assert_eq!(a.software, None);
    }

    #[test]
    fn ai_service_scores_maximum() {
        let mut pairs = complete_camera_exif();
        pairs.push(("Software", "Midjourney v6"));
        let a = assess_exif(&exif(&pairs));
        assert_eq!(a.score, AI_SOFTWARE_SCORE);
        assert_eq!(a.software.as_deref(), Some("Midjourney v6"));
    }

    #[test]
    fn photo_editor_scores_high() {
        let mut pairs = complete_camera_exif();
        pairs.push(("Software", "Adobe Photoshop 2026"));
        let a = assess_exif(&exif(&pairs));
        assert_eq!(a.score, EDIT_SOFTWARE_SCORE);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let mut pairs = complete_camera_exif();
        pairs.push(("Software", "STABLE DIFFUSION WebUI"));
        let a = assess_exif(&exif(&pairs));
        assert_eq!(a.score, AI_SOFTWARE_SCORE);
    }

    #[test]
    fn benign_software_with_complete_fields_stays_neutral() {
        let mut pairs = complete_camera_exif();
        pairs.push(("Software", "Canon firmware 1.8"));
        let a = assess_exif(&exif(&pairs));
        assert_eq!(a.score, 0.0);
        assert!(!a.reason.is_empty());
    }

    #[test]
    fn missing_core_fields_raise_floor() {
        let a = assess_exif(&exif(&[("Orientation", "1")]));
        assert_eq!(a.score, INCOMPLETE_EXIF_SCORE);
        assert!(a.reason.contains("Make, Model, DateTime"));
    }

    #[test]
    fn blank_core_field_counts_as_missing() {
        let a = assess_exif(&exif(&[
            ("Make", "Canon"),
            ("Model", "   "),
            ("DateTime", "2026:01:15 10:30:00"),
        ]));
        assert_eq!(a.score, INCOMPLETE_EXIF_SCORE);
        assert!(a.reason.contains("Model"));
        assert!(!a.reason.contains("Make,"));
    }

    #[test]
    fn editor_score_not_lowered_by_missing_fields() {
        let a = assess_exif(&exif(&[("Software", "GIMP 2.10")]));
        assert_eq!(a.score, EDIT_SOFTWARE_SCORE);
        assert!(a.reason.contains("incomplete"));
    }

    #[test]
    fn ai_score_unaffected_by_missing_fields() {
        let a = assess_exif(&exif(&[("Software", "DALL-E 3")]));
        assert_eq!(a.score, AI_SOFTWARE_SCORE);
    }
}
