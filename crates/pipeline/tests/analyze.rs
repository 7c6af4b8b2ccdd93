//! Integration tests for the full analysis pipeline with stub
//! collaborators: detectors and the EXIF reader are replaced by canned
//! payloads so the normalization → fusion → compositing path is exercised
//! end to end without any ML backend.

use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;

use trustlens_core::fusion::NEUTRAL_FUSION_SCORE;
use trustlens_core::history;
use trustlens_core::risk::RiskTier;
use trustlens_pipeline::{
    AnalysisReport, CollaboratorError, Detector, ExifReader, ImageAnalyzer, PipelineConfig,
};

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

struct StaticDetector {
    name: &'static str,
    payload: serde_json::Value,
}

#[async_trait]
impl Detector for StaticDetector {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn infer(&self, _image: &[u8]) -> Result<serde_json::Value, CollaboratorError> {
        Ok(self.payload.clone())
    }
}

struct FailingDetector(&'static str);

#[async_trait]
impl Detector for FailingDetector {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn infer(&self, _image: &[u8]) -> Result<serde_json::Value, CollaboratorError> {
        Err(CollaboratorError::Inference("backend unavailable".into()))
    }
}

struct StaticExif(HashMap<String, String>);

#[async_trait]
impl ExifReader for StaticExif {
    async fn read_exif(
        &self,
        _image: &[u8],
    ) -> Result<HashMap<String, String>, CollaboratorError> {
        Ok(self.0.clone())
    }
}

struct FailingExif;

#[async_trait]
impl ExifReader for FailingExif {
    async fn read_exif(
        &self,
        _image: &[u8],
    ) -> Result<HashMap<String, String>, CollaboratorError> {
        Err(CollaboratorError::Metadata("no EXIF segment".into()))
    }
}

fn analyzer(
    ai: serde_json::Value,
    manip: serde_json::Value,
    exif: HashMap<String, String>,
) -> ImageAnalyzer {
    ImageAnalyzer::new(
        Arc::new(StaticDetector { name: "ai", payload: ai }),
        Arc::new(StaticDetector {
            name: "manip",
            payload: manip,
        }),
        Arc::new(StaticExif(exif)),
        PipelineConfig::default(),
    )
    .unwrap()
}

async fn run(analyzer: &ImageAnalyzer) -> AnalysisReport {
    analyzer.analyze("upload.jpg", b"not-a-real-image").await
}

// ---------------------------------------------------------------------------
// Test: full pipeline with every module present
// ---------------------------------------------------------------------------

/// AI 0.9, manip 0.1 with a uniform 0.2 heatmap (so the derived patch
/// module scores 0.2), empty EXIF (meta 0.0): the equal-weight mean is
/// exactly 0.3, which sits on the mid-tier boundary.
#[tokio::test]
async fn full_pipeline_fuses_all_modules() {
    let analyzer = analyzer(
        json!({ "score": 0.9, "heatmap": [[0.5, 0.5], [0.5, 0.5]] }),
        json!({ "score": 0.1, "heatmap": [[0.2, 0.2], [0.2, 0.2]] }),
        HashMap::new(),
    );
    let report = run(&analyzer).await;

    assert_eq!(report.fusion.module_scores.ai, Some(0.9));
    assert_eq!(report.fusion.module_scores.manip, Some(0.1));
    assert_eq!(report.fusion.module_scores.patch, Some(0.2));
    assert_eq!(report.fusion.module_scores.meta, Some(0.0));
    assert!((report.fusion.fusion_score - 0.3).abs() < 1e-12);
    assert_eq!(report.tier, RiskTier::Mid);

    let combined = report.fusion.combined_heatmap.as_ref().unwrap();
    assert_eq!(combined.height(), 256);
    assert_eq!(combined.width(), 256);
}

// ---------------------------------------------------------------------------
// Test: a failed detector downgrades to an absent module
// ---------------------------------------------------------------------------

/// The AI backend failing must not change the fusion of the remaining
/// modules: with manip absent too (no heatmap → no patch), only meta
/// contributes.
#[tokio::test]
async fn failed_detector_is_excluded_not_fatal() {
    let analyzer = ImageAnalyzer::new(
        Arc::new(FailingDetector("ai")),
        Arc::new(StaticDetector {
            name: "manip",
            payload: json!({ "score": 0.6 }),
        }),
        Arc::new(StaticExif(HashMap::new())),
        PipelineConfig::default(),
    )
    .unwrap();
    let report = run(&analyzer).await;

    assert_eq!(report.fusion.module_scores.ai, None);
    assert_eq!(report.fusion.module_scores.manip, Some(0.6));
    assert_eq!(report.fusion.module_scores.patch, None);
    // Mean of manip 0.6 and meta 0.0.
    assert!((report.fusion.fusion_score - 0.3).abs() < 1e-12);
    assert_eq!(report.fusion.combined_heatmap, None);
}

// ---------------------------------------------------------------------------
// Test: every collaborator failing yields the neutral sentinel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_collaborators_failing_yields_neutral_sentinel() {
    let analyzer = ImageAnalyzer::new(
        Arc::new(FailingDetector("ai")),
        Arc::new(FailingDetector("manip")),
        Arc::new(FailingExif),
        PipelineConfig::default(),
    )
    .unwrap();
    let report = run(&analyzer).await;

    assert!(report.fusion.module_scores.all_absent());
    assert_eq!(report.fusion.fusion_score, NEUTRAL_FUSION_SCORE);
    assert_eq!(report.fusion.combined_heatmap, None);
    assert_eq!(report.summary, "fusion=0.5");
}

// ---------------------------------------------------------------------------
// Test: malformed detector payloads are normalized, not propagated
// ---------------------------------------------------------------------------

/// An out-of-range score and a ragged heatmap are data errors from
/// upstream; both fields drop to absent while the rest of the analysis
/// proceeds.
#[tokio::test]
async fn malformed_payload_fields_drop_to_absent() {
    let analyzer = analyzer(
        json!({ "score": 1.7, "heatmap": [[0.1, 0.2], [0.3]] }),
        json!({ "score": 0.4 }),
        HashMap::new(),
    );
    let report = run(&analyzer).await;

    assert_eq!(report.fusion.module_scores.ai, None);
    assert_eq!(report.fusion.module_scores.manip, Some(0.4));
    assert_eq!(report.fusion.combined_heatmap, None);
}

// ---------------------------------------------------------------------------
// Test: EXIF editor traces flow into the meta module
// ---------------------------------------------------------------------------

#[tokio::test]
async fn exif_editor_trace_scores_meta_module() {
    let exif: HashMap<String, String> = [
        ("Software".to_string(), "Adobe Photoshop 2026".to_string()),
        ("Make".to_string(), "Canon".to_string()),
        ("Model".to_string(), "EOS R5".to_string()),
        ("DateTime".to_string(), "2026:01:15 10:30:00".to_string()),
    ]
    .into_iter()
    .collect();

    let analyzer = analyzer(
        json!({ "score": 0.05 }),
        json!({ "score": 0.05 }),
        exif,
    );
    let report = run(&analyzer).await;

    assert_eq!(report.fusion.module_scores.meta, Some(0.85));
    let summary = &report.summary;
    assert!(summary.contains("meta=0.85"), "summary was: {summary}");
}

// ---------------------------------------------------------------------------
// Test: report enrichment and the history round trip
// ---------------------------------------------------------------------------

/// The report carries the byte size and content hash, its summary parses
/// back to the same scores, and the derived history record aggregates.
#[tokio::test]
async fn report_round_trips_through_history() {
    let analyzer = analyzer(
        json!({ "score": 0.9 }),
        json!({ "score": 0.1 }),
        HashMap::new(),
    );
    let report = run(&analyzer).await;

    assert_eq!(report.file_size_bytes, b"not-a-real-image".len() as i64);
    assert_eq!(report.content_sha256.len(), 64);
    assert_eq!(report.width, None);
    assert_eq!(report.mime_type, None);

    let created_at = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
    let record = report.to_record(1, Some(42), created_at);
    let stats = history::aggregate(std::slice::from_ref(&record)).unwrap();

    assert_eq!(stats.total, 1);
    assert_eq!(stats.averages.ai.mean, report.fusion.module_scores.ai);
    assert_eq!(
        stats.averages.fusion.mean,
        Some(report.fusion.fusion_score)
    );
    assert_matches!(stats.top_suspicious.as_slice(), [entry] if entry.id == 1);
}

// ---------------------------------------------------------------------------
// Test: invalid configuration is rejected at construction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn negative_weight_rejected_at_construction() {
    let mut config = PipelineConfig::default();
    config.fusion.weights.ai = -1.0;

    let result = ImageAnalyzer::new(
        Arc::new(FailingDetector("ai")),
        Arc::new(FailingDetector("manip")),
        Arc::new(FailingExif),
        config,
    );
    assert!(result.is_err());
}
