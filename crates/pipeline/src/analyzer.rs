//! Full-image analysis orchestration.
//!
//! Drives both detectors concurrently, normalizes their raw output,
//! derives the patch module, scores the EXIF tags, fuses, and composites.
//! The pipeline is total: a collaborator failure downgrades its module to
//! absent and the report is still produced.

use std::io::Cursor;
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use trustlens_core::error::CoreError;
use trustlens_core::exif_rules::assess_exif;
use trustlens_core::fusion::{fuse, FusionResult, ModuleSet};
use trustlens_core::history::HistoryRecord;
use trustlens_core::normalize::{derive_patch, normalize_module_output, ModuleResult};
use trustlens_core::risk::RiskTier;
use trustlens_core::summary::format_summary;
use trustlens_core::types::{DbId, Timestamp};

use crate::config::PipelineConfig;
use crate::detector::{Detector, ExifReader};

/// Everything the UI and persistence layers need about one analyzed image.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Correlation id for logs and tracing; not a persistence key.
    pub analysis_id: Uuid,
    pub filename: String,
    pub file_size_bytes: i64,
    /// Derived from the image header, absent for unrecognized formats.
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Hex SHA-256 of the analyzed bytes.
    pub content_sha256: String,
    pub fusion: FusionResult,
    pub tier: RiskTier,
    /// The persisted summary line for this analysis.
    pub summary: String,
}

impl AnalysisReport {
    /// Build the history record the persistence collaborator stores for
    /// this analysis. Heatmaps are deliberately left out of history.
    pub fn to_record(&self, id: DbId, user_id: Option<DbId>, created_at: Timestamp) -> HistoryRecord {
        HistoryRecord {
            id,
            user_id,
            created_at,
            filename: self.filename.clone(),
            file_size_bytes: Some(self.file_size_bytes),
            mime_type: self.mime_type.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// Orchestrates one analysis per call; holds no per-image state, so a
/// single instance serves concurrent requests.
pub struct ImageAnalyzer {
    ai: Arc<dyn Detector>,
    manip: Arc<dyn Detector>,
    exif: Arc<dyn ExifReader>,
    config: PipelineConfig,
}

impl ImageAnalyzer {
    /// Build an analyzer over the given collaborators.
    ///
    /// Fails only on an invalid fusion configuration; everything at
    /// analysis time is non-fatal.
    pub fn new(
        ai: Arc<dyn Detector>,
        manip: Arc<dyn Detector>,
        exif: Arc<dyn ExifReader>,
        config: PipelineConfig,
    ) -> Result<Self, CoreError> {
        config.fusion.validate()?;
        Ok(Self {
            ai,
            manip,
            exif,
            config,
        })
    }

    /// Analyze one image and produce the full report.
    pub async fn analyze(&self, filename: &str, image: &[u8]) -> AnalysisReport {
        let analysis_id = Uuid::now_v7();

        let (ai_raw, manip_raw, exif_raw) = tokio::join!(
            self.ai.infer(image),
            self.manip.infer(image),
            self.exif.read_exif(image),
        );

        let ai = self.normalized(self.ai.name(), ai_raw);
        let manip = self.normalized(self.manip.name(), manip_raw);
        let patch = derive_patch(&manip);

        let meta = match exif_raw {
            Ok(fields) => {
                let assessment = assess_exif(&fields);
                debug!(
                    score = assessment.score,
                    software = assessment.software.as_deref().unwrap_or(""),
                    "metadata rules evaluated"
                );
                ModuleResult {
                    score: Some(assessment.score),
                    heatmap: None,
                    software_tag: assessment.software,
                    reason: Some(assessment.reason),
                }
            }
            Err(error) => {
                warn!(module = "meta", %error, "EXIF reader failed; module treated as absent");
                ModuleResult::default()
            }
        };

        let modules = ModuleSet {
            ai,
            manip,
            patch,
            meta,
        };
        let fusion = fuse(&modules, &self.config.fusion);
        let tier = fusion.tier();
        let summary = format_summary(&fusion);

        let (width, height, mime_type) = probe_image_header(image);

        info!(
            %analysis_id,
            filename,
            fusion_score = fusion.fusion_score,
            tier = tier.label(),
            "image analysis complete"
        );

        AnalysisReport {
            analysis_id,
            filename: filename.to_string(),
            file_size_bytes: image.len() as i64,
            mime_type,
            width,
            height,
            content_sha256: sha256_hex(image),
            fusion,
            tier,
            summary,
        }
    }

    fn normalized(
        &self,
        module: &'static str,
        raw: Result<serde_json::Value, crate::detector::CollaboratorError>,
    ) -> ModuleResult {
        match raw {
            Ok(value) => {
                let result = normalize_module_output(&value);
                if result.score.is_none() {
                    debug!(module, "module produced no usable score");
                }
                result
            }
            Err(error) => {
                warn!(module, %error, "detector failed; module treated as absent");
                ModuleResult::default()
            }
        }
    }
}

/// Header-only probe of the uploaded bytes: dimensions and mime type,
/// without decoding pixel data.
fn probe_image_header(bytes: &[u8]) -> (Option<u32>, Option<u32>, Option<String>) {
    let Ok(reader) = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() else {
        return (None, None, None);
    };
    let mime_type = reader.format().map(|f| f.to_mime_type().to_string());
    match reader.into_dimensions() {
        Ok((width, height)) => (Some(width), Some(height), mime_type),
        Err(_) => (None, None, mime_type),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn probe_rejects_non_image_bytes() {
        let (width, height, mime) = probe_image_header(b"definitely not an image");
        assert_eq!(width, None);
        assert_eq!(height, None);
        assert_eq!(mime, None);
    }
}
