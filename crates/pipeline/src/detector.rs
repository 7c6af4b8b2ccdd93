//! Seams to the external inference and metadata collaborators.

use std::collections::HashMap;

use async_trait::async_trait;

/// Failure of an external collaborator. The pipeline never propagates
/// these out of an analysis; they downgrade the affected module to absent.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("inference backend failure: {0}")]
    Inference(String),

    #[error("metadata extraction failure: {0}")]
    Metadata(String),
}

/// One external detection module (`ai` or `manip`).
///
/// Implementations return the backend's loose JSON payload
/// (`{"score": .., "heatmap": ..}`) unfiltered; the pipeline runs it
/// through the score normalizer, so no shape guarantees are required
/// here.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Stable module name used in logs.
    fn name(&self) -> &'static str;

    async fn infer(&self, image: &[u8]) -> Result<serde_json::Value, CollaboratorError>;
}

/// External EXIF reader; yields the raw tag map. The suspiciousness rules
/// over those tags live in the core crate.
#[async_trait]
pub trait ExifReader: Send + Sync {
    async fn read_exif(&self, image: &[u8]) -> Result<HashMap<String, String>, CollaboratorError>;
}
