//! Pure fusion and aggregation logic for image trustworthiness analysis.
//!
//! Every function in this crate is a synchronous, side-effect-free
//! transformation over immutable inputs: raw detector output normalization,
//! score fusion, heatmap compositing, EXIF rule evaluation, and history
//! aggregation. Model inference, persistence, and the HTTP surface live
//! with the callers (see `trustlens-pipeline` for the orchestration seam).

pub mod error;
pub mod exif_rules;
pub mod fusion;
pub mod heatmap;
pub mod history;
pub mod matrix;
pub mod normalize;
pub mod risk;
pub mod summary;
pub mod types;
