//! Document quality scoring
//!
//! Turns raw heuristic signals into a bounded composite score:
//!
//! ```text
//! matrix ──analyze──▶ QualityAnalysisResult { blur, rotation, runtime }
//!                         │
//!                         ├─ compute_quality_score ──▶ 0..=100
//!                         ├─ QualityIssue::classify ──▶ None | Blur | Rotation
//!                         └─ QualityStatus::classify ─▶ Good | Fair | Poor
//! ```
//!
//! All cutoffs live in [`QualityThresholds`].

pub mod analyzer;
pub mod classify;
pub mod thresholds;

pub use analyzer::{AnalysisFault, QualityAnalysisError, QualityAnalysisResult, QualityAnalyzer};
pub use classify::{QualityIssue, QualityStatus};
pub use thresholds::QualityThresholds;
