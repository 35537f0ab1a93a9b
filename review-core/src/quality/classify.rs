//! Reviewer-facing classification of an analysis result.

use serde::{Deserialize, Serialize};

use super::analyzer::{QualityAnalysisResult, QualityAnalyzer};
use super::thresholds::QualityThresholds;

/// The single most important thing wrong with a document image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityIssue {
    None,
    Blur,
    Rotation,
}

impl QualityIssue {
    /// Blur wins over rotation when both apply.
    pub fn classify(result: &QualityAnalysisResult, thresholds: &QualityThresholds) -> Self {
        if result.blur_score < thresholds.blur_threshold {
            Self::Blur
        } else if result.rotation_degrees.abs() > thresholds.projection_rotation_cutoff {
            Self::Rotation
        } else {
            Self::None
        }
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Blur => write!(f, "Blur"),
            Self::Rotation => write!(f, "Rotation"),
        }
    }
}

/// Score tier shown next to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityStatus {
    Good,
    Fair,
    Poor,
}

impl QualityStatus {
    pub fn from_score(score: u8, thresholds: &QualityThresholds) -> Self {
        if score < thresholds.poor_below {
            Self::Poor
        } else if score < thresholds.fair_below {
            Self::Fair
        } else {
            Self::Good
        }
    }

    pub fn classify(result: &QualityAnalysisResult, thresholds: &QualityThresholds) -> Self {
        Self::from_score(QualityAnalyzer::compute_quality_score(result), thresholds)
    }
}

impl std::fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}
