//! Document quality analyzer
//!
//! Heuristic blur and rotation signals over a grayscale-like matrix. The
//! numbers are deliberately cheap: they triage evidence for a human reviewer,
//! they do not replace one.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::thresholds::QualityThresholds;

/// Weight of the blur component in the composite score.
pub const WEIGHT_BLUR: f64 = 0.6;

/// Weight of the rotation component in the composite score.
pub const WEIGHT_ROTATION: f64 = 0.4;

/// Analyses slower than this many milliseconds lose [`SLOW_ANALYSIS_PENALTY`].
pub const SLOW_ANALYSIS_MS: u64 = 900;

/// Flat deduction for a slow analysis.
pub const SLOW_ANALYSIS_PENALTY: f64 = 5.0;

const SCORE_MAX: f64 = 100.0;

/// Columns past this index count as high-frequency energy.
const HIGH_FREQUENCY_COLUMN: usize = 5;

/// Outcome of a single analysis. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAnalysisResult {
    /// Share of high-frequency energy, 0-100, two decimals
    pub blur_score: f64,
    pub is_blurry: bool,
    /// Synthetic skew angle, 0-10, two decimals
    pub rotation_degrees: f64,
    pub is_rotated: bool,
    /// Wall-clock analysis time in whole milliseconds
    pub runtime_ms: u64,
}

/// What went wrong inside the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisFault {
    /// The matrix has no rows.
    EmptyMatrix,
    /// NaN or infinite cell.
    NonFiniteCell { row: usize, column: usize },
    /// Cell magnitudes large enough that the energy sum overflowed.
    EnergyOverflow,
}

impl fmt::Display for AnalysisFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMatrix => write!(f, "matrix has no rows"),
            Self::NonFiniteCell { row, column } => {
                write!(f, "non-finite cell at ({}, {})", row, column)
            }
            Self::EnergyOverflow => write!(f, "energy sum overflowed"),
        }
    }
}

/// Single error kind surfaced by [`QualityAnalyzer::analyze`].
///
/// Callers only need to know the analysis failed; the fault is kept for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("QualityAnalysisError: Failed during core image processing ({cause})")]
pub struct QualityAnalysisError {
    pub cause: AnalysisFault,
}

/// Stateless analyzer. Cheap to construct and copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAnalyzer {
    thresholds: QualityThresholds,
}

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Analyze a matrix synchronously.
    pub fn analyze(
        &self,
        matrix: &[Vec<f64>],
    ) -> Result<QualityAnalysisResult, QualityAnalysisError> {
        let started = Instant::now();

        let (blur, rotation) = match measure(matrix) {
            Ok(signals) => signals,
            Err(cause) => {
                warn!(%cause, "Document analysis failed");
                return Err(QualityAnalysisError { cause });
            }
        };

        // Flags use the unrounded signals; only the reported values are rounded.
        let result = QualityAnalysisResult {
            blur_score: round2(blur),
            is_blurry: blur < self.thresholds.blur_threshold,
            rotation_degrees: round2(rotation),
            is_rotated: rotation.abs() > self.thresholds.max_rotation,
            runtime_ms: (started.elapsed().as_secs_f64() * 1000.0).round() as u64,
        };

        debug!(
            blur_score = result.blur_score,
            rotation = result.rotation_degrees,
            runtime_ms = result.runtime_ms,
            "Document analysis complete"
        );
        Ok(result)
    }

    /// Same as [`analyze`](Self::analyze), but yields to the scheduler first so
    /// a single-threaded runtime can interleave it with other work.
    pub async fn analyze_deferred(
        &self,
        matrix: &[Vec<f64>],
    ) -> Result<QualityAnalysisResult, QualityAnalysisError> {
        tokio::task::yield_now().await;
        self.analyze(matrix)
    }

    /// Composite 0-100 score. Sharper and straighter is higher.
    pub fn compute_quality_score(result: &QualityAnalysisResult) -> u8 {
        let mut score = SCORE_MAX;

        let normalized_blur = result.blur_score.clamp(0.0, SCORE_MAX) / SCORE_MAX;
        score -= (1.0 - normalized_blur) * SCORE_MAX * WEIGHT_BLUR;

        if result.is_rotated {
            score -= SCORE_MAX * WEIGHT_ROTATION;
        }

        if result.runtime_ms > SLOW_ANALYSIS_MS {
            score -= SLOW_ANALYSIS_PENALTY;
        }

        score.round().clamp(0.0, SCORE_MAX) as u8
    }
}

/// Returns the unrounded (blur, rotation) pair.
fn measure(matrix: &[Vec<f64>]) -> Result<(f64, f64), AnalysisFault> {
    let (first, last) = match (matrix.first(), matrix.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AnalysisFault::EmptyMatrix),
    };

    for (r, row) in matrix.iter().enumerate() {
        if let Some(c) = row.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisFault::NonFiniteCell { row: r, column: c });
        }
    }

    Ok((blur_score(matrix)?, rotation_degrees(first, last)))
}

fn blur_score(matrix: &[Vec<f64>]) -> Result<f64, AnalysisFault> {
    let mut total_energy = 0.0_f64;
    let mut high_frequency_energy = 0.0_f64;

    for row in matrix {
        for (i, cell) in row.iter().enumerate() {
            let energy = cell * cell;
            total_energy += energy;
            if i > HIGH_FREQUENCY_COLUMN {
                high_frequency_energy += energy;
            }
        }
    }

    if !total_energy.is_finite() {
        return Err(AnalysisFault::EnergyOverflow);
    }
    if total_energy == 0.0 {
        return Ok(0.0);
    }

    let score = (high_frequency_energy / total_energy) * 1000.0;
    Ok((score / 10.0).min(SCORE_MAX))
}

fn rotation_degrees(first: &[f64], last: &[f64]) -> f64 {
    let top: f64 = first.iter().fold(0.0, |acc, v| acc + v);
    let bottom: f64 = last.iter().fold(0.0, |acc, v| acc + v);
    (top - bottom).abs() % 10.0
}

/// Two decimals, rounded from the exact binary value with ties away from
/// zero. `2.005` is stored as `2.00499...` and so rounds down.
fn round2(value: f64) -> f64 {
    // Only odd multiples of 1/8 sit exactly halfway between two hundredths.
    // `{:.2}` breaks those ties to even, so handle them first.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        return (value * 100.0).round() / 100.0;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}
