//! Quality thresholds shared by the analyzer and the row projection.
//!
//! The analyzer and the dashboard projection used to carry their own copies
//! of the rotation and tier cutoffs, and the copies disagreed. Everything now
//! reads from [`QualityThresholds`].

use serde::{Deserialize, Serialize};

/// Blur scores strictly below this are blurry.
pub const BLUR_THRESHOLD_LOW: f64 = 10.0;

/// Rotation (degrees) strictly above this marks a document as rotated.
pub const MAX_ALLOWED_ROTATION: f64 = 5.0;

/// Rotation (degrees) strictly above this is reported as the row's primary issue.
pub const PROJECTION_ROTATION_CUTOFF: f64 = 2.0;

/// Quality scores below this are `Poor`.
pub const POOR_BELOW: u8 = 50;

/// Quality scores below this (and not `Poor`) are `Fair`.
pub const FAIR_BELOW: u8 = 80;

/// Consolidated quality cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// `isBlurry` and the `Blur` row issue fire below this blur score
    pub blur_threshold: f64,
    /// `isRotated` fires above this many degrees
    pub max_rotation: f64,
    /// `Rotation` row issue fires above this many degrees
    pub projection_rotation_cutoff: f64,
    /// Score tier boundary for `Poor`
    pub poor_below: u8,
    /// Score tier boundary for `Fair`
    pub fair_below: u8,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            blur_threshold: BLUR_THRESHOLD_LOW,
            max_rotation: MAX_ALLOWED_ROTATION,
            projection_rotation_cutoff: PROJECTION_ROTATION_CUTOFF,
            poor_below: POOR_BELOW,
            fair_below: FAIR_BELOW,
        }
    }
}

impl QualityThresholds {
    pub fn is_consistent(&self) -> bool {
        self.inconsistency().is_none()
    }

    /// First broken rule, if any. NaN cutoffs fail the non-negative check.
    pub fn inconsistency(&self) -> Option<&'static str> {
        if self.poor_below > self.fair_below {
            return Some("poor_below must not exceed fair_below");
        }
        if self.fair_below > 100 {
            return Some("fair_below must not exceed 100");
        }
        let cutoffs = [
            (self.blur_threshold, "blur_threshold must be a non-negative number"),
            (self.max_rotation, "max_rotation must be a non-negative number"),
            (
                self.projection_rotation_cutoff,
                "projection_rotation_cutoff must be a non-negative number",
            ),
        ];
        cutoffs
            .into_iter()
            .find(|(value, _)| value.is_nan() || *value < 0.0)
            .map(|(_, reason)| reason)
    }
}
