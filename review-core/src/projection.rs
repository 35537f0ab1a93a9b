//! Dashboard row projection
//!
//! Pure merge of one escalation record with the quality analysis of its
//! evidence image. Nothing here touches storage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::escalation::{EscalationLevel, EscalationState, EscalationStatus, ReportId};
use crate::quality::{
    QualityAnalysisResult, QualityAnalyzer, QualityIssue, QualityStatus, QualityThresholds,
};

/// One dashboard row. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRowUI {
    pub id: ReportId,
    pub level: EscalationLevel,
    pub status: EscalationStatus,
    pub is_resolved: bool,
    pub quality_score: u8,
    pub primary_quality_issue: QualityIssue,
    pub quality_status: QualityStatus,
    /// Route target, empty when unrouted
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub risk_marker: f64,
    pub match_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_metadata: Option<serde_json::Value>,
    pub quality_analysis_runtime_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RowProjection {
    thresholds: QualityThresholds,
}

impl RowProjection {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn project(
        &self,
        state: &EscalationState,
        quality: &QualityAnalysisResult,
    ) -> EscalationRowUI {
        let quality_score = QualityAnalyzer::compute_quality_score(quality);
        let risk_marker = state
            .risk_marker
            .or_else(|| state.escalation_level.map(f64::from))
            .unwrap_or(0.0);

        EscalationRowUI {
            id: state.report_id.clone(),
            level: state.level(),
            status: state.status,
            is_resolved: state.is_resolved(),
            quality_score,
            primary_quality_issue: QualityIssue::classify(quality, &self.thresholds),
            quality_status: QualityStatus::from_score(quality_score, &self.thresholds),
            target: state.route_target.clone().unwrap_or_default(),
            last_updated: state.last_check_timestamp,
            risk_marker,
            match_score: state.match_score.unwrap_or(0.0),
            extracted_metadata: state.extracted_metadata.clone(),
            quality_analysis_runtime_ms: quality.runtime_ms,
        }
    }

    /// Project every state that has a quality result, keeping input order.
    pub fn project_all<'a>(
        &self,
        states: impl IntoIterator<Item = &'a EscalationState>,
        quality: &HashMap<ReportId, QualityAnalysisResult>,
    ) -> Vec<EscalationRowUI> {
        states
            .into_iter()
            .filter_map(|state| {
                quality
                    .get(&state.report_id)
                    .map(|result| self.project(state, result))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sharp() -> QualityAnalysisResult {
        QualityAnalysisResult {
            blur_score: 90.0,
            is_blurry: false,
            rotation_degrees: 0.5,
            is_rotated: false,
            runtime_ms: 12,
        }
    }

    fn state(level: Option<u32>, status: EscalationStatus) -> EscalationState {
        let mut state = EscalationState::intake("rep-1", Some("uid-1".into()), None);
        state.escalation_level = level;
        state.status = status;
        state
    }

    #[test]
    fn test_active_level_two_is_high_and_open() {
        let active = state(Some(2), EscalationStatus::Active);
        let row = RowProjection::default().project(&active, &sharp());
        assert_eq!(row.level, EscalationLevel::High);
        assert!(!row.is_resolved);
        assert_eq!(row.status, EscalationStatus::Active);
    }

    #[test]
    fn test_terminal_status_is_resolved() {
        for status in [
            EscalationStatus::Resolved,
            EscalationStatus::ManuallyResolved,
            EscalationStatus::AutoClosed,
        ] {
            let row = RowProjection::default().project(&state(Some(0), status), &sharp());
            assert!(row.is_resolved);
            assert_eq!(row.level, EscalationLevel::Low);
        }
    }

    #[test]
    fn test_quality_fields() {
        let projection = RowProjection::default();

        let row = projection.project(&state(None, EscalationStatus::Pending), &sharp());
        assert_eq!(row.level, EscalationLevel::None);
        assert_eq!(row.primary_quality_issue, QualityIssue::None);
        assert_eq!(row.quality_status, QualityStatus::Good);
        assert_eq!(row.quality_analysis_runtime_ms, 12);

        let blurry = QualityAnalysisResult {
            blur_score: 2.0,
            is_blurry: true,
            rotation_degrees: 8.0,
            ..sharp()
        };
        let row = projection.project(&state(None, EscalationStatus::Pending), &blurry);
        assert_eq!(row.primary_quality_issue, QualityIssue::Blur);
        assert_eq!(row.quality_status, QualityStatus::Poor);

        // 3 degrees is under the analyzer's flag but over the row cutoff.
        let skewed = QualityAnalysisResult {
            rotation_degrees: -3.0,
            ..sharp()
        };
        let row = projection.project(&state(None, EscalationStatus::Pending), &skewed);
        assert_eq!(row.primary_quality_issue, QualityIssue::Rotation);
    }

    #[test]
    fn test_skew_just_under_cutoff_is_not_rotation() {
        // Row sums 2.005 and 0 give a skew stored just below 2.005.
        let quality = QualityAnalyzer::new()
            .analyze(&[vec![2.005], vec![0.0]])
            .unwrap();
        assert_eq!(quality.rotation_degrees, 2.0);

        let pending = state(None, EscalationStatus::Pending);
        let row = RowProjection::default().project(&pending, &quality);
        assert_ne!(row.primary_quality_issue, QualityIssue::Rotation);
    }

    #[test]
    fn test_supplementary_fields() {
        let mut s = state(Some(3), EscalationStatus::Escalated);
        s.route_target = Some("/dashboard".into());
        s.extracted_metadata = Some(serde_json::json!({"name": "Ana"}));

        let row = RowProjection::default().project(&s, &sharp());
        assert_eq!(row.target, "/dashboard");
        assert_eq!(row.risk_marker, 3.0);
        assert_eq!(row.match_score, 0.0);
        assert_eq!(row.extracted_metadata, s.extracted_metadata);

        s.risk_marker = Some(0.75);
        s.match_score = Some(0.4);
        let row = RowProjection::default().project(&s, &sharp());
        assert_eq!(row.risk_marker, 0.75);
        assert_eq!(row.match_score, 0.4);

        let pending = state(None, EscalationStatus::Pending);
        let row = RowProjection::default().project(&pending, &sharp());
        assert_eq!(row.target, "");
        assert_eq!(row.risk_marker, 0.0);
    }

    #[test]
    fn test_row_serializes_camel_case() {
        let active = state(Some(2), EscalationStatus::Active);
        let row = RowProjection::default().project(&active, &sharp());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["level"], "HIGH");
        assert_eq!(json["status"], "ACTIVE");
        assert_eq!(json["isResolved"], false);
        assert_eq!(json["primaryQualityIssue"], "None");
        assert_eq!(json["qualityStatus"], "Good");
        assert!(json.get("lastUpdated").is_none());
    }

    #[test]
    fn test_project_all_skips_unanalyzed() {
        let mut a = state(Some(1), EscalationStatus::Pending);
        a.report_id = "a".into();
        let mut b = state(Some(2), EscalationStatus::Active);
        b.report_id = "b".into();

        let quality = HashMap::from([("b".to_string(), sharp())]);
        let rows = RowProjection::default().project_all([&a, &b], &quality);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[0].level, EscalationLevel::High);
    }
}
