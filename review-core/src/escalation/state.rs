//! Escalation state: lifecycle record for one piece of submitted evidence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the report an escalation belongs to.
pub type ReportId = String;

/// Lifecycle status of an escalation record.
///
/// ```text
/// IDLE ─▶ PENDING ─┬─▶ VERIFIED ──┐
///                  ├─▶ ESCALATED ─┼─▶ RESOLVED | MANUALLY_RESOLVED | AUTO_CLOSED
///                  └─▶ ACTIVE ────┘
///
/// any non-terminal ─▶ FAILED ─▶ PENDING
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationStatus {
    Idle,
    Pending,
    Verified,
    Escalated,
    Active,
    Resolved,
    ManuallyResolved,
    AutoClosed,
    Failed,
}

impl EscalationStatus {
    pub const ALL: [EscalationStatus; 9] = [
        Self::Idle,
        Self::Pending,
        Self::Verified,
        Self::Escalated,
        Self::Active,
        Self::Resolved,
        Self::ManuallyResolved,
        Self::AutoClosed,
        Self::Failed,
    ];

    /// Closed for good. Equivalent to the reviewer-facing "resolved" flag.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Resolved | Self::ManuallyResolved | Self::AutoClosed
        )
    }

    pub fn is_resolved(self) -> bool {
        self.is_terminal()
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: EscalationStatus) -> bool {
        use EscalationStatus::*;

        if next == Failed {
            return !self.is_terminal() && self != Failed;
        }

        match self {
            Idle => next == Pending,
            Pending => matches!(next, Verified | Escalated | Active),
            Verified => next.is_terminal(),
            Escalated => next == Active || next.is_terminal(),
            Active => next == Active || next.is_terminal(),
            Failed => next == Pending,
            Resolved | ManuallyResolved | AutoClosed => false,
        }
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Escalated => "ESCALATED",
            Self::Active => "ACTIVE",
            Self::Resolved => "RESOLVED",
            Self::ManuallyResolved => "MANUALLY_RESOLVED",
            Self::AutoClosed => "AUTO_CLOSED",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Named severity tier derived from the numeric escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscalationLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl EscalationLevel {
    /// Total mapping from a raw level. Negative or missing levels are `None`.
    pub fn from_level(level: Option<i64>) -> Self {
        match level {
            Some(l) if l >= 3 => Self::Critical,
            Some(2) => Self::High,
            Some(1) => Self::Medium,
            Some(0) => Self::Low,
            _ => Self::None,
        }
    }
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One escalation document. Stored whole and replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationState {
    pub report_id: ReportId,
    /// Owning principal
    #[serde(rename = "clientUid", default, skip_serializing_if = "Option::is_none")]
    pub client_owner_id: Option<String>,
    pub status: EscalationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_metadata: Option<serde_json::Value>,
    #[serde(alias = "timestamp")]
    pub timestamp_created: DateTime<Utc>,
    /// Absent until a scan or trigger assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_target: Option<String>,
    #[serde(default)]
    pub notifications_sent: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_marker: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
}

impl EscalationState {
    /// Fresh intake record: PENDING, zero risk, no level yet.
    pub fn intake(
        report_id: impl Into<ReportId>,
        owner: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            report_id: report_id.into(),
            client_owner_id: owner,
            status: EscalationStatus::Pending,
            risk_score: Some(0.0),
            extracted_metadata: metadata.filter(|m| !m.is_null()),
            timestamp_created: Utc::now(),
            escalation_level: None,
            last_check_timestamp: None,
            route_target: None,
            notifications_sent: Vec::new(),
            resolution_note: None,
            action_taken: None,
            risk_marker: None,
            match_score: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status.is_resolved()
    }

    pub fn level(&self) -> EscalationLevel {
        EscalationLevel::from_level(self.escalation_level.map(i64::from))
    }

    /// Stamp the last-check time.
    pub fn touch(&mut self) {
        self.last_check_timestamp = Some(Utc::now());
    }
}
