//! Escalation state store
//!
//! Typed lifecycle operations over the document-store collaborator. Every
//! mutation reads the current document, checks the transition, and writes the
//! whole record back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::document::{DocumentError, DocumentStore, PrincipalSource};
use super::state::{EscalationLevel, EscalationState, EscalationStatus, ReportId};

/// Error type for escalation operations
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    #[error("Unauthorized: no owning principal for write")]
    Unauthorized,

    #[error("Escalation not found: {report_id}")]
    NotFound { report_id: ReportId },

    #[error("Invalid transition for {report_id}: {from} -> {to}")]
    InvalidTransition {
        report_id: ReportId,
        from: EscalationStatus,
        to: EscalationStatus,
    },

    #[error(transparent)]
    Store(#[from] DocumentError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for escalation operations
pub type EscalationResult<T> = Result<T, EscalationError>;

/// Action recorded on a manual trigger.
pub const TRIGGER_ACTION: &str = "Escalation triggered manually";

/// Configuration for the escalation store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Document collection holding escalation records
    pub collection: String,
    /// Route assigned on trigger
    pub default_route_target: String,
    /// Escalation level assigned on trigger
    pub trigger_level: u32,
    /// Scan risk level at or above which a record is ESCALATED instead of VERIFIED
    pub escalate_at_level: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            collection: "escalations".to_string(),
            default_route_target: "/dashboard".to_string(),
            trigger_level: 2,
            escalate_at_level: 2,
        }
    }
}

/// Result of [`EscalationStateStore::trigger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOutcome {
    pub success: bool,
    pub current_state: EscalationState,
    pub action_taken: String,
}

/// A declared-versus-extracted disagreement found by a vision audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub field: String,
    pub declared: serde_json::Value,
    pub extracted: serde_json::Value,
    pub severity: String,
}

/// Vision-audit result applied to a pending record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOutcome {
    pub risk_level: u32,
    pub risk_score: Option<f64>,
    pub match_score: Option<f64>,
    pub risk_marker: Option<f64>,
    pub extracted_metadata: Option<serde_json::Value>,
    pub mismatches: Vec<FieldMismatch>,
}

/// Per-owner dashboard counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationStats {
    pub total: usize,
    pub pending: usize,
    /// VERIFIED, ESCALATED or ACTIVE
    pub in_review: usize,
    pub resolved: usize,
    pub failed: usize,
    /// Highest level among unresolved records
    pub highest_level: EscalationLevel,
}

impl EscalationStats {
    pub fn from_states<'a>(states: impl IntoIterator<Item = &'a EscalationState>) -> Self {
        let mut stats = Self {
            total: 0,
            pending: 0,
            in_review: 0,
            resolved: 0,
            failed: 0,
            highest_level: EscalationLevel::None,
        };

        for state in states {
            stats.total += 1;
            match state.status {
                EscalationStatus::Pending => stats.pending += 1,
                EscalationStatus::Verified
                | EscalationStatus::Escalated
                | EscalationStatus::Active => stats.in_review += 1,
                EscalationStatus::Failed => stats.failed += 1,
                s if s.is_resolved() => stats.resolved += 1,
                _ => {}
            }
            if !state.is_resolved() {
                stats.highest_level = stats.highest_level.max(state.level());
            }
        }

        stats
    }
}

/// Lifecycle store for escalation records.
pub struct EscalationStateStore {
    documents: Arc<dyn DocumentStore>,
    principals: Arc<dyn PrincipalSource>,
    config: EscalationConfig,
}

impl EscalationStateStore {
    pub fn new(documents: Arc<dyn DocumentStore>, principals: Arc<dyn PrincipalSource>) -> Self {
        Self::with_config(documents, principals, EscalationConfig::default())
    }

    pub fn with_config(
        documents: Arc<dyn DocumentStore>,
        principals: Arc<dyn PrincipalSource>,
        config: EscalationConfig,
    ) -> Self {
        Self {
            documents,
            principals,
            config,
        }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    // =========================================================================
    // Intake and reads
    // =========================================================================

    /// Create a PENDING record owned by the current principal.
    pub async fn create_job(
        &self,
        report_id: &str,
        metadata: serde_json::Value,
    ) -> EscalationResult<()> {
        let owner = self
            .principals
            .current()
            .ok_or(EscalationError::Unauthorized)?;

        // Re-intake only replaces a record that has not been scanned yet or
        // whose last run failed.
        if let Some(existing) = self.get_status(report_id).await? {
            if existing.status != EscalationStatus::Pending {
                check_transition(&existing, EscalationStatus::Pending)?;
            }
        }

        let state = EscalationState::intake(report_id, Some(owner.uid.clone()), Some(metadata));
        self.save(&state).await?;

        info!(report_id, owner = %owner.uid, "Escalation job created");
        Ok(())
    }

    /// Current record, or `None` if it does not exist.
    pub async fn get_status(&self, report_id: &str) -> EscalationResult<Option<EscalationState>> {
        let Some(doc) = self.documents.get(&self.config.collection, report_id).await? else {
            return Ok(None);
        };
        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| EscalationError::Serialization(e.to_string()))
    }

    /// All records owned by `owner_id`, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> EscalationResult<Vec<EscalationState>> {
        let docs = self
            .documents
            .find_by_field(
                &self.config.collection,
                "clientUid",
                &serde_json::Value::from(owner_id),
            )
            .await?;

        let mut states: Vec<EscalationState> = docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(owner_id, error = %e, "Skipping malformed escalation document");
                    None
                }
            })
            .collect();

        states.sort_by(|a, b| b.timestamp_created.cmp(&a.timestamp_created));
        Ok(states)
    }

    /// Records owned by the current principal; empty when nobody is signed in.
    pub async fn list_for_current_owner(&self) -> EscalationResult<Vec<EscalationState>> {
        match self.principals.current() {
            Some(principal) => self.list_for_owner(&principal.uid).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn stats_for_owner(&self, owner_id: &str) -> EscalationResult<EscalationStats> {
        let states = self.list_for_owner(owner_id).await?;
        Ok(EscalationStats::from_states(&states))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Close a record as RESOLVED.
    pub async fn resolve(&self, report_id: &str, note: &str) -> EscalationResult<EscalationState> {
        self.resolve_as(report_id, EscalationStatus::Resolved, note).await
    }

    /// Close a record with a specific terminal status.
    pub async fn resolve_as(
        &self,
        report_id: &str,
        status: EscalationStatus,
        note: &str,
    ) -> EscalationResult<EscalationState> {
        let current = self.require(report_id).await?;
        if !status.is_terminal() {
            return Err(EscalationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: current.status,
                to: status,
            });
        }
        check_transition(&current, status)?;

        let mut next = current.clone();
        next.status = status;
        next.resolution_note = Some(note.to_string());
        next.touch();

        let next = self.commit(Some(&current), next).await?;
        info!(report_id, status = %status, "Escalation resolved");
        Ok(next)
    }

    /// Manually escalate a record to ACTIVE.
    ///
    /// A missing record is created directly in ACTIVE.
    pub async fn trigger(
        &self,
        report_id: &str,
        metadata: serde_json::Value,
    ) -> EscalationResult<TriggerOutcome> {
        let current = self.get_status(report_id).await?;

        let mut next = match &current {
            Some(state) => {
                check_transition(state, EscalationStatus::Active)?;
                state.clone()
            }
            None => EscalationState::intake(
                report_id,
                self.principals.current().map(|p| p.uid),
                None,
            ),
        };

        next.status = EscalationStatus::Active;
        next.escalation_level = Some(self.config.trigger_level);
        next.route_target = Some(self.config.default_route_target.clone());
        next.notifications_sent.clear();
        next.action_taken = Some(TRIGGER_ACTION.to_string());
        if !metadata.is_null() {
            next.extracted_metadata = Some(metadata);
        }
        next.touch();

        let next = self.commit(current.as_ref(), next).await?;
        info!(
            report_id,
            level = self.config.trigger_level,
            route = %self.config.default_route_target,
            "Escalation triggered"
        );

        Ok(TriggerOutcome {
            success: true,
            current_state: next,
            action_taken: TRIGGER_ACTION.to_string(),
        })
    }

    /// Record a vision-audit result on a PENDING record.
    pub async fn apply_scan(
        &self,
        report_id: &str,
        outcome: ScanOutcome,
    ) -> EscalationResult<EscalationState> {
        let current = self.require(report_id).await?;

        let target = if outcome.risk_level >= self.config.escalate_at_level
            || !outcome.mismatches.is_empty()
        {
            EscalationStatus::Escalated
        } else {
            EscalationStatus::Verified
        };
        check_transition(&current, target)?;

        let mut next = current.clone();
        next.status = target;
        next.escalation_level = Some(outcome.risk_level);
        if outcome.risk_score.is_some() {
            next.risk_score = outcome.risk_score;
        }
        if outcome.match_score.is_some() {
            next.match_score = outcome.match_score;
        }
        if outcome.risk_marker.is_some() {
            next.risk_marker = outcome.risk_marker;
        }
        if let Some(metadata) = outcome.extracted_metadata.filter(|m| !m.is_null()) {
            next.extracted_metadata = Some(metadata);
        }
        next.touch();

        let next = self.commit(Some(&current), next).await?;
        info!(
            report_id,
            status = %target,
            risk_level = outcome.risk_level,
            mismatches = outcome.mismatches.len(),
            "Scan applied"
        );
        Ok(next)
    }

    /// Put a FAILED record back in the queue.
    pub async fn requeue(&self, report_id: &str) -> EscalationResult<EscalationState> {
        let current = self.require(report_id).await?;
        check_transition(&current, EscalationStatus::Pending)?;

        let mut next = current.clone();
        next.status = EscalationStatus::Pending;
        next.touch();
        self.commit(Some(&current), next).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require(&self, report_id: &str) -> EscalationResult<EscalationState> {
        self.get_status(report_id)
            .await?
            .ok_or_else(|| EscalationError::NotFound {
                report_id: report_id.to_string(),
            })
    }

    async fn save(&self, state: &EscalationState) -> EscalationResult<()> {
        let doc = serde_json::to_value(state)
            .map_err(|e| EscalationError::Serialization(e.to_string()))?;
        self.documents
            .put(&self.config.collection, &state.report_id, doc)
            .await?;
        Ok(())
    }

    /// Write `next`; on failure, try to leave `previous` marked FAILED.
    async fn commit(
        &self,
        previous: Option<&EscalationState>,
        next: EscalationState,
    ) -> EscalationResult<EscalationState> {
        match self.save(&next).await {
            Ok(()) => Ok(next),
            Err(err) => {
                if let Some(previous) = previous {
                    self.mark_failed(previous, &err).await;
                }
                Err(err)
            }
        }
    }

    async fn mark_failed(&self, previous: &EscalationState, cause: &EscalationError) {
        if !previous.status.can_transition_to(EscalationStatus::Failed) {
            return;
        }

        let mut failed = previous.clone();
        failed.status = EscalationStatus::Failed;
        failed.action_taken = Some(format!("collaborator error: {}", cause));
        failed.touch();

        match self.save(&failed).await {
            Ok(()) => warn!(
                report_id = %previous.report_id,
                error = %cause,
                "Escalation marked FAILED"
            ),
            Err(e) => warn!(
                report_id = %previous.report_id,
                error = %e,
                "Could not record FAILED status"
            ),
        }
    }
}

fn check_transition(current: &EscalationState, to: EscalationStatus) -> EscalationResult<()> {
    if current.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(EscalationError::InvalidTransition {
            report_id: current.report_id.clone(),
            from: current.status,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::document::{MemoryDocumentStore, StaticPrincipal};
    use serde_json::json;

    fn store_as(uid: Option<&str>) -> (Arc<MemoryDocumentStore>, EscalationStateStore) {
        let docs = Arc::new(MemoryDocumentStore::new());
        let principal = match uid {
            Some(uid) => StaticPrincipal::signed_in(uid),
            None => StaticPrincipal::anonymous(),
        };
        let store = EscalationStateStore::new(docs.clone(), Arc::new(principal));
        (docs, store)
    }

    #[tokio::test]
    async fn test_create_job_writes_pending_record() {
        let (_, store) = store_as(Some("uid-1"));
        store
            .create_job("RPR-1", json!({"institution": "ANZ"}))
            .await
            .unwrap();

        let state = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(state.status, EscalationStatus::Pending);
        assert_eq!(state.risk_score, Some(0.0));
        assert_eq!(state.client_owner_id.as_deref(), Some("uid-1"));
        assert_eq!(state.extracted_metadata, Some(json!({"institution": "ANZ"})));
        assert_eq!(state.level(), EscalationLevel::None);
    }

    #[tokio::test]
    async fn test_create_job_without_principal_writes_nothing() {
        let (docs, store) = store_as(None);
        let err = store.create_job("RPR-1", json!({})).await.unwrap_err();
        assert!(matches!(err, EscalationError::Unauthorized));
        assert!(docs.is_empty("escalations"));
    }

    #[tokio::test]
    async fn test_create_job_keeps_resolved_record() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        store.trigger("RPR-1", json!(null)).await.unwrap();
        store.resolve("RPR-1", "cleared").await.unwrap();

        let err = store.create_job("RPR-1", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            EscalationError::InvalidTransition {
                from: EscalationStatus::Resolved,
                to: EscalationStatus::Pending,
                ..
            }
        ));

        let state = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(state.status, EscalationStatus::Resolved);
        assert_eq!(state.resolution_note.as_deref(), Some("cleared"));
    }

    #[tokio::test]
    async fn test_create_job_rejects_open_escalation_but_refreshes_pending() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({"v": 1})).await.unwrap();
        store.create_job("RPR-1", json!({"v": 2})).await.unwrap();
        let state = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(state.extracted_metadata, Some(json!({"v": 2})));

        store.trigger("RPR-1", json!(null)).await.unwrap();
        let err = store.create_job("RPR-1", json!({})).await.unwrap_err();
        assert!(matches!(err, EscalationError::InvalidTransition { .. }));
        let state = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(state.status, EscalationStatus::Active);
    }

    #[tokio::test]
    async fn test_read_misses_are_not_errors() {
        let (_, store) = store_as(Some("uid-1"));
        assert!(store.get_status("missing").await.unwrap().is_none());
        assert!(store.list_for_owner("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_current_owner_anonymous_is_empty() {
        let (_, store) = store_as(None);
        assert!(store.list_for_current_owner().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_sets_active_high() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!(null)).await.unwrap();

        let outcome = store.trigger("RPR-1", json!({"reason": "mismatch"})).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.action_taken, TRIGGER_ACTION);

        let state = outcome.current_state;
        assert_eq!(state.status, EscalationStatus::Active);
        assert_eq!(state.escalation_level, Some(2));
        assert_eq!(state.level(), EscalationLevel::High);
        assert_eq!(state.route_target.as_deref(), Some("/dashboard"));
        assert!(state.notifications_sent.is_empty());
        assert!(state.last_check_timestamp.is_some());
        assert_eq!(state.extracted_metadata, Some(json!({"reason": "mismatch"})));

        let stored = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(stored, state);
    }

    #[tokio::test]
    async fn test_trigger_clears_notifications() {
        let (docs, store) = store_as(Some("uid-1"));
        let mut state = EscalationState::intake("RPR-1", Some("uid-1".into()), None);
        state.notifications_sent = vec!["email:ops".into()];
        docs.put("escalations", "RPR-1", serde_json::to_value(&state).unwrap())
            .await
            .unwrap();

        let outcome = store.trigger("RPR-1", json!(null)).await.unwrap();
        assert!(outcome.current_state.notifications_sent.is_empty());
        assert!(outcome.current_state.extracted_metadata.is_none());
    }

    #[tokio::test]
    async fn test_trigger_missing_record_creates_active() {
        let (_, store) = store_as(Some("uid-2"));
        let outcome = store.trigger("RPR-9", json!(null)).await.unwrap();
        assert_eq!(outcome.current_state.status, EscalationStatus::Active);
        assert_eq!(outcome.current_state.client_owner_id.as_deref(), Some("uid-2"));
        assert!(store.get_status("RPR-9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resolve_after_trigger() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        store.trigger("RPR-1", json!(null)).await.unwrap();

        let state = store.resolve("RPR-1", "funds confirmed").await.unwrap();
        assert_eq!(state.status, EscalationStatus::Resolved);
        assert_eq!(state.resolution_note.as_deref(), Some("funds confirmed"));
        assert!(state.last_check_timestamp.is_some());
        assert!(state.is_resolved());
    }

    #[tokio::test]
    async fn test_resolve_pending_is_rejected() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();

        let err = store.resolve("RPR-1", "too early").await.unwrap_err();
        assert!(matches!(
            err,
            EscalationError::InvalidTransition {
                from: EscalationStatus::Pending,
                to: EscalationStatus::Resolved,
                ..
            }
        ));
        let state = store.get_status("RPR-1").await.unwrap().unwrap();
        assert_eq!(state.status, EscalationStatus::Pending);
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let (_, store) = store_as(Some("uid-1"));
        let err = store.resolve("ghost", "n/a").await.unwrap_err();
        assert!(matches!(err, EscalationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_as_rejects_non_terminal_target() {
        let (_, store) = store_as(Some("uid-1"));
        store.trigger("RPR-1", json!(null)).await.unwrap();
        let err = store
            .resolve_as("RPR-1", EscalationStatus::Verified, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EscalationError::InvalidTransition { .. }));

        let closed = store
            .resolve_as("RPR-1", EscalationStatus::AutoClosed, "stale")
            .await
            .unwrap();
        assert_eq!(closed.status, EscalationStatus::AutoClosed);
    }

    #[tokio::test]
    async fn test_trigger_on_resolved_is_rejected() {
        let (_, store) = store_as(Some("uid-1"));
        store.trigger("RPR-1", json!(null)).await.unwrap();
        store.resolve("RPR-1", "done").await.unwrap();
        let err = store.trigger("RPR-1", json!(null)).await.unwrap_err();
        assert!(matches!(err, EscalationError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_apply_scan_low_risk_verifies() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();

        let state = store
            .apply_scan(
                "RPR-1",
                ScanOutcome {
                    risk_level: 1,
                    risk_score: Some(12.0),
                    match_score: Some(97.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(state.status, EscalationStatus::Verified);
        assert_eq!(state.level(), EscalationLevel::Medium);
        assert_eq!(state.match_score, Some(97.5));
        assert_eq!(state.risk_score, Some(12.0));
    }

    #[tokio::test]
    async fn test_apply_scan_mismatch_escalates() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();

        let state = store
            .apply_scan(
                "RPR-1",
                ScanOutcome {
                    risk_level: 0,
                    mismatches: vec![FieldMismatch {
                        field: "amount".into(),
                        declared: json!(1500),
                        extracted: json!(150),
                        severity: "HIGH".into(),
                    }],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(state.status, EscalationStatus::Escalated);
        assert_eq!(state.level(), EscalationLevel::Low);
    }

    #[tokio::test]
    async fn test_apply_scan_high_risk_escalates() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        let state = store
            .apply_scan("RPR-1", ScanOutcome { risk_level: 3, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(state.status, EscalationStatus::Escalated);
        assert_eq!(state.level(), EscalationLevel::Critical);
    }

    #[tokio::test]
    async fn test_list_for_owner_newest_first() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.create_job("RPR-2", json!({})).await.unwrap();

        let states = store.list_for_owner("uid-1").await.unwrap();
        let ids: Vec<_> = states.iter().map(|s| s.report_id.as_str()).collect();
        assert_eq!(ids, vec!["RPR-2", "RPR-1"]);
        assert_eq!(store.list_for_current_owner().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_skips_malformed_documents() {
        let (docs, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        docs.put("escalations", "bad", json!({"clientUid": "uid-1", "status": "WAT"}))
            .await
            .unwrap();
        assert_eq!(store.list_for_owner("uid-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_for_owner() {
        let (_, store) = store_as(Some("uid-1"));
        store.create_job("RPR-1", json!({})).await.unwrap();
        store.create_job("RPR-2", json!({})).await.unwrap();
        store.create_job("RPR-3", json!({})).await.unwrap();
        store.trigger("RPR-2", json!(null)).await.unwrap();
        store
            .apply_scan("RPR-3", ScanOutcome { risk_level: 4, ..Default::default() })
            .await
            .unwrap();
        store.resolve("RPR-3", "cleared").await.unwrap();

        let stats = store.stats_for_owner("uid-1").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_review, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.failed, 0);
        // RPR-3 is CRITICAL but resolved; RPR-2 is HIGH and open.
        assert_eq!(stats.highest_level, EscalationLevel::High);
    }

    #[tokio::test]
    async fn test_custom_route_and_level() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let store = EscalationStateStore::with_config(
            docs,
            Arc::new(StaticPrincipal::signed_in("uid-1")),
            EscalationConfig {
                default_route_target: "SENIOR_OPS".into(),
                trigger_level: 3,
                ..Default::default()
            },
        );
        let outcome = store.trigger("RPR-1", json!(null)).await.unwrap();
        assert_eq!(outcome.current_state.route_target.as_deref(), Some("SENIOR_OPS"));
        assert_eq!(outcome.current_state.level(), EscalationLevel::Critical);
    }
}
