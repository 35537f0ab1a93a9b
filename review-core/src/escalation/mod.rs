//! Escalation lifecycle
//!
//! One record per report, stored whole in an external document store.
//!
//! ```text
//! create_job ──▶ PENDING
//!                  │ apply_scan (risk < escalate_at_level, no mismatches)
//!                  ├──────────────▶ VERIFIED ───┐
//!                  │ apply_scan (risky)         │ resolve / resolve_as
//!                  ├──────────────▶ ESCALATED ──┼──────────────▶ RESOLVED
//!                  │ trigger           │trigger │                MANUALLY_RESOLVED
//!                  └──────────────▶ ACTIVE ◀────┘                AUTO_CLOSED
//!
//! write failure on any non-terminal record ──▶ FAILED ──requeue──▶ PENDING
//!
//! `create_job` on an existing record only replaces PENDING, IDLE or FAILED.
//! ```

pub mod document;
pub mod state;
pub mod store;

pub use document::{
    DocumentError, DocumentResult, DocumentStore, MemoryDocumentStore, Principal,
    PrincipalSource, StaticPrincipal,
};
pub use state::{EscalationLevel, EscalationState, EscalationStatus, ReportId};
pub use store::{
    EscalationConfig, EscalationError, EscalationResult, EscalationStateStore, EscalationStats,
    FieldMismatch, ScanOutcome, TriggerOutcome,
};
