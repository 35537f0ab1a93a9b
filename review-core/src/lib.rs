//! Review core
//!
//! Backend core for deposit-evidence review:
//!
//! - [`identity`]: the single active case id per session, allocated remotely
//!   and mirrored to durable storage
//! - [`escalation`]: per-report lifecycle records in a document store
//! - [`quality`]: blur/rotation heuristics and a 0-100 usability score
//! - [`projection`]: one dashboard row from an escalation and its quality
//!
//! Collaborators (id generator, key-value mirror, document store, principal
//! source) are traits so callers bring their own backends.

pub mod config;
pub mod escalation;
pub mod identity;
pub mod projection;
pub mod quality;

pub use config::{ConfigError, ReviewConfig};
pub use escalation::{
    EscalationConfig, EscalationError, EscalationLevel, EscalationState, EscalationStateStore,
    EscalationStatus,
};
pub use identity::{CaseIdentity, IdentityAllocator, IdentityConfig, IdentityError, IntakeForm};
pub use projection::{EscalationRowUI, RowProjection};
pub use quality::{QualityAnalysisResult, QualityAnalyzer, QualityThresholds};
