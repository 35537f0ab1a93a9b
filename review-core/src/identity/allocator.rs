//! Process-wide active case id
//!
//! `IdentityAllocator` owns the in-memory value. A single mirror task owns
//! the durable copy: it hydrates once at startup, then applies write
//! commands in the order the mutations happened.
//!
//! ```text
//!  generate / set_active / reset
//!        │ (state lock held)
//!        ├──▶ RwLock<SessionState>   full-value replace
//!        └──▶ mpsc ──▶ mirror task ──▶ KeyValueStore
//!                        │
//!                        └─ hydrate first, then ready = true
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::case_id::{CaseIdentity, ExtractedIdentity, IntakeForm};
use super::error::{IdentityError, IdentityResult, StorageError};
use super::generator::{GenerateIdRequest, IdGenerator, ProjectMetadata};
use super::storage::KeyValueStore;

/// Bumped whenever the stored id format changes. A stored id written under
/// another version is discarded on hydration.
pub const SCHEMA_VERSION: &str = "2";

static GLOBAL: OnceLock<Arc<IdentityAllocator>> = OnceLock::new();

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub generator_url: String,
    pub request_timeout_secs: u64,
    /// Durable key holding the active id.
    pub storage_key: String,
    /// Backing file for `FileKeyValueStore`.
    pub storage_path: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            generator_url: "http://localhost:8080/generate_project_id".to_string(),
            request_timeout_secs: 30,
            storage_key: "RPR_ACTIVE_PROJECT_ID".to_string(),
            storage_path: PathBuf::from(".review/identity.json"),
        }
    }
}

impl IdentityConfig {
    pub fn schema_key(&self) -> String {
        format!("{}.schema", self.storage_key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug, Default)]
struct SessionState {
    active: Option<CaseIdentity>,
    extracted: Option<ExtractedIdentity>,
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<SessionState>,
    /// Count of active-id mutations since construction. Hydration only
    /// applies while this is zero.
    mutations: AtomicU64,
}

enum MirrorCommand {
    Write(Option<CaseIdentity>),
    Flush(oneshot::Sender<()>),
}

struct Mirror {
    store: Arc<dyn KeyValueStore>,
    key: String,
    schema_key: String,
}

impl Mirror {
    async fn run(
        self,
        shared: Arc<Shared>,
        mut commands: mpsc::UnboundedReceiver<MirrorCommand>,
        ready: watch::Sender<bool>,
    ) {
        self.hydrate(&shared).await;
        ready.send_replace(true);

        while let Some(command) = commands.recv().await {
            match command {
                MirrorCommand::Write(value) => self.write(value.as_ref()).await,
                MirrorCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!(key = %self.key, "Identity mirror stopped");
    }

    async fn hydrate(&self, shared: &Shared) {
        let stored = match self.read_stored().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Identity hydration failed, starting empty");
                return;
            }
        };
        let Some(id) = stored else {
            debug!(key = %self.key, "No stored case id");
            return;
        };

        let mut state = shared.state.write().unwrap_or_else(PoisonError::into_inner);
        if shared.mutations.load(Ordering::SeqCst) == 0 {
            debug!(case_id = %id, "Hydrated case id from storage");
            state.active = Some(id);
        } else {
            debug!(case_id = %id, "Stored case id superseded before hydration");
        }
    }

    async fn read_stored(&self) -> Result<Option<CaseIdentity>, StorageError> {
        let marker = self.store.get(&self.schema_key).await?;
        if marker.as_deref() != Some(SCHEMA_VERSION) {
            info!(
                found = ?marker,
                expected = SCHEMA_VERSION,
                "Identity schema changed, discarding stored case id"
            );
            self.store.remove(&self.key).await?;
            self.store.set(&self.schema_key, SCHEMA_VERSION).await?;
            return Ok(None);
        }

        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        match CaseIdentity::parse(&raw) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                warn!(value = %raw, error = %e, "Discarding unreadable stored case id");
                self.store.remove(&self.key).await?;
                Ok(None)
            }
        }
    }

    async fn write(&self, value: Option<&CaseIdentity>) {
        let result = match value {
            Some(id) => self.store.set(&self.key, id.as_str()).await,
            None => self.store.remove(&self.key).await,
        };
        match result {
            Ok(()) => debug!(
                key = %self.key,
                value = ?value.map(CaseIdentity::as_str),
                "Mirrored case id"
            ),
            Err(e) => warn!(key = %self.key, error = %e, "Case id mirror write failed"),
        }
    }
}

// ============================================================================
// Allocator
// ============================================================================

/// Holds the single active case id for the session.
pub struct IdentityAllocator {
    shared: Arc<Shared>,
    generator: Arc<dyn IdGenerator>,
    mirror: mpsc::UnboundedSender<MirrorCommand>,
    ready: watch::Receiver<bool>,
}

impl IdentityAllocator {
    /// Build a private allocator and spawn its mirror task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        generator: Arc<dyn IdGenerator>,
        config: &IdentityConfig,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = watch::channel(false);

        let mirror = Mirror {
            store,
            key: config.storage_key.clone(),
            schema_key: config.schema_key(),
        };
        tokio::spawn(mirror.run(Arc::clone(&shared), rx, ready_tx));

        Self {
            shared,
            generator,
            mirror: tx,
            ready: ready_rx,
        }
    }

    /// The process-wide allocator. `init` runs at most once per process;
    /// every later call returns the same instance and drops its closure.
    ///
    /// The mirror task lives on the runtime that ran `init`.
    pub fn global_or_init<F>(init: F) -> Arc<Self>
    where
        F: FnOnce() -> IdentityAllocator,
    {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(init())))
    }

    pub fn global() -> Option<Arc<Self>> {
        GLOBAL.get().cloned()
    }

    /// Allocate a new case id dated today in UTC.
    pub async fn generate(&self, form: &IntakeForm) -> IdentityResult<CaseIdentity> {
        self.generate_on(form, Utc::now().date_naive()).await
    }

    /// Allocate a new case id for `reference_date`. On success it replaces
    /// the active id. On failure the active id is untouched and the caller
    /// should fall back to manual entry.
    pub async fn generate_on(
        &self,
        form: &IntakeForm,
        reference_date: NaiveDate,
    ) -> IdentityResult<CaseIdentity> {
        if form.last_name.trim().is_empty() {
            return Err(IdentityError::invalid(&form.last_name, "last name is required"));
        }

        let request = GenerateIdRequest::from_form(form, reference_date);
        let outcome = match self.generator.generate(&request).await {
            Ok(metadata) => accept(metadata),
            Err(e @ IdentityError::AllocationFailure { .. }) => Err(e),
            Err(e) => Err(IdentityError::allocation(e.to_string())),
        };

        match outcome {
            Ok(id) => {
                self.update(|state| state.active = Some(id.clone()));
                info!(case_id = %id, reference_date = %request.reference_date, "Case id allocated");
                Ok(id)
            }
            Err(e) => {
                error!(last_name = %form.last_name, error = %e, "Case id allocation failed");
                Err(e)
            }
        }
    }

    /// Clear the active and extracted identities. Idempotent.
    pub fn reset(&self) {
        self.update(|state| {
            state.active = None;
            state.extracted = None;
        });
        info!("Case id reset");
    }

    /// Adopt an id from elsewhere (manual entry, a reopened case).
    pub fn set_active(&self, id: CaseIdentity) {
        info!(case_id = %id, "Case id set");
        self.update(|state| state.active = Some(id));
    }

    pub fn has_active(&self) -> bool {
        self.read(|state| state.active.is_some())
    }

    pub fn current(&self) -> Option<CaseIdentity> {
        self.read(|state| state.active.clone())
    }

    /// Not mirrored. Does not block hydration of the active id.
    pub fn set_extracted_identity(&self, extracted: Option<ExtractedIdentity>) {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        state.extracted = extracted;
    }

    pub fn extracted_identity(&self) -> Option<ExtractedIdentity> {
        self.read(|state| state.extracted.clone())
    }

    /// Resolves once hydration from storage has finished.
    pub async fn ready(&self) {
        let mut ready = self.ready.clone();
        // Err means the mirror task is gone; nothing left to wait for.
        let _ = ready.wait_for(|done| *done).await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once every mirror write queued before this call is applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.mirror.send(MirrorCommand::Flush(ack)).is_err() {
            return;
        }
        let _ = done.await;
    }

    fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*state)
    }

    /// Apply `f` and queue exactly one mirror write, both under the lock so
    /// the mirror sees writes in memory order.
    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *state);
        self.shared.mutations.fetch_add(1, Ordering::SeqCst);
        if self
            .mirror
            .send(MirrorCommand::Write(state.active.clone()))
            .is_err()
        {
            warn!("Case id mirror is not running, change kept in memory only");
        }
    }
}

fn accept(metadata: ProjectMetadata) -> IdentityResult<CaseIdentity> {
    let raw = metadata
        .project_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| IdentityError::allocation("response has no project_id"))?;
    CaseIdentity::parse(&raw)
        .map_err(|e| IdentityError::allocation(format!("unusable project_id: {}", e)))
}

impl std::fmt::Debug for IdentityAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityAllocator")
            .field("active", &self.current())
            .field("ready", &self.is_ready())
            .finish()
    }
}
