//! Active case identity
//!
//! One case id is active per session. It is allocated by a remote generator
//! (or entered manually), mirrored to durable storage, and restored on the
//! next start.

pub mod allocator;
pub mod case_id;
pub mod error;
pub mod generator;
pub mod storage;

pub use allocator::{IdentityAllocator, IdentityConfig, SCHEMA_VERSION};
pub use case_id::{normalize_surname, CaseIdentity, ExtractedIdentity, IntakeForm};
pub use error::{IdentityError, IdentityResult, StorageError};
pub use generator::{GenerateIdRequest, HttpIdGenerator, IdGenerator, ProjectMetadata};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
