//! Call-scoped context store shared by the stages of a phone call.
//!
//! Stages never talk to each other directly; each one reads and writes the
//! caller's context through a [`ContextManager`] keyed by call id.

pub mod cleanup;
pub mod error;
pub mod expiry;
pub mod handoff;
pub mod model;
pub mod store;

/// Periodic cleanup task.
pub use cleanup::{CleanupTask, spawn_cleanup_task};
/// Context error type.
pub use error::ContextError;
/// Clock and expiry policy.
pub use expiry::{Clock, ExpiryAnchor, ExpiryPolicy, SystemClock};
/// Stage hand-off helpers.
pub use handoff::{CallerDetails, IntakeOutcome, record_intake, resume_for_stage};
/// Context record model.
pub use model::ContextRecord;
/// Store contract, backends and facade.
pub use store::{
    ContextManager, ContextStore, InMemoryContextStore, SqliteContextStore, StoreKind,
    StoreSelection,
};
