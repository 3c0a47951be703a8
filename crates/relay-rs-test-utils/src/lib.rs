//! Test helpers shared across relay crates.

pub mod clock;
pub mod records;
pub mod store;

pub use clock::ManualClock;
pub use records::{sample_record, unique_call_id};
pub use store::{FailingStore, ReadOnlyStore};
