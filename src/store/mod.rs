//! Reference backing store.
//!
//! [`MemoryStore`] is a small in-memory table that exercises the adapter
//! contract end to end: it runs the pre-create hook before validating a new
//! record, saves whole records, and answers scope queries. [`StoreAdapter`]
//! routes durable state writes through it.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{MemoryStore, RecordId, StoreAdapter, StoredRecord};
