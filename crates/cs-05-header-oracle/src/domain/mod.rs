//! # Domain Layer
//!
//! Header records and the batch of changes one oracle operation produces.
//! No storage access and no locking here.

pub mod record;
pub mod update;

pub use record::{HeaderRecord, HeaderStatus, StoredHeader};
pub use update::{SetDelta, UpdateBatch};
