//! Record store for the schedule collection.
//!
//! This module provides the `RecordStore`, the single authority over the
//! persisted schedule collection. Every mutation is a read-modify-write of
//! the whole JSON blob; there is no partial update.

pub mod records;

pub use records::{LoadStatus, RecordFilter, RecordStore, StoreError};
