//! Data models for schedule entries.
//!
//! The on-disk vocabulary (`mataKuliah`, `hari`, `jam`, `ruang`) is kept
//! compatible with the original web app's localStorage blob and CSV files,
//! so data exported from it loads here unchanged.

pub mod schedule;

pub use schedule::{RecordDraft, ScheduleRecord, Weekday};
