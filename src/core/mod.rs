//! Core data layer - framework-agnostic operations over the local database.
//!
//! Every function takes the connection explicitly; nothing here caches rows, so
//! each call reads the current state of the store.

/// Full backup export/import
pub mod backup;
/// Employer repository
pub mod employer;
/// Helpers shared by the employer and worker repositories
pub mod person;
/// Per-day record bucketing
pub mod record;
/// Income/expense aggregation
pub mod stats;
/// KST timestamps and calendar-day parsing
pub mod timestamp;
/// Transaction repository
pub mod transaction;
/// Soft-delete view, restore and permanent deletion
pub mod trash;
/// Worker repository
pub mod worker;
