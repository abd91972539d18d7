//! Orphaned-well reconciliation: merges state orphan lists with a
//! multi-state well tracker, tags each well's lifecycle against a prior
//! report, and derives block-group demographics for the affected areas.

pub mod census;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod storage;

pub use error::{IssueTally, ReconcileError, RecordIssue};
