//! Shared parcel-tracking domain primitives.
//!
//! This crate owns request/response contracts, persisted record shapes, the
//! route sequencing heuristic, and notification formatting. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod notification;
pub mod records;
pub mod routing;
pub mod storage_keys;
