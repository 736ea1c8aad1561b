//! AWS-oriented adapters and handlers for the parcel tracking service.
//!
//! This crate owns runtime integration details (Lambda handlers, DynamoDB,
//! SQS and SNS adapters, configuration, logging) and exposes a single runtime
//! module boundary for the contract, record, routing, and storage key
//! primitives of `parcel_tracking_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod runtime;
pub mod telemetry;
