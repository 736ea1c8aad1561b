//! Ports to the managed services and their implementations.

use std::future::Future;

pub mod dynamodb;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod queue;
pub mod sns;
pub mod sqs;
pub mod store;
pub mod topic;

/// Runs an SDK future from the synchronous ports. Needs the multi-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
