// Action executor boundary
//
// The scheduling core only ever sees this trait: a one-shot side-effecting
// operation against a listing URL that reports an outcome and never faults.

pub mod leboncoin;

use crate::models::Outcome;
use async_trait::async_trait;

pub use leboncoin::LeboncoinExecutor;

/// Performs the actual repost action against a listing.
///
/// Implementations convert every internal failure (missing credentials,
/// control not found, timeouts) into a failed `Outcome`; callers never see
/// an error type. Calls may take unbounded wall-clock time and may carry
/// session state between invocations.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, target: &str) -> Outcome;
}
