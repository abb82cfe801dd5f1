//! Bounded-concurrency fan-out for per-item detail lookups.
//!
//! [`enrich_all`] runs one fetch per key with at most `concurrency` requests
//! in flight. Fetches complete in any order; each outcome is tagged with the
//! index of its key and the tags restore input order before returning. A
//! failed fetch is reported for its own key only.

use futures::stream::{self, StreamExt};
use std::future::Future;

use crate::error::UpstreamError;

/// Hard ceiling on simultaneous detail requests.
pub const MAX_IN_FLIGHT: usize = 50;

/// Fetch details for every key, returning one outcome per key in input order.
///
/// `concurrency` is clamped to `1..=MAX_IN_FLIGHT`. Nothing is retried.
pub async fn enrich_all<T, F, Fut>(
    keys: Vec<String>,
    concurrency: usize,
    fetch: F,
) -> Vec<(String, Result<T, UpstreamError>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let limit = concurrency.clamp(1, MAX_IN_FLIGHT);

    let mut tagged: Vec<(usize, Result<T, UpstreamError>)> =
        stream::iter(keys.iter().cloned().enumerate())
            .map(|(index, key)| {
                let pending = fetch(key);
                async move { (index, pending.await) }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

    tagged.sort_unstable_by_key(|(index, _)| *index);

    keys.into_iter()
        .zip(tagged.into_iter().map(|(_, outcome)| outcome))
        .collect()
}
