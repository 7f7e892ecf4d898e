//! Bounded fan-out over view handles with results kept in dispatch order.

use futures::stream::{self, StreamExt};

use crate::error::ExtractionFailure;
use crate::extract::ItemExtractor;
use crate::live::{LiveView, ViewItemHandle};

/// Outcome of extracting one handle.
pub type Extraction<T> = Result<Option<T>, ExtractionFailure>;

/// Run `extractor` over `handles` with at most `worker_count` in flight.
///
/// Slot `i` of the result belongs to `handles[i]` regardless of which task
/// finished first.
pub async fn dispatch_ordered<E>(
    view: &dyn LiveView,
    extractor: &E,
    handles: &[ViewItemHandle],
    worker_count: usize,
) -> Vec<Extraction<E::Output>>
where
    E: ItemExtractor + ?Sized,
{
    stream::iter(handles.iter())
        .map(|handle| extractor.extract(view, handle))
        .buffered(worker_count.max(1))
        .collect()
        .await
}

/// Split ordered outcomes into kept values and a failure count.
///
/// `Ok(None)` is neither kept nor counted.
pub fn merge_outcomes<T>(outcomes: Vec<Extraction<T>>) -> (Vec<T>, usize) {
    let mut kept = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            Ok(Some(value)) => kept.push(value),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("extraction failed: {e}");
                failed += 1;
            }
        }
    }
    (kept, failed)
}
