//! Incremental collection over an infinitely scrolling feed.
//!
//! Each cycle polls the view, dispatches the handles beyond the already
//! seen offset to the worker pool, merges results in handle order, scrolls,
//! and compares the scrollable extent before and after. The feed only grows
//! at its tail, so an offset is enough to tell new items from seen ones.
//!
//! The loop ends when the cap is reached, the extent stops growing, the
//! view goes away, or the optional deadline passes. Whatever was collected
//! up to that point is returned.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::CollectorConfig;
use crate::extract::ItemExtractor;
use crate::live::LiveView;
use crate::pool::{dispatch_ordered, merge_outcomes};

/// Why a collection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// The configured cap was reached.
    TargetReached,
    /// A scroll produced no growth.
    FeedExhausted,
    /// The view failed to poll, scroll or report its extent.
    ViewGone,
    /// The deadline passed before the next poll.
    DeadlineElapsed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => write!(f, "target reached"),
            Self::FeedExhausted => write!(f, "feed exhausted"),
            Self::ViewGone => write!(f, "view gone"),
            Self::DeadlineElapsed => write!(f, "deadline elapsed"),
        }
    }
}

/// Result of one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    /// Discovery order, at most `target_count` long.
    pub items: Vec<T>,
    pub stop_reason: StopReason,
    /// Poll cycles started.
    pub polls: usize,
    /// Handles whose extraction failed.
    pub failures: usize,
}

/// Loop state. Only the coordinator touches it.
struct CollectionState<T> {
    seen_count: usize,
    result_height: u64,
    items: Vec<T>,
    polls: usize,
    failures: usize,
}

impl<T> CollectionState<T> {
    fn new() -> Self {
        Self {
            seen_count: 0,
            result_height: 0,
            items: Vec::new(),
            polls: 0,
            failures: 0,
        }
    }

    fn finish(mut self, stop_reason: StopReason, target_count: usize) -> Collection<T> {
        self.items.truncate(target_count);
        Collection {
            items: self.items,
            stop_reason,
            polls: self.polls,
            failures: self.failures,
        }
    }
}

/// Drives one feed to completion with a given extractor.
pub struct IncrementalCollector<'a, E: ItemExtractor> {
    view: &'a dyn LiveView,
    extractor: &'a E,
    selector: &'a str,
    config: CollectorConfig,
}

impl<'a, E: ItemExtractor> IncrementalCollector<'a, E> {
    pub fn new(
        view: &'a dyn LiveView,
        extractor: &'a E,
        selector: &'a str,
        config: CollectorConfig,
    ) -> Self {
        Self {
            view,
            extractor,
            selector,
            config,
        }
    }

    pub async fn collect(&self) -> Collection<E::Output> {
        let target = self.config.target_count;
        let mut state = CollectionState::new();

        if target == 0 {
            return state.finish(StopReason::TargetReached, target);
        }

        state.result_height = match self.view.scrollable_extent().await {
            Ok(height) => height,
            Err(e) => {
                warn!(selector = self.selector, "initial extent unavailable: {e}");
                return state.finish(StopReason::ViewGone, target);
            }
        };

        loop {
            if self
                .config
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
            {
                debug!(collected = state.items.len(), "collection deadline elapsed");
                return state.finish(StopReason::DeadlineElapsed, target);
            }
            state.polls += 1;

            // Polling
            let visible = match self.view.visible_items(self.selector).await {
                Ok(visible) => visible,
                Err(e) => {
                    warn!(selector = self.selector, "poll failed: {e}");
                    return state.finish(StopReason::ViewGone, target);
                }
            };
            if visible.len() < state.seen_count {
                warn!(
                    visible = visible.len(),
                    seen = state.seen_count,
                    "feed shrank between polls"
                );
            }
            let fresh = visible.get(state.seen_count..).unwrap_or_default();

            // Dispatching
            let outcomes =
                dispatch_ordered(self.view, self.extractor, fresh, self.config.worker_count)
                    .await;
            state.seen_count += fresh.len();
            let (kept, failed) = merge_outcomes(outcomes);
            state.failures += failed;
            state.items.extend(kept);
            debug!(
                poll = state.polls,
                dispatched = fresh.len(),
                collected = state.items.len(),
                "poll cycle"
            );

            if state.items.len() >= target {
                return state.finish(StopReason::TargetReached, target);
            }

            // Scrolling
            if let Err(e) = self.view.scroll_to_bottom().await {
                warn!(selector = self.selector, "scroll failed: {e}");
                return state.finish(StopReason::ViewGone, target);
            }
            tokio::time::sleep(self.config.scroll_settle).await;

            let height = match self.view.scrollable_extent().await {
                Ok(height) => height,
                Err(e) => {
                    warn!(selector = self.selector, "extent unavailable: {e}");
                    return state.finish(StopReason::ViewGone, target);
                }
            };
            if height <= state.result_height {
                return state.finish(StopReason::FeedExhausted, target);
            }
            state.result_height = height;
        }
    }
}
