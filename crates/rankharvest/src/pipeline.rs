//! Full harvest: ranked entries first, then each entry's comment feed.
//!
//! Nothing inside [`Pipeline::run`] aborts the run. A feed that cannot be
//! opened yields no records; a record whose comment feed cannot be read
//! keeps an empty [`CommentSet`].

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collector::IncrementalCollector;
use crate::config::{FeedLayout, HarvestConfig, COUNT_UNAVAILABLE};
use crate::extract::{CommentExtractor, EntryExtractor};
use crate::live::{LiveView, SessionSource};
use crate::pool::{dispatch_ordered, merge_outcomes};
use crate::progress::{Progress, ProgressEventKind, ProgressSender};
use crate::rank::{rank, RankOrder};
use crate::sanitize::sanitize_or_empty;
use crate::types::{CommentSet, Record};

pub struct Pipeline<S: SessionSource> {
    sessions: S,
    layout: Arc<FeedLayout>,
    config: HarvestConfig,
    progress: Progress,
}

impl<S: SessionSource> Pipeline<S> {
    pub fn new(sessions: S, layout: FeedLayout, config: HarvestConfig) -> Self {
        Self {
            sessions,
            layout: Arc::new(layout),
            config,
            progress: Progress::silent(),
        }
    }

    /// Publish progress events for this pipeline on `tx`.
    pub fn with_progress(mut self, tx: ProgressSender, run_id: impl Into<String>) -> Self {
        self.progress = Progress::new(Some(tx), run_id);
        self
    }

    pub fn layout(&self) -> &FeedLayout {
        &self.layout
    }

    /// Give back the session source, e.g. to shut a browser down.
    pub fn into_sessions(self) -> S {
        self.sessions
    }

    /// Harvest up to `target_records` entries, order them, and attach up to
    /// `target_comments` comments to each.
    pub async fn run(
        &self,
        target_records: usize,
        target_comments: usize,
        order: RankOrder,
    ) -> Vec<Record> {
        let records = rank(self.harvest_entries(target_records).await, order);

        stream::iter(records)
            .map(|record| self.with_comments(record, target_comments))
            .buffered(self.config.record_concurrency.max(1))
            .collect()
            .await
    }

    /// Open a feed session and extract its ranked entries.
    pub async fn harvest_entries(&self, target_records: usize) -> Vec<Record> {
        if target_records == 0 {
            return Vec::new();
        }
        let view = match self.sessions.open().await {
            Ok(view) => view,
            Err(e) => {
                warn!("could not open feed session: {e}");
                self.progress.warn(format!("feed session unavailable: {e}"));
                return Vec::new();
            }
        };
        let records = self.extract_entries(view.as_ref(), target_records).await;
        if let Err(e) = view.close().await {
            debug!("closing feed session failed: {e}");
        }
        records
    }

    /// Extract ranked entries from an already open view, keeping the first
    /// `target_records` successes in feed order.
    pub async fn extract_entries(&self, view: &dyn LiveView, target_records: usize) -> Vec<Record> {
        let layout = &self.layout;
        if let Err(e) = view.navigate_to(&layout.feed_reference).await {
            warn!(feed = %layout.feed_reference, "feed navigation failed: {e}");
            self.progress.warn(format!("feed navigation failed: {e}"));
            return Vec::new();
        }

        let handles = match view.visible_items(&layout.entry_selector).await {
            Ok(handles) => handles,
            Err(e) => {
                warn!("feed poll failed: {e}");
                return Vec::new();
            }
        };

        let extractor = EntryExtractor::new(Arc::clone(layout));
        let outcomes = dispatch_ordered(view, &extractor, &handles, self.config.worker_count).await;
        let (mut records, dropped) = merge_outcomes(outcomes);
        if dropped > 0 {
            warn!(dropped, visible = handles.len(), "dropped unreadable feed entries");
        }
        records.truncate(target_records);

        self.progress.emit(ProgressEventKind::EntriesExtracted {
            visible: handles.len(),
            kept: records.len(),
            dropped,
        });
        records
    }

    async fn with_comments(&self, mut record: Record, target_comments: usize) -> Record {
        let comments = self.collect_comments(&record, target_comments).await;
        record.attach_comments(comments);
        record
    }

    /// Collect one record's comments in a session of its own.
    pub async fn collect_comments(&self, record: &Record, target_comments: usize) -> CommentSet {
        let view = match self.sessions.open().await {
            Ok(view) => view,
            Err(e) => {
                warn!(title = %record.title(), "could not open comment session: {e}");
                return CommentSet::unavailable(None);
            }
        };
        let comments = self
            .collect_comments_in(view.as_ref(), record, target_comments)
            .await;
        if let Err(e) = view.close().await {
            debug!("closing comment session failed: {e}");
        }
        comments
    }

    /// Collect one record's comments using an already open view.
    pub async fn collect_comments_in(
        &self,
        view: &dyn LiveView,
        record: &Record,
        target_comments: usize,
    ) -> CommentSet {
        let layout = &self.layout;
        let started = Instant::now();

        if let Err(e) = view.navigate_to(record.detail_reference()).await {
            warn!(title = %record.title(), "detail navigation failed: {e}");
            self.progress
                .warn(format!("{}: detail view unavailable", record.title()));
            return CommentSet::unavailable(None);
        }
        let count_label = self.read_count_label(view).await;

        let source = layout.comment_reference(record.detail_reference());
        if let Err(e) = view.navigate_to(&source).await {
            warn!(title = %record.title(), "comment feed navigation failed: {e}");
            self.progress
                .warn(format!("{}: comment feed unavailable", record.title()));
            return CommentSet::unavailable(count_label);
        }

        let extractor = CommentExtractor::new(
            Arc::clone(layout),
            Duration::from_millis(self.config.reveal_settle_ms),
        );
        let collection = IncrementalCollector::new(
            view,
            &extractor,
            &layout.comment_selector,
            self.config.collector(target_comments),
        )
        .collect()
        .await;

        info!(
            title = %record.title(),
            collected = collection.items.len(),
            polls = collection.polls,
            failures = collection.failures,
            "comments collected ({})",
            collection.stop_reason
        );
        self.progress.emit(ProgressEventKind::CollectionFinished {
            title: record.title().to_string(),
            collected: collection.items.len(),
            stop_reason: collection.stop_reason,
            polls: collection.polls,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });

        CommentSet {
            total_count_label: count_label.unwrap_or_else(|| COUNT_UNAVAILABLE.to_string()),
            source_reference: Some(source),
            items: sanitize_or_empty(collection.items),
        }
    }

    async fn read_count_label(&self, view: &dyn LiveView) -> Option<String> {
        let handles = view
            .visible_items(&self.layout.count_label_selector)
            .await
            .ok()?;
        let first = handles.first()?;
        view.read_text(first, None)
            .await
            .ok()
            .flatten()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
