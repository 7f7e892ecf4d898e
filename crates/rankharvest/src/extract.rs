//! Handle-to-value extraction for ranked entries and comments.
//!
//! Both extractors implement [`ItemExtractor`], so the same ordered worker
//! pool and incremental collector drive either kind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::FeedLayout;
use crate::error::ExtractionFailure;
use crate::live::{LiveView, ViewItemHandle};
use crate::normalize::normalize;
use crate::reveal;
use crate::types::Record;

/// Maps one view handle to a structured value.
///
/// `Ok(None)` means the item exists but carries nothing worth keeping.
#[async_trait]
pub trait ItemExtractor: Send + Sync {
    type Output: Send;

    async fn extract(
        &self,
        view: &dyn LiveView,
        handle: &ViewItemHandle,
    ) -> Result<Option<Self::Output>, ExtractionFailure>;
}

/// Builds a [`Record`] from one ranked-feed entry.
#[derive(Debug, Clone)]
pub struct EntryExtractor {
    layout: Arc<FeedLayout>,
}

impl EntryExtractor {
    pub fn new(layout: Arc<FeedLayout>) -> Self {
        Self { layout }
    }

    /// Extract one entry. Any missing piece drops the whole record.
    pub async fn extract_record(
        &self,
        view: &dyn LiveView,
        handle: &ViewItemHandle,
    ) -> Result<Record, ExtractionFailure> {
        let layout = &self.layout;
        let title = read_required(view, handle, &layout.title_selector, "title").await?;
        let release_year = read_required(view, handle, &layout.year_selector, "year").await?;
        let stats = read_required(view, handle, &layout.stats_selector, "stats").await?;

        let metric_text = metric_segment(&stats, &layout.stats_separator)
            .ok_or_else(|| ExtractionFailure::MissingSeparator(stats.clone()))?;
        let rank_metric = normalize(metric_text)?;

        let detail_reference = view
            .link_targets(handle)
            .await?
            .into_iter()
            .find(|target| target.contains(layout.detail_marker.as_str()))
            .ok_or(ExtractionFailure::MissingDetailReference)?;

        Ok(Record::new(title, release_year, rank_metric, detail_reference))
    }
}

#[async_trait]
impl ItemExtractor for EntryExtractor {
    type Output = Record;

    async fn extract(
        &self,
        view: &dyn LiveView,
        handle: &ViewItemHandle,
    ) -> Result<Option<Record>, ExtractionFailure> {
        self.extract_record(view, handle).await.map(Some)
    }
}

/// Reads comment bodies, revealing spoiler-guarded ones.
#[derive(Debug, Clone)]
pub struct CommentExtractor {
    layout: Arc<FeedLayout>,
    reveal_settle: Duration,
}

impl CommentExtractor {
    pub fn new(layout: Arc<FeedLayout>, reveal_settle: Duration) -> Self {
        Self {
            layout,
            reveal_settle,
        }
    }

    pub async fn extract_comment(
        &self,
        view: &dyn LiveView,
        handle: &ViewItemHandle,
    ) -> Result<Option<String>, ExtractionFailure> {
        let layout = &self.layout;
        let Some(body) = read_trimmed(view, handle, &layout.body_selector).await? else {
            return Ok(None);
        };

        if body == layout.spoiler_placeholder {
            return Ok(reveal::reveal(view, handle, layout, self.reveal_settle).await);
        }
        Ok(Some(body))
    }
}

#[async_trait]
impl ItemExtractor for CommentExtractor {
    type Output = String;

    async fn extract(
        &self,
        view: &dyn LiveView,
        handle: &ViewItemHandle,
    ) -> Result<Option<String>, ExtractionFailure> {
        self.extract_comment(view, handle).await
    }
}

/// The segment after the first separator, trimmed.
fn metric_segment<'a>(stats: &'a str, separator: &str) -> Option<&'a str> {
    stats
        .split(separator)
        .nth(1)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Trimmed text under `sub_selector`; empty text reads as absent.
pub(crate) async fn read_trimmed(
    view: &dyn LiveView,
    handle: &ViewItemHandle,
    sub_selector: &str,
) -> Result<Option<String>, ExtractionFailure> {
    let text = view.read_text(handle, Some(sub_selector)).await?;
    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

async fn read_required(
    view: &dyn LiveView,
    handle: &ViewItemHandle,
    sub_selector: &str,
    field: &'static str,
) -> Result<String, ExtractionFailure> {
    read_trimmed(view, handle, sub_selector)
        .await?
        .ok_or(ExtractionFailure::MissingField(field))
}
