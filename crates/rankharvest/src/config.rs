//! Feed layout and tuning configuration.
//!
//! [`FeedLayout`] names where things live inside the feed; it deserializes
//! from partial JSON, falling back to the built-in Watcha Pedia layout for
//! any field left out. [`HarvestConfig`] carries the concurrency and timing
//! constants passed into a pipeline run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Default number of concurrent extraction tasks per comment feed.
pub const DEFAULT_WORKER_COUNT: usize = 5;
/// Default wait after a scroll before the feed is polled again.
pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 500;
/// Default wait after a reveal click before the body is re-read.
pub const DEFAULT_REVEAL_SETTLE_MS: u64 = 1_000;

/// Label recorded when the feed does not report a comment total.
pub const COUNT_UNAVAILABLE: &str = "unavailable";

/// Selectors and markers describing one ranked feed and its comment views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLayout {
    /// Where the ranked feed lives.
    pub feed_reference: String,
    /// Overlay close button clicked after navigation, if any.
    pub overlay_dismiss: Option<String>,

    pub entry_selector: String,
    pub title_selector: String,
    pub year_selector: String,
    pub stats_selector: String,
    /// Glyph separating the share label from the audience label.
    pub stats_separator: String,
    /// Substring identifying the detail-page link among an entry's links.
    pub detail_marker: String,

    /// Element on the detail page holding the total comment label.
    pub count_label_selector: String,
    /// Appended to a detail reference to reach its comment feed.
    pub comment_suffix: String,
    pub comment_selector: String,
    pub body_selector: String,
    /// Body text shown in place of a comment hidden behind a spoiler guard.
    pub spoiler_placeholder: String,
    /// Visible label substring of the control that reveals a hidden comment.
    pub reveal_label: String,
}

impl Default for FeedLayout {
    fn default() -> Self {
        Self {
            feed_reference: "https://pedia.watcha.com/ko-KR/?domain=movie".to_string(),
            overlay_dismiss: Some("button.a3VOQo6v.Fxip6vYZ.bmNDNA_p".to_string()),
            entry_selector: "li.zK9dEEA5.w_exposed_cell".to_string(),
            title_selector: "div.Rw9JYf2r.MasrfAn6".to_string(),
            year_selector: "div.WWPgNOuc.KYbG4TeN".to_string(),
            stats_selector: "div.VWL8zgFg.RiDHrQhO".to_string(),
            stats_separator: "・".to_string(),
            detail_marker: "/contents/".to_string(),
            count_label_selector: "a[href$='/comments'] span".to_string(),
            comment_suffix: "/comments".to_string(),
            comment_selector: "div.w_exposed_cell".to_string(),
            body_selector: "a > div:nth-of-type(2) span".to_string(),
            spoiler_placeholder: "스포일러가 있어요!!".to_string(),
            reveal_label: "보기".to_string(),
        }
    }
}

impl FeedLayout {
    /// Comment feed reference for a record's detail reference.
    pub fn comment_reference(&self, detail_reference: &str) -> String {
        format!(
            "{}{}",
            detail_reference.trim_end_matches('/'),
            self.comment_suffix
        )
    }
}

/// Concurrency and timing constants for a harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Concurrent extraction tasks per feed snapshot.
    pub worker_count: usize,
    /// Records whose comment feeds are collected at the same time.
    pub record_concurrency: usize,
    pub scroll_settle_ms: u64,
    pub reveal_settle_ms: u64,
    /// Wall-clock budget for one record's comment collection.
    pub record_budget_ms: Option<u64>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            record_concurrency: 1,
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
            reveal_settle_ms: DEFAULT_REVEAL_SETTLE_MS,
            record_budget_ms: None,
        }
    }
}

impl HarvestConfig {
    /// Collector settings for one feed, with the deadline starting now.
    pub fn collector(&self, target_count: usize) -> CollectorConfig {
        CollectorConfig {
            target_count,
            worker_count: self.worker_count.max(1),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            reveal_settle: Duration::from_millis(self.reveal_settle_ms),
            deadline: self
                .record_budget_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }
}

/// Settings for one incremental collection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Cap on collected items.
    pub target_count: usize,
    pub worker_count: usize,
    pub scroll_settle: Duration,
    pub reveal_settle: Duration,
    /// Checked at the top of each poll; the loop returns what it has.
    pub deadline: Option<Instant>,
}

impl CollectorConfig {
    pub fn new(target_count: usize) -> Self {
        HarvestConfig::default().collector(target_count)
    }
}
