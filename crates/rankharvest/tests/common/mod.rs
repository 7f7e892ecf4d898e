//! Scripted in-memory live view for collector and pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rankharvest::error::{ViewError, ViewResult};
use rankharvest::live::{handles_for, LiveView, SessionSource, ViewItemHandle};
use rankharvest::{FeedLayout, HarvestConfig};

pub const FEED: &str = "feed://box-office";
pub const PLACEHOLDER: &str = "스포일러가 있어요!!";
pub const REVEAL_LABEL: &str = "보기";

/// Layout with short selectors matching the fixtures below.
pub fn test_layout() -> FeedLayout {
    FeedLayout {
        feed_reference: FEED.to_string(),
        overlay_dismiss: None,
        entry_selector: "li.entry".to_string(),
        title_selector: ".title".to_string(),
        year_selector: ".year".to_string(),
        stats_selector: ".stats".to_string(),
        stats_separator: "・".to_string(),
        detail_marker: "/contents/".to_string(),
        count_label_selector: ".count".to_string(),
        comment_suffix: "/comments".to_string(),
        comment_selector: "div.comment".to_string(),
        body_selector: ".body".to_string(),
        spoiler_placeholder: PLACEHOLDER.to_string(),
        reveal_label: REVEAL_LABEL.to_string(),
    }
}

/// Harvest config with no settle waits.
pub fn fast_config() -> HarvestConfig {
    HarvestConfig {
        scroll_settle_ms: 0,
        reveal_settle_ms: 0,
        ..HarvestConfig::default()
    }
}

// ── Fixtures ──

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    own_text: Option<String>,
    texts: HashMap<String, String>,
    links: Vec<String>,
    reveal: Option<FakeReveal>,
}

#[derive(Debug, Clone)]
struct FakeReveal {
    control_label: String,
    revealed: Option<String>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn own(mut self, text: &str) -> Self {
        self.own_text = Some(text.to_string());
        self
    }

    pub fn text(mut self, sub_selector: &str, text: &str) -> Self {
        self.texts.insert(sub_selector.to_string(), text.to_string());
        self
    }

    pub fn link(mut self, href: &str) -> Self {
        self.links.push(href.to_string());
        self
    }

    /// A reveal control; activating it replaces `.body` with `revealed`,
    /// or removes the body when `revealed` is `None`.
    pub fn reveal(mut self, control_label: &str, revealed: Option<&str>) -> Self {
        self.reveal = Some(FakeReveal {
            control_label: control_label.to_string(),
            revealed: revealed.map(str::to_string),
        });
        self
    }
}

pub fn entry(title: &str, stats: &str, href: &str) -> FakeElement {
    FakeElement::new()
        .text(".title", title)
        .text(".year", "2024 · 한국")
        .text(".stats", stats)
        .link("/ko-KR/users/someone")
        .link(href)
}

pub fn comment(body: &str) -> FakeElement {
    FakeElement::new().text(".body", body)
}

pub fn comments(prefix: &str, n: usize) -> Vec<FakeElement> {
    (0..n).map(|i| comment(&format!("{prefix}-{i}"))).collect()
}

pub fn spoiler(revealed: Option<&str>) -> FakeElement {
    comment(PLACEHOLDER).reveal("스포일러 보기", revealed)
}

#[derive(Debug, Clone)]
pub struct FakeFeed {
    elements: Vec<FakeElement>,
    rendered: usize,
    step: usize,
}

impl FakeFeed {
    /// Everything rendered up front; scrolling adds nothing.
    pub fn fixed(elements: Vec<FakeElement>) -> Self {
        let rendered = elements.len();
        Self {
            elements,
            rendered,
            step: 0,
        }
    }

    /// `initial` rendered, `step` more per scroll.
    pub fn scrolling(elements: Vec<FakeElement>, initial: usize, step: usize) -> Self {
        let rendered = initial.min(elements.len());
        Self {
            elements,
            rendered,
            step,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    feeds: HashMap<String, FakeFeed>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, selector: &str, feed: FakeFeed) -> Self {
        self.feeds.insert(selector.to_string(), feed);
        self
    }

    fn extent(&self) -> u64 {
        1_000 + self.feeds.values().map(|f| f.rendered as u64 * 100).sum::<u64>()
    }
}

/// Counters shared by every session of one site.
#[derive(Debug, Default)]
pub struct ViewStats {
    pub polls: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub activations: AtomicUsize,
    pub stale_reads: AtomicUsize,
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// `(generation, index)` of every body read.
    pub body_reads: Mutex<Vec<(u64, usize)>>,
}

impl ViewStats {
    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn body_reads(&self) -> Vec<(u64, usize)> {
        self.body_reads.lock().unwrap().clone()
    }
}

// ── View ──

struct ViewState {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    polls: usize,
}

pub struct FakeView {
    state: Mutex<ViewState>,
    generation: AtomicU64,
    stats: Arc<ViewStats>,
    fail_polls_after: Option<usize>,
}

impl FakeView {
    pub fn new(pages: HashMap<String, FakePage>, stats: Arc<ViewStats>) -> Self {
        Self {
            state: Mutex::new(ViewState {
                pages,
                current: None,
                polls: 0,
            }),
            generation: AtomicU64::new(0),
            stats,
            fail_polls_after: None,
        }
    }

    /// A view already showing `page`.
    pub fn showing(page: FakePage) -> Self {
        let view = Self::new(
            HashMap::from([("page".to_string(), page)]),
            Arc::new(ViewStats::default()),
        );
        view.state.lock().unwrap().current = Some("page".to_string());
        view
    }

    /// Polls beyond the first `n` report the page as gone.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_polls_after = Some(n);
        self
    }

    pub fn stats(&self) -> &Arc<ViewStats> {
        &self.stats
    }

    fn check_generation(&self, handle: &ViewItemHandle) -> ViewResult<()> {
        let current = self.generation.load(Ordering::SeqCst);
        if handle.generation() != current {
            self.stats.stale_reads.fetch_add(1, Ordering::SeqCst);
            return Err(ViewError::StaleHandle {
                handle: handle.generation(),
                current,
            });
        }
        Ok(())
    }

    fn with_element<R>(
        &self,
        handle: &ViewItemHandle,
        f: impl FnOnce(&mut FakeElement) -> R,
    ) -> ViewResult<Option<R>> {
        let mut state = self.state.lock().unwrap();
        let key = state
            .current
            .clone()
            .ok_or_else(|| ViewError::Gone("no page loaded".into()))?;
        let page = state
            .pages
            .get_mut(&key)
            .ok_or_else(|| ViewError::Gone(key.clone()))?;
        Ok(page
            .feeds
            .get_mut(handle.selector())
            .filter(|feed| handle.index() < feed.rendered)
            .and_then(|feed| feed.elements.get_mut(handle.index()))
            .map(f))
    }
}

#[async_trait]
impl LiveView for FakeView {
    async fn visible_items(&self, selector: &str) -> ViewResult<Vec<ViewItemHandle>> {
        self.stats.polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        if self.fail_polls_after.is_some_and(|n| state.polls > n) {
            return Err(ViewError::Gone("page closed".into()));
        }
        let key = state
            .current
            .clone()
            .ok_or_else(|| ViewError::Gone("no page loaded".into()))?;
        let count = state
            .pages
            .get(&key)
            .and_then(|page| page.feeds.get(selector))
            .map_or(0, |feed| feed.rendered);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(handles_for(selector, count, generation))
    }

    async fn scroll_to_bottom(&self) -> ViewResult<()> {
        self.stats.scrolls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let key = state
            .current
            .clone()
            .ok_or_else(|| ViewError::Gone("no page loaded".into()))?;
        if let Some(page) = state.pages.get_mut(&key) {
            for feed in page.feeds.values_mut() {
                feed.rendered = (feed.rendered + feed.step).min(feed.elements.len());
            }
        }
        Ok(())
    }

    async fn scrollable_extent(&self) -> ViewResult<u64> {
        let state = self.state.lock().unwrap();
        let key = state
            .current
            .as_ref()
            .ok_or_else(|| ViewError::Gone("no page loaded".into()))?;
        Ok(state.pages.get(key).map_or(0, FakePage::extent))
    }

    async fn read_text(
        &self,
        handle: &ViewItemHandle,
        sub_selector: Option<&str>,
    ) -> ViewResult<Option<String>> {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check_generation(handle)?;
        if sub_selector == Some(".body") {
            self.stats
                .body_reads
                .lock()
                .unwrap()
                .push((handle.generation(), handle.index()));
        }
        let text = self.with_element(handle, |el| match sub_selector {
            None => el.own_text.clone(),
            Some(sub) => el.texts.get(sub).cloned(),
        })?;
        Ok(text.flatten())
    }

    async fn link_targets(&self, handle: &ViewItemHandle) -> ViewResult<Vec<String>> {
        self.check_generation(handle)?;
        Ok(self
            .with_element(handle, |el| el.links.clone())?
            .unwrap_or_default())
    }

    async fn activate(&self, handle: &ViewItemHandle, label: &str) -> ViewResult<bool> {
        self.stats.activations.fetch_add(1, Ordering::SeqCst);
        self.check_generation(handle)?;
        let activated = self.with_element(handle, |el| match el.reveal.clone() {
            Some(reveal) if reveal.control_label.contains(label) => {
                match reveal.revealed {
                    Some(text) => {
                        el.texts.insert(".body".to_string(), text);
                    }
                    None => {
                        el.texts.remove(".body");
                    }
                }
                true
            }
            _ => false,
        })?;
        Ok(activated.unwrap_or(false))
    }

    async fn navigate_to(&self, reference: &str) -> ViewResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.pages.contains_key(reference) {
            return Err(ViewError::Navigation(format!("no page at {reference}")));
        }
        state.current = Some(reference.to_string());
        Ok(())
    }

    async fn close(self: Box<Self>) -> ViewResult<()> {
        self.stats.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Sessions ──

/// Every `open` yields a fresh view over the same site.
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    pub stats: Arc<ViewStats>,
    refuse_sessions: bool,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            stats: Arc::new(ViewStats::default()),
            refuse_sessions: false,
        }
    }

    pub fn page(mut self, reference: &str, page: FakePage) -> Self {
        self.pages.insert(reference.to_string(), page);
        self
    }

    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }
}

#[async_trait]
impl SessionSource for FakeSite {
    async fn open(&self) -> ViewResult<Box<dyn LiveView>> {
        if self.refuse_sessions {
            return Err(ViewError::Gone("browser unavailable".into()));
        }
        self.stats.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeView::new(
            self.pages.clone(),
            Arc::clone(&self.stats),
        )))
    }
}
