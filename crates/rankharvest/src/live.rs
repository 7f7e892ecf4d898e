//! Live view abstraction over a rendered, scrollable document.
//!
//! The collector never touches a browser directly. It talks to a
//! [`LiveView`] session, and sessions are produced by a [`SessionSource`]
//! (one per feed run and one per record).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ViewResult;

/// Opaque reference to one element rendered at poll time.
///
/// A handle is only meaningful for the poll that produced it. The
/// `generation` stamp lets a view reject handles from an older poll.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ViewItemHandle {
    selector: Arc<str>,
    index: usize,
    generation: u64,
}

impl ViewItemHandle {
    pub fn new(selector: Arc<str>, index: usize, generation: u64) -> Self {
        Self {
            selector,
            index,
            generation,
        }
    }

    /// Selector the owning poll matched against.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Position of the element within that poll's result.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for ViewItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{}", self.selector, self.index, self.generation)
    }
}

/// Build the ordered handle list for one poll.
pub fn handles_for(selector: &str, count: usize, generation: u64) -> Vec<ViewItemHandle> {
    let selector: Arc<str> = Arc::from(selector);
    (0..count)
        .map(|i| ViewItemHandle::new(Arc::clone(&selector), i, generation))
        .collect()
}

/// A stateful, render-backed document session.
#[async_trait]
pub trait LiveView: Send + Sync {
    /// Currently rendered elements matching `selector`, in document order.
    async fn visible_items(&self, selector: &str) -> ViewResult<Vec<ViewItemHandle>>;

    /// Scroll the document to its current bottom.
    async fn scroll_to_bottom(&self) -> ViewResult<()>;

    /// Current scrollable extent. Non-decreasing within one session.
    async fn scrollable_extent(&self) -> ViewResult<u64>;

    /// Text of the element under `handle`, or of its first descendant
    /// matching `sub_selector`. `None` when that element is absent.
    async fn read_text(
        &self,
        handle: &ViewItemHandle,
        sub_selector: Option<&str>,
    ) -> ViewResult<Option<String>>;

    /// Targets of every hyperlink at or below `handle`, in document order.
    async fn link_targets(&self, handle: &ViewItemHandle) -> ViewResult<Vec<String>>;

    /// Click the control within `handle` whose visible label contains
    /// `label`. Returns `false` when no such control exists.
    async fn activate(&self, handle: &ViewItemHandle, label: &str) -> ViewResult<bool>;

    /// Load the view behind `reference` (absolute or relative to the current page).
    async fn navigate_to(&self, reference: &str) -> ViewResult<()>;

    /// Release the session.
    async fn close(self: Box<Self>) -> ViewResult<()>;
}

/// Opens independent live view sessions.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn open(&self) -> ViewResult<Box<dyn LiveView>>;
}
