//! One-shot reveal of spoiler-guarded comments.

use std::time::Duration;

use tracing::debug;

use crate::config::FeedLayout;
use crate::extract::read_trimmed;
use crate::live::{LiveView, ViewItemHandle};

/// Click the reveal control inside `handle` once, wait `settle`, and re-read
/// the body.
///
/// Every failure reads as `None`: a missing control, a view error, an empty
/// re-read, or a body that still shows the placeholder. The caller never
/// retries.
pub async fn reveal(
    view: &dyn LiveView,
    handle: &ViewItemHandle,
    layout: &FeedLayout,
    settle: Duration,
) -> Option<String> {
    match view.activate(handle, &layout.reveal_label).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(?handle, "no reveal control");
            return None;
        }
        Err(e) => {
            debug!(?handle, "reveal activation failed: {e}");
            return None;
        }
    }

    tokio::time::sleep(settle).await;

    match read_trimmed(view, handle, &layout.body_selector).await {
        Ok(Some(body)) if body != layout.spoiler_placeholder => Some(body),
        Ok(_) => {
            debug!(?handle, "comment stayed hidden after reveal");
            None
        }
        Err(e) => {
            debug!(?handle, "re-read after reveal failed: {e}");
            None
        }
    }
}
