//! Chromium-backed live views using chromiumoxide.
//!
//! Every [`LiveView`] call is a script evaluated in the page. Scripts wrap
//! their body in `try`/`catch` so a page-side exception comes back as
//! [`ViewError::Script`]; a failed evaluation means the page itself is
//! unreachable and maps to [`ViewError::Gone`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use rankharvest::error::{ViewError, ViewResult};
use rankharvest::live::{handles_for, LiveView, SessionSource, ViewItemHandle};
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;

/// Environment override for the Chromium binary.
pub const CHROMIUM_ENV: &str = "RANKHARVEST_CHROMIUM_PATH";

const OVERLAY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. RANKHARVEST_CHROMIUM_PATH env
    if let Ok(p) = std::env::var(CHROMIUM_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. ~/.rankharvest/chromium/ and the macOS application bundle
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".rankharvest/chromium/chrome-linux64/chrome"));
        candidates.push(home.join(".rankharvest/chromium/chrome"));
    }
    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        ));
    }
    candidates.into_iter().find(|c| c.exists())
}

/// Browser launch and navigation options.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub navigation_timeout: Duration,
    /// Close button clicked after each navigation, if it shows up in time.
    pub overlay_dismiss: Option<String>,
    pub overlay_wait: Duration,
    /// Base for relative references when the page has no usable URL yet.
    pub base: Option<Url>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            overlay_dismiss: None,
            overlay_wait: Duration::from_secs(3),
            base: None,
        }
    }
}

/// One Chromium process handing out a tab per session.
pub struct ChromiumSessions {
    browser: Browser,
    handler: JoinHandle<()>,
    options: Arc<BrowserOptions>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumSessions {
    /// Launch Chromium.
    pub async fn launch(options: BrowserOptions) -> Result<Self> {
        let chrome_path = find_chromium().with_context(|| {
            format!("Chromium not found. Install Chrome or set {CHROMIUM_ENV}.")
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            handler,
            options: Arc::new(options),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of open tabs.
    pub fn active_sessions(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Close the browser process.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("failed to close Chromium")?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl SessionSource for ChromiumSessions {
    async fn open(&self) -> ViewResult<Box<dyn LiveView>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ViewError::Gone(format!("failed to create page: {e}")))?;

        self.active_count.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(ChromiumView {
            page,
            generation: AtomicU64::new(0),
            options: Arc::clone(&self.options),
            active_count: Arc::clone(&self.active_count),
        }))
    }
}

/// A single Chromium tab.
pub struct ChromiumView {
    page: Page,
    generation: AtomicU64,
    options: Arc<BrowserOptions>,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumView {
    /// Evaluate `body` (a JS function body ending in `return`) and unwrap
    /// its `{ok}` / `{err}` envelope.
    async fn eval(&self, body: &str) -> ViewResult<Value> {
        let script = format!(
            "(() => {{ try {{ return {{ ok: (() => {{ {body} }})() }}; }} \
             catch (e) {{ return {{ err: String(e) }}; }} }})()"
        );
        let result = self
            .page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ViewError::Gone(format!("evaluation failed: {e}")))?;
        let value: Value = result
            .into_value()
            .map_err(|e| ViewError::Script(format!("unexpected script result: {e}")))?;
        unwrap_envelope(value)
    }

    fn check_generation(&self, handle: &ViewItemHandle) -> ViewResult<()> {
        let current = self.generation.load(Ordering::SeqCst);
        if handle.generation() != current {
            return Err(ViewError::StaleHandle {
                handle: handle.generation(),
                current,
            });
        }
        Ok(())
    }

    async fn resolve(&self, reference: &str) -> ViewResult<Url> {
        if let Ok(url) = Url::parse(reference) {
            return Ok(url);
        }
        let current = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u.to_string()).ok())
            .filter(|u| !u.cannot_be_a_base());
        let base = current
            .or_else(|| self.options.base.clone())
            .ok_or_else(|| ViewError::Navigation(format!("no base to resolve {reference}")))?;
        base.join(reference)
            .map_err(|e| ViewError::Navigation(format!("bad reference {reference}: {e}")))
    }

    /// Click the configured overlay close button if it appears in time.
    async fn dismiss_overlay(&self) {
        let Some(selector) = self.options.overlay_dismiss.as_deref() else {
            return;
        };
        let body = format!(
            "const b = document.querySelector({}); if (!b) return false; b.click(); return true;",
            js_string(selector)
        );
        let deadline = tokio::time::Instant::now() + self.options.overlay_wait;
        while tokio::time::Instant::now() < deadline {
            match self.eval(&body).await {
                Ok(Value::Bool(true)) => {
                    tracing::debug!(selector, "overlay dismissed");
                    return;
                }
                Ok(_) => tokio::time::sleep(OVERLAY_POLL_INTERVAL).await,
                Err(_) => return,
            }
        }
    }
}

#[async_trait]
impl LiveView for ChromiumView {
    async fn visible_items(&self, selector: &str) -> ViewResult<Vec<ViewItemHandle>> {
        let body = format!(
            "return document.querySelectorAll({}).length;",
            js_string(selector)
        );
        let count = self.eval(&body).await?.as_u64().unwrap_or(0) as usize;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(handles_for(selector, count, generation))
    }

    async fn scroll_to_bottom(&self) -> ViewResult<()> {
        self.eval("window.scrollTo(0, document.documentElement.scrollHeight); return true;")
            .await
            .map(|_| ())
    }

    async fn scrollable_extent(&self) -> ViewResult<u64> {
        let value = self
            .eval("return document.documentElement.scrollHeight;")
            .await?;
        value
            .as_u64()
            .ok_or_else(|| ViewError::Script(format!("extent is not a number: {value}")))
    }

    async fn read_text(
        &self,
        handle: &ViewItemHandle,
        sub_selector: Option<&str>,
    ) -> ViewResult<Option<String>> {
        self.check_generation(handle)?;
        let target = match sub_selector {
            Some(sub) => format!("root.querySelector({})", js_string(sub)),
            None => "root".to_string(),
        };
        let body = format!(
            "{} if (!root) return null; const el = {target}; return el ? el.innerText : null;",
            root_expr(handle)
        );
        Ok(self.eval(&body).await?.as_str().map(str::to_string))
    }

    async fn link_targets(&self, handle: &ViewItemHandle) -> ViewResult<Vec<String>> {
        self.check_generation(handle)?;
        let body = format!(
            "{} if (!root) return []; \
             const links = root.matches('a[href]') ? [root] : []; \
             links.push(...root.querySelectorAll('a[href]')); \
             return links.map(a => a.getAttribute('href'));",
            root_expr(handle)
        );
        let value = self.eval(&body).await?;
        Ok(value
            .as_array()
            .map(|targets| {
                targets
                    .iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn activate(&self, handle: &ViewItemHandle, label: &str) -> ViewResult<bool> {
        self.check_generation(handle)?;
        let body = format!(
            "{} if (!root) return false; \
             const label = {}; \
             const control = [...root.querySelectorAll('button, [role=button], a, span')] \
                 .find(c => (c.innerText || '').includes(label)); \
             if (!control) return false; control.click(); return true;",
            root_expr(handle),
            js_string(label)
        );
        Ok(self.eval(&body).await?.as_bool().unwrap_or(false))
    }

    async fn navigate_to(&self, reference: &str) -> ViewResult<()> {
        let url = self.resolve(reference).await?;
        let timeout = self.options.navigation_timeout;
        match tokio::time::timeout(timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ViewError::Navigation(format!("{url}: {e}"))),
            Err(_) => {
                return Err(ViewError::Navigation(format!(
                    "{url}: timed out after {}ms",
                    timeout.as_millis()
                )))
            }
        }
        let _ = self.page.wait_for_navigation().await;
        self.dismiss_overlay().await;
        Ok(())
    }

    async fn close(self: Box<Self>) -> ViewResult<()> {
        let view = *self;
        view.active_count.fetch_sub(1, Ordering::Relaxed);
        view.page
            .close()
            .await
            .map_err(|e| ViewError::Gone(format!("failed to close page: {e}")))
    }
}

/// Quote `s` as a JS string literal.
fn js_string(s: &str) -> String {
    // A JSON string is a valid JS string literal.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Statement binding `root` to the handle's element.
fn root_expr(handle: &ViewItemHandle) -> String {
    format!(
        "const root = document.querySelectorAll({})[{}];",
        js_string(handle.selector()),
        handle.index()
    )
}

fn unwrap_envelope(value: Value) -> ViewResult<Value> {
    match value {
        Value::Object(mut map) => {
            if let Some(err) = map.remove("err") {
                return Err(ViewError::Script(
                    err.as_str().unwrap_or("script error").to_string(),
                ));
            }
            Ok(map.remove("ok").unwrap_or(Value::Null))
        }
        other => Err(ViewError::Script(format!("malformed script result: {other}"))),
    }
}
