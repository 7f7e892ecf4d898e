//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rankharvest::FeedLayout;

/// Environment variable naming a layout file.
pub const LAYOUT_ENV: &str = "RANKHARVEST_LAYOUT";
/// Layout file picked up from the working directory.
pub const LOCAL_LAYOUT: &str = "rankharvest.json";

/// Resolve the layout file path: explicit flag, then `RANKHARVEST_LAYOUT`,
/// then `./rankharvest.json`. `None` means built-in defaults.
pub fn resolve_layout_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_layout_path_in(explicit, std::env::var(LAYOUT_ENV).ok(), &cwd)
}

fn resolve_layout_path_in(
    explicit: Option<&Path>,
    env_path: Option<String>,
    cwd: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(env_path) = env_path.filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(env_path));
    }

    let local = cwd.join(LOCAL_LAYOUT);
    if local.exists() {
        return Some(local);
    }

    None
}

/// Load the effective feed layout.
pub fn load_layout(explicit: Option<&Path>) -> Result<FeedLayout> {
    match resolve_layout_path(explicit) {
        Some(path) => read_layout(&path),
        None => Ok(FeedLayout::default()),
    }
}

/// Read a layout file; missing fields take their defaults.
pub fn read_layout(path: &Path) -> Result<FeedLayout> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read layout {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid layout {}", path.display()))
}
