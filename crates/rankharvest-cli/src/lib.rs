//! rankharvest CLI — Chromium-backed live views, configuration and output
//! for the `rankharvest` binary.

pub mod browser;
pub mod config;
pub mod output;
