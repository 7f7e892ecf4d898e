// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! rankharvest — incremental collection engine for ranked, infinitely
//! scrolling feeds behind a live view.

pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod live;
pub mod normalize;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod rank;
pub mod reveal;
pub mod sanitize;
pub mod types;

pub use collector::{Collection, IncrementalCollector, StopReason};
pub use config::{CollectorConfig, FeedLayout, HarvestConfig};
pub use error::{ExtractionFailure, MalformedNumber, SanitizationIncomplete, ViewError};
pub use extract::{CommentExtractor, EntryExtractor, ItemExtractor};
pub use live::{LiveView, SessionSource, ViewItemHandle};
pub use normalize::normalize;
pub use pipeline::Pipeline;
pub use rank::{rank, RankOrder};
pub use sanitize::{sanitize, sanitize_or_empty};
pub use types::{CommentSet, Record};
