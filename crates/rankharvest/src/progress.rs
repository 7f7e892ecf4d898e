// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Progress events and broadcast channel for harvest telemetry.
//!
//! A pipeline run emits `ProgressEvent`s through a `tokio::sync::broadcast`
//! channel to any subscriber (CLI spinner, JSON log). When nobody
//! subscribes, events are silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::collector::StopReason;

/// A progress event emitted during a harvest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The run this event belongs to.
    pub run_id: String,
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: ProgressEventKind,
}

/// The specific kind of progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEventKind {
    /// The ranked feed snapshot was extracted.
    EntriesExtracted {
        visible: usize,
        kept: usize,
        dropped: usize,
    },
    /// One record's comment collection finished.
    CollectionFinished {
        title: String,
        collected: usize,
        stop_reason: StopReason,
        polls: usize,
        elapsed_ms: u64,
    },
    /// A non-fatal problem.
    Warning { message: String },
}

pub type ProgressSender = tokio::sync::broadcast::Sender<ProgressEvent>;
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<ProgressEvent>;

/// Create a progress channel. 256 events covers a feed of a few dozen
/// records with headroom for warnings.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(256)
}

/// Emitter shared by the concurrent parts of one run.
#[derive(Debug)]
pub struct Progress {
    tx: Option<ProgressSender>,
    run_id: String,
    seq: AtomicU64,
}

impl Progress {
    pub fn new(tx: Option<ProgressSender>, run_id: impl Into<String>) -> Self {
        Self {
            tx,
            run_id: run_id.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// A no-op emitter.
    pub fn silent() -> Self {
        Self::new(None, "")
    }

    /// Emit an event, ignoring send errors (no receivers).
    pub fn emit(&self, event: ProgressEventKind) {
        if let Some(ref sender) = self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(ProgressEvent {
                run_id: self.run_id.clone(),
                seq,
                event,
            });
        }
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(ProgressEventKind::Warning {
            message: message.into(),
        });
    }
}
