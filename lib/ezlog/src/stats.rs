/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use g3_types::log::{LogSnapshot, LogStats};
use g3_types::stats::StatId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    File,
    Fluentd,
    Database,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::File => "file",
            SinkKind::Fluentd => "fluentd",
            SinkKind::Database => "database",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter set shared between a sink drain and its io thread.
///
/// Besides the io/drop counters of the shared `LogStats`, this tracks the
/// streak of drain errors since the last successful record hand-off, so
/// the status UI can tell a currently failing sink from one that only
/// dropped records in the past.
pub struct SinkStats {
    id: StatId,
    name: String,
    kind: SinkKind,
    drain_errors: AtomicUsize,
    inner: Arc<LogStats>,
}

impl SinkStats {
    pub(crate) fn new(name: &str, kind: SinkKind, inner: Arc<LogStats>) -> Self {
        SinkStats {
            id: StatId::new_unique(),
            name: name.to_string(),
            kind,
            drain_errors: AtomicUsize::new(0),
            inner,
        }
    }

    pub fn stat_id(&self) -> StatId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.inner.snapshot()
    }

    /// Count one drain error, returning the streak length including it.
    pub(crate) fn add_drain_error(&self) -> usize {
        self.drain_errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// End the error streak, returning how many records it cost.
    pub(crate) fn clear_drain_errors(&self) -> usize {
        self.drain_errors.swap(0, Ordering::Relaxed)
    }

    /// Drain errors since the last successful record hand-off.
    pub fn drain_errors(&self) -> usize {
        self.drain_errors.load(Ordering::Relaxed)
    }
}
