/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use foldhash::fast::FixedState;

use crate::Severity;
use crate::stats::SinkStats;

static SINK_STATS_REGISTRY: Mutex<HashMap<String, Arc<SinkStats>, FixedState>> =
    Mutex::new(HashMap::with_hasher(FixedState::with_seed(0)));

/// Replace the registered sink set. Called on every pipeline install so the
/// registry always describes the currently active sinks.
pub(crate) fn swap(all: Vec<Arc<SinkStats>>) {
    let mut ht = SINK_STATS_REGISTRY.lock().unwrap();
    ht.clear();
    for stats in all {
        let _ = ht.insert(stats.name().to_string(), stats);
    }
}

pub fn foreach_stats<F>(mut f: F)
where
    F: FnMut(&str, &Arc<SinkStats>),
{
    let ht = SINK_STATS_REGISTRY.lock().unwrap();
    for (name, stats) in ht.iter() {
        f(name, stats)
    }
}

/// Summary of the most recently installed pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineStatus {
    pub application: String,
    pub environment: String,
    pub minimum_level: Severity,
    pub sinks: Vec<String>,
    pub configured_at: DateTime<Utc>,
}

static PIPELINE_STATUS: Mutex<Option<PipelineStatus>> = Mutex::new(None);

pub(crate) fn set_status(status: PipelineStatus) {
    let mut slot = PIPELINE_STATUS.lock().unwrap();
    *slot = Some(status);
}

pub(crate) fn clear_status() {
    let mut slot = PIPELINE_STATUS.lock().unwrap();
    *slot = None;
}

pub fn status() -> Option<PipelineStatus> {
    let slot = PIPELINE_STATUS.lock().unwrap();
    slot.clone()
}
