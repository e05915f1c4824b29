/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::{info, warn};
use slog::{Drain, Level, Never, OwnedKVList, Record};

use g3_fluentd::FluentdFormatter;
use g3_types::log::AsyncLogger;

use crate::stats::SinkStats;

mod file;
pub(crate) use file::{TextLineFormatter, new_file_sink};

mod fluentd;
pub(crate) use fluentd::new_fluentd_sink;

mod database;
pub(crate) use database::{DatabaseRow, RowFormatter, new_database_sink};

enum SinkInner {
    File(AsyncLogger<Vec<u8>, TextLineFormatter>),
    Fluentd(AsyncLogger<Vec<u8>, FluentdFormatter>),
    Database(AsyncLogger<DatabaseRow, RowFormatter>),
}

/// One configured sink, paired with its stats.
///
/// Drain errors are accounted on [`SinkStats`] as a consecutive-failure
/// streak, so the status UI can tell a currently failing sink apart from
/// one that only dropped records in the past. The process log gets the 1st,
/// 2nd, 4th, 8th, ... failure of a streak and a notice when it ends.
pub(crate) struct SinkDrain {
    inner: SinkInner,
    stats: Arc<SinkStats>,
}

impl SinkDrain {
    pub(crate) fn file(
        drain: AsyncLogger<Vec<u8>, TextLineFormatter>,
        stats: Arc<SinkStats>,
    ) -> Self {
        SinkDrain {
            inner: SinkInner::File(drain),
            stats,
        }
    }

    pub(crate) fn fluentd(
        drain: AsyncLogger<Vec<u8>, FluentdFormatter>,
        stats: Arc<SinkStats>,
    ) -> Self {
        SinkDrain {
            inner: SinkInner::Fluentd(drain),
            stats,
        }
    }

    pub(crate) fn database(
        drain: AsyncLogger<DatabaseRow, RowFormatter>,
        stats: Arc<SinkStats>,
    ) -> Self {
        SinkDrain {
            inner: SinkInner::Database(drain),
            stats,
        }
    }
}

impl Drain for SinkDrain {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), Never> {
        let r = match &self.inner {
            SinkInner::File(d) => d.log(record, logger_values),
            SinkInner::Fluentd(d) => d.log(record, logger_values),
            SinkInner::Database(d) => d.log(record, logger_values),
        };
        match r {
            Ok(_) => {
                let lost = self.stats.clear_drain_errors();
                if lost != 0 {
                    info!(
                        "sink {} formats records again, the failed streak cost {lost}",
                        self.stats.name()
                    );
                }
            }
            Err(e) => {
                let streak = self.stats.add_drain_error();
                if streak.is_power_of_two() {
                    warn!(
                        "sink {} failed to format a record, {streak} in a row: {e:?}",
                        self.stats.name()
                    );
                }
            }
        }
        Ok(())
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        match &self.inner {
            SinkInner::File(d) => d.is_enabled(level),
            SinkInner::Fluentd(d) => d.is_enabled(level),
            SinkInner::Database(d) => d.is_enabled(level),
        }
    }
}

/// Deliver each record to every configured sink. With no sinks configured
/// the record is consumed, so the filters in front stay measurable.
pub(crate) struct Fanout {
    sinks: Vec<SinkDrain>,
}

impl Fanout {
    pub(crate) fn new(sinks: Vec<SinkDrain>) -> Self {
        Fanout { sinks }
    }
}

impl Drain for Fanout {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), Never> {
        for sink in &self.sinks {
            sink.log(record, logger_values)?;
        }
        Ok(())
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        self.sinks.is_empty() || self.sinks.iter().any(|s| s.is_enabled(level))
    }
}
