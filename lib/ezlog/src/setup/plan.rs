/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use slog::{Logger, OwnedKV};

use g3_types::log::AsyncLogConfig;

use crate::enrich::Enrichment;
use crate::filter::{ExcludeFilter, LevelFilter};
use crate::options::{DatabaseOptions, FluentdOptions, LoggerOptions, RollInterval};
use crate::registry::PipelineStatus;
use crate::severity::Severity;
use crate::sink::{self, Fanout, SinkDrain};
use crate::stats::{SinkKind, SinkStats};

const BASELINE_INSTANCE: &str = "Instance";
const BASELINE_VERSION: &str = "v1";

#[derive(Clone, Debug, PartialEq)]
pub struct FileSinkPlan {
    pub(crate) path: String,
    pub(crate) interval: RollInterval,
}

impl FileSinkPlan {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn interval(&self) -> RollInterval {
        self.interval
    }
}

/// Everything the logging pipeline will be built from, resolved from the
/// bound options. Resolution is pure, so a configuration reload simply
/// resolves again and installs the new plan over the old one.
#[derive(Clone, Debug, PartialEq)]
pub struct SetupPlan {
    pub(crate) application: String,
    pub(crate) environment: String,
    pub(crate) minimum_level: Severity,
    pub(crate) enrichment: Enrichment,
    pub(crate) level_overrides: Vec<(String, Severity)>,
    pub(crate) ignored_paths: Vec<String>,
    pub(crate) ignored_properties: Vec<String>,
    pub(crate) file: Option<FileSinkPlan>,
    pub(crate) fluentd: Option<FluentdOptions>,
    pub(crate) database: Option<DatabaseOptions>,
}

/// Resolve bound options and the hosting environment name into a
/// [`SetupPlan`].
///
/// Unrecognized severity names fall back to `Information` and unrecognized
/// rolling intervals to `Day`; resolution itself never fails. Override
/// categories accept `.` or `::` as the segment separator, the last entry
/// for a category wins.
pub fn resolve(options: &LoggerOptions, environment: &str) -> SetupPlan {
    let enrichment = Enrichment {
        environment: environment.to_string(),
        application: options.name.clone(),
        instance: BASELINE_INSTANCE.to_string(),
        version: BASELINE_VERSION.to_string(),
        tags: options.tags.clone(),
    };

    let mut level_overrides: Vec<(String, Severity)> = Vec::new();
    for (category, level) in &options.minimum_level_overrides {
        let category = category.replace('.', "::");
        let level = Severity::resolve(level);
        match level_overrides.iter_mut().find(|(c, _)| *c == category) {
            Some(slot) => slot.1 = level,
            None => level_overrides.push((category, level)),
        }
    }

    SetupPlan {
        application: options.name.clone(),
        environment: environment.to_string(),
        minimum_level: Severity::resolve(&options.minimum_level),
        enrichment,
        level_overrides,
        ignored_paths: options.ignored_paths.clone(),
        ignored_properties: options.ignored_properties.clone(),
        file: options.file.enabled().then(|| FileSinkPlan {
            path: options.file.resolved_path().to_string(),
            interval: options.file.resolved_interval(),
        }),
        fluentd: options.fluentd.enabled().then(|| options.fluentd.clone()),
        database: options.database.enabled().then(|| options.database.clone()),
    }
}

impl SetupPlan {
    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn minimum_level(&self) -> Severity {
        self.minimum_level
    }

    pub fn enrichment(&self) -> &Enrichment {
        &self.enrichment
    }

    pub fn level_overrides(&self) -> &[(String, Severity)] {
        &self.level_overrides
    }

    pub fn ignored_paths(&self) -> &[String] {
        &self.ignored_paths
    }

    pub fn ignored_properties(&self) -> &[String] {
        &self.ignored_properties
    }

    pub fn file(&self) -> Option<&FileSinkPlan> {
        self.file.as_ref()
    }

    pub fn fluentd(&self) -> Option<&FluentdOptions> {
        self.fluentd.as_ref()
    }

    pub fn database(&self) -> Option<&DatabaseOptions> {
        self.database.as_ref()
    }

    /// Build the logger and its sink io threads. Sink establishment
    /// failures abort here and are fatal to host startup.
    pub(crate) fn build(self) -> anyhow::Result<LoggerHandle> {
        let app = if self.application.is_empty() {
            "app"
        } else {
            self.application.as_str()
        };

        let mut sinks: Vec<SinkDrain> = Vec::new();
        let mut stats: Vec<Arc<SinkStats>> = Vec::new();

        if let Some(file) = &self.file {
            let async_conf = AsyncLogConfig::with_name("log-file");
            let drain = sink::new_file_sink(&async_conf, &file.path, file.interval)
                .context("failed to set up the file sink")?;
            let sink_stats = Arc::new(SinkStats::new(
                &format!("{app}.file"),
                SinkKind::File,
                drain.get_stats(),
            ));
            stats.push(Arc::clone(&sink_stats));
            sinks.push(SinkDrain::file(drain, sink_stats));
        }

        if let Some(fluentd) = &self.fluentd {
            let async_conf = AsyncLogConfig::with_name("log-fluentd");
            let tag_name = format!("{app}.{}", self.environment);
            let drain = sink::new_fluentd_sink(&async_conf, fluentd, tag_name)
                .context("failed to set up the fluentd sink")?;
            let sink_stats = Arc::new(SinkStats::new(
                &format!("{app}.fluentd"),
                SinkKind::Fluentd,
                drain.get_stats(),
            ));
            stats.push(Arc::clone(&sink_stats));
            sinks.push(SinkDrain::fluentd(drain, sink_stats));
        }

        if let Some(database) = &self.database {
            let async_conf = AsyncLogConfig::with_name("log-db");
            let drain = sink::new_database_sink(&async_conf, database)
                .context("failed to set up the database sink")?;
            let sink_stats = Arc::new(SinkStats::new(
                &format!("{app}.database"),
                SinkKind::Database,
                drain.get_stats(),
            ));
            stats.push(Arc::clone(&sink_stats));
            sinks.push(SinkDrain::database(drain, sink_stats));
        }

        let status = PipelineStatus {
            application: self.application,
            environment: self.environment,
            minimum_level: self.minimum_level,
            sinks: stats.iter().map(|s| s.name().to_string()).collect(),
            configured_at: Utc::now(),
        };

        let drain = Fanout::new(sinks);
        let drain = ExcludeFilter::new(drain, self.ignored_paths, self.ignored_properties);
        let overrides = self
            .level_overrides
            .into_iter()
            .map(|(category, level)| (category, level.to_slog()))
            .collect();
        let drain = LevelFilter::new(drain, self.minimum_level.to_slog(), overrides);

        let logger = Logger::root(drain, OwnedKV(self.enrichment));

        Ok(LoggerHandle {
            logger,
            minimum_level: self.minimum_level,
            stats,
            status,
        })
    }
}

pub(crate) struct LoggerHandle {
    pub(crate) logger: Logger,
    pub(crate) minimum_level: Severity,
    pub(crate) stats: Vec<Arc<SinkStats>>,
    pub(crate) status: PipelineStatus,
}
