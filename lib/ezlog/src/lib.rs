/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Configuration-driven logging setup for web hosts.
//!
//! The caller binds a [`LoggerOptions`] bundle from its configuration
//! section, resolves it together with the hosting environment name into a
//! [`SetupPlan`](setup::SetupPlan), and installs the plan as the
//! process-global logger. Re-running resolve + install on a configuration
//! reload replaces the previous pipeline in place.

#[macro_use]
mod macros;

mod severity;
pub use severity::Severity;

pub mod options;
pub use options::{
    DatabaseOptions, FileOptions, FluentdOptions, LoggerOptions, RollInterval, TagValue,
};

mod enrich;
pub use enrich::Enrichment;

mod filter;
mod sink;

pub mod setup;

mod stats;
pub use stats::{SinkKind, SinkStats};

mod registry;
pub use registry::{PipelineStatus, foreach_stats, status};
