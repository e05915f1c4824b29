/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Process-global pipeline lifecycle.
//!
//! [`install`] swaps the resolved pipeline in as the `slog-scope` global
//! logger and keeps the scope guard in a module slot; the guard displaced
//! by a reload is disarmed so dropping it never reverts the fresh pipeline
//! to the fallback logger. The first install also wires the `log` crate
//! bridge, and every install tracks the resolved minimum level in
//! `log::set_max_level`.

use std::sync::{Mutex, Once};

use anyhow::anyhow;
use slog_scope::GlobalLoggerGuard;

use crate::options::LoggerOptions;
use crate::registry;

mod plan;
pub use plan::{FileSinkPlan, SetupPlan, resolve};

static LOGGER_GUARD: Mutex<Option<GlobalLoggerGuard>> = Mutex::new(None);
static STDLOG_BRIDGE: Once = Once::new();

/// Build the plan and make it the active pipeline, replacing any pipeline
/// installed before. Sink establishment and stdlog bridge errors propagate
/// and leave the previous pipeline fully in place.
pub fn install(plan: SetupPlan) -> anyhow::Result<()> {
    let handle = plan.build()?;

    // the bridge must be wired before the guard swap, a bridge failure may
    // not displace the previous pipeline
    let mut bridge = Ok(());
    STDLOG_BRIDGE.call_once(|| bridge = slog_stdlog::init());
    bridge.map_err(|e| anyhow!("failed to set up the stdlog bridge: {e}"))?;

    let guard = slog_scope::set_global_logger(handle.logger);
    {
        let mut slot = LOGGER_GUARD.lock().unwrap();
        if let Some(old) = slot.replace(guard) {
            old.cancel_reset();
        }
    }

    log::set_max_level(handle.minimum_level.to_log_filter());

    registry::swap(handle.stats);
    registry::set_status(handle.status);
    Ok(())
}

/// Resolve and install in one step, for configuration reload handlers.
pub fn reload(options: &LoggerOptions, environment: &str) -> anyhow::Result<()> {
    install(resolve(options, environment))
}

/// Drop the active pipeline. The global logger reverts to the `slog-scope`
/// fallback and sink io threads wind down as their channels close.
pub fn teardown() {
    let mut slot = LOGGER_GUARD.lock().unwrap();
    let _ = slot.take();
    drop(slot);

    registry::swap(Vec::new());
    registry::clear_status();
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Severity;

    // one test so install/reload/teardown never race on the global slot
    #[test]
    fn lifecycle() {
        let mut options = LoggerOptions::default();
        options.set_name("orders".to_string());
        install(resolve(&options, "Staging")).unwrap();

        let status = registry::status().unwrap();
        assert_eq!(status.application, "orders");
        assert_eq!(status.environment, "Staging");
        assert_eq!(status.minimum_level, Severity::Information);
        assert!(status.sinks.is_empty());
        assert_eq!(log::max_level(), log::LevelFilter::Info);

        options.set_minimum_level("Warning".to_string());
        reload(&options, "Production").unwrap();

        let status = registry::status().unwrap();
        assert_eq!(status.environment, "Production");
        assert_eq!(status.minimum_level, Severity::Warning);
        assert_eq!(log::max_level(), log::LevelFilter::Warn);

        // the reloaded pipeline stays active and accepts records
        log::warn!("still logging after reload");

        // a failing install leaves the previous pipeline in place
        let mut bad = LoggerOptions::default();
        let mut database = crate::options::DatabaseOptions::default();
        database.set_enabled(true);
        bad.set_database(database);
        assert!(install(resolve(&bad, "Broken")).is_err());
        let status = registry::status().unwrap();
        assert_eq!(status.environment, "Production");

        teardown();
        assert!(registry::status().is_none());
        let mut seen = 0;
        registry::foreach_stats(|_, _| seen += 1);
        assert_eq!(seen, 0);
    }
}
