/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

/// Log severity as written in host configuration files.
///
/// The configuration surface is forgiving: names match case-insensitively,
/// the slog side spellings are accepted, and anything unrecognized resolves
/// to `Information` instead of failing the whole setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Information
    }
}

impl Severity {
    pub fn resolve(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "verbose" | "trace" => Severity::Verbose,
            "debug" => Severity::Debug,
            "information" | "info" => Severity::Information,
            "warning" | "warn" => Severity::Warning,
            "error" => Severity::Error,
            "fatal" | "critical" => Severity::Fatal,
            _ => Severity::Information,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Verbose => "Verbose",
            Severity::Debug => "Debug",
            Severity::Information => "Information",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
        }
    }

    pub fn to_slog(self) -> slog::Level {
        match self {
            Severity::Verbose => slog::Level::Trace,
            Severity::Debug => slog::Level::Debug,
            Severity::Information => slog::Level::Info,
            Severity::Warning => slog::Level::Warning,
            Severity::Error => slog::Level::Error,
            Severity::Fatal => slog::Level::Critical,
        }
    }

    /// Filter level for the log crate bridge. The log crate has no level
    /// above Error, so Fatal maps down to it.
    pub fn to_log_filter(self) -> log::LevelFilter {
        match self {
            Severity::Verbose => log::LevelFilter::Trace,
            Severity::Debug => log::LevelFilter::Debug,
            Severity::Information => log::LevelFilter::Info,
            Severity::Warning => log::LevelFilter::Warn,
            Severity::Error => log::LevelFilter::Error,
            Severity::Fatal => log::LevelFilter::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
