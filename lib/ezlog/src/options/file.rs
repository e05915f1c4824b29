/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use anyhow::{Context, anyhow};
use tracing_appender::rolling::Rotation;
use yaml_rust::Yaml;

pub(crate) const DEFAULT_FILE_PATH: &str = "Logs/logs.txt";

/// How often the log file rolls over to a fresh one.
///
/// Names match case-insensitively and unrecognized values resolve to `Day`,
/// the same forgiving rule as [`Severity`](crate::Severity) resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollInterval {
    Minute,
    Hour,
    Day,
    Infinite,
}

impl Default for RollInterval {
    fn default() -> Self {
        RollInterval::Day
    }
}

impl RollInterval {
    pub fn resolve(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "minute" => RollInterval::Minute,
            "hour" => RollInterval::Hour,
            "day" => RollInterval::Day,
            "infinite" | "never" => RollInterval::Infinite,
            _ => RollInterval::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RollInterval::Minute => "Minute",
            RollInterval::Hour => "Hour",
            RollInterval::Day => "Day",
            RollInterval::Infinite => "Infinite",
        }
    }

    pub(crate) fn to_rotation(self) -> Rotation {
        match self {
            RollInterval::Minute => Rotation::MINUTELY,
            RollInterval::Hour => Rotation::HOURLY,
            RollInterval::Day => Rotation::DAILY,
            RollInterval::Infinite => Rotation::NEVER,
        }
    }
}

impl fmt::Display for RollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct FileOptions {
    pub(crate) enabled: bool,
    pub(crate) path: String,
    pub(crate) rolling_interval: String,
}

impl FileOptions {
    pub fn parse(v: &Yaml) -> anyhow::Result<FileOptions> {
        match v {
            Yaml::Hash(map) => {
                let mut config = FileOptions::default();
                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "enabled" => {
                        config.enabled = g3_yaml::value::as_bool(v)
                            .context(format!("invalid bool value for key {k}"))?;
                        Ok(())
                    }
                    "path" => {
                        config.path = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        Ok(())
                    }
                    "interval" | "rolling_interval" | "rollinginterval" => {
                        config.rolling_interval = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                Ok(config)
            }
            Yaml::Null => Ok(FileOptions::default()),
            _ => Err(anyhow!("invalid value type")),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_path(&mut self, path: String) {
        self.path = path;
    }

    pub fn set_rolling_interval(&mut self, interval: String) {
        self.rolling_interval = interval;
    }

    /// The configured path, or `Logs/logs.txt` when left unset.
    pub(crate) fn resolved_path(&self) -> &str {
        if self.path.is_empty() {
            DEFAULT_FILE_PATH
        } else {
            &self.path
        }
    }

    pub(crate) fn resolved_interval(&self) -> RollInterval {
        RollInterval::resolve(&self.rolling_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    #[test]
    fn interval_resolve_ok() {
        assert_eq!(RollInterval::resolve("Minute"), RollInterval::Minute);
        assert_eq!(RollInterval::resolve("HOUR"), RollInterval::Hour);
        assert_eq!(RollInterval::resolve("day"), RollInterval::Day);
        assert_eq!(RollInterval::resolve("Infinite"), RollInterval::Infinite);
        assert_eq!(RollInterval::resolve("never"), RollInterval::Infinite);
    }

    #[test]
    fn interval_resolve_fallback() {
        assert_eq!(RollInterval::resolve(""), RollInterval::Day);
        assert_eq!(RollInterval::resolve("Fortnight"), RollInterval::Day);
        assert_eq!(RollInterval::resolve("Year"), RollInterval::Day);
        assert_eq!(RollInterval::resolve("Month"), RollInterval::Day);
    }

    #[test]
    fn parse_ok() {
        let docs = YamlLoader::load_from_str(
            r#"
                enabled: true
                path: /var/log/app/app.txt
                RollingInterval: Hour
            "#,
        )
        .unwrap();
        let config = FileOptions::parse(&docs[0]).unwrap();
        assert!(config.enabled);
        assert_eq!(config.resolved_path(), "/var/log/app/app.txt");
        assert_eq!(config.resolved_interval(), RollInterval::Hour);
    }

    #[test]
    fn parse_defaults() {
        let docs = YamlLoader::load_from_str("enabled: true").unwrap();
        let config = FileOptions::parse(&docs[0]).unwrap();
        assert_eq!(config.resolved_path(), DEFAULT_FILE_PATH);
        assert_eq!(config.resolved_interval(), RollInterval::Day);
    }

    #[test]
    fn parse_err() {
        let docs = YamlLoader::load_from_str("path: [a]").unwrap();
        assert!(FileOptions::parse(&docs[0]).is_err());

        let docs = YamlLoader::load_from_str("roll: Day").unwrap();
        assert!(FileOptions::parse(&docs[0]).is_err());
    }
}
