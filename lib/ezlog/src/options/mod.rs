/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

mod file;
pub use file::{FileOptions, RollInterval};

mod fluentd;
pub use fluentd::FluentdOptions;

mod database;
pub use database::DatabaseOptions;

/// Scalar value attached to every record through the `Tags` map.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl TagValue {
    pub(crate) fn parse_yaml(v: &Yaml) -> anyhow::Result<TagValue> {
        match v {
            Yaml::String(s) => Ok(TagValue::String(s.clone())),
            Yaml::Integer(i) => Ok(TagValue::Int(*i)),
            Yaml::Real(_) => {
                let f = g3_yaml::value::as_f64(v)?;
                Ok(TagValue::Float(f))
            }
            Yaml::Boolean(b) => Ok(TagValue::Bool(*b)),
            _ => Err(anyhow!("tag value should be a scalar")),
        }
    }
}

/// Typed mirror of the host `logger` configuration section.
///
/// Parsing only binds values. Resolution of raw level and interval strings,
/// default fill-in and override dedup happen later in
/// [`resolve`](crate::setup::resolve), so a parsed value can be re-resolved
/// on every configuration reload.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LoggerOptions {
    pub(crate) name: String,
    pub(crate) minimum_level: String,
    pub(crate) tags: Vec<(String, TagValue)>,
    pub(crate) minimum_level_overrides: Vec<(String, String)>,
    pub(crate) ignored_paths: Vec<String>,
    pub(crate) ignored_properties: Vec<String>,
    pub(crate) file: FileOptions,
    pub(crate) fluentd: FluentdOptions,
    pub(crate) database: DatabaseOptions,
}

impl LoggerOptions {
    pub fn parse(v: &Yaml) -> anyhow::Result<LoggerOptions> {
        match v {
            Yaml::Hash(map) => {
                let mut config = LoggerOptions::default();
                g3_yaml::foreach_kv(map, |k, v| {
                    match g3_yaml::key::normalize(k).as_str() {
                        "name" | "application" => {
                            config.name = g3_yaml::value::as_string(v)
                                .context(format!("invalid string value for key {k}"))?;
                            Ok(())
                        }
                        "level" | "minimum_level" | "minimumlevel" => {
                            config.minimum_level = g3_yaml::value::as_string(v)
                                .context(format!("invalid string value for key {k}"))?;
                            Ok(())
                        }
                        "tags" => match v {
                            Yaml::Hash(tags) => g3_yaml::foreach_kv(tags, |tk, tv| {
                                let value = TagValue::parse_yaml(tv)
                                    .context(format!("invalid value for tag {tk}"))?;
                                config.tags.push((tk.to_string(), value));
                                Ok(())
                            }),
                            Yaml::Null => Ok(()),
                            _ => Err(anyhow!("invalid value type for key {k}")),
                        },
                        "minimum_level_overrides" | "minimumleveloverrides" => match v {
                            Yaml::Hash(overrides) => g3_yaml::foreach_kv(overrides, |ok, ov| {
                                let level = g3_yaml::value::as_string(ov)
                                    .context(format!("invalid level value for category {ok}"))?;
                                config
                                    .minimum_level_overrides
                                    .push((ok.to_string(), level));
                                Ok(())
                            }),
                            Yaml::Null => Ok(()),
                            _ => Err(anyhow!("invalid value type for key {k}")),
                        },
                        "ignored_paths" | "ignoredpaths" => {
                            config.ignored_paths =
                                g3_yaml::value::as_list(v, g3_yaml::value::as_string)
                                    .context(format!("invalid string list value for key {k}"))?;
                            Ok(())
                        }
                        "ignored_properties" | "ignoredproperties" => {
                            config.ignored_properties =
                                g3_yaml::value::as_list(v, g3_yaml::value::as_string)
                                    .context(format!("invalid string list value for key {k}"))?;
                            Ok(())
                        }
                        "file" => {
                            config.file =
                                FileOptions::parse(v).context("invalid file sink config")?;
                            Ok(())
                        }
                        "fluentd" | "seq" => {
                            config.fluentd =
                                FluentdOptions::parse(v).context("invalid fluentd sink config")?;
                            Ok(())
                        }
                        "database" => {
                            config.database = DatabaseOptions::parse(v)
                                .context("invalid database sink config")?;
                            Ok(())
                        }
                        _ => Err(anyhow!("invalid key {k}")),
                    }
                })?;
                Ok(config)
            }
            Yaml::Null => Ok(LoggerOptions::default()),
            _ => Err(anyhow!("invalid value type")),
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_minimum_level(&mut self, level: String) {
        self.minimum_level = level;
    }

    pub fn append_tag(&mut self, name: String, value: TagValue) {
        self.tags.push((name, value));
    }

    pub fn append_minimum_level_override(&mut self, category: String, level: String) {
        self.minimum_level_overrides.push((category, level));
    }

    pub fn append_ignored_path(&mut self, suffix: String) {
        self.ignored_paths.push(suffix);
    }

    pub fn append_ignored_property(&mut self, name: String) {
        self.ignored_properties.push(name);
    }

    pub fn set_file(&mut self, file: FileOptions) {
        self.file = file;
    }

    pub fn set_fluentd(&mut self, fluentd: FluentdOptions) {
        self.fluentd = fluentd;
    }

    pub fn set_database(&mut self, database: DatabaseOptions) {
        self.database = database;
    }
}
