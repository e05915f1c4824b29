/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use slog::{KV, Key, Record, Serializer};

use crate::options::TagValue;

/// Properties attached to every record flowing through the pipeline: the
/// four baseline fields followed by the configured tags, in tag order.
#[derive(Clone, Debug, PartialEq)]
pub struct Enrichment {
    pub environment: String,
    pub application: String,
    pub instance: String,
    pub version: String,
    pub tags: Vec<(String, TagValue)>,
}

impl KV for Enrichment {
    fn serialize(&self, _record: &Record, serializer: &mut dyn Serializer) -> slog::Result {
        serializer.emit_str(Key::from("Environment"), &self.environment)?;
        serializer.emit_str(Key::from("Application"), &self.application)?;
        serializer.emit_str(Key::from("Instance"), &self.instance)?;
        serializer.emit_str(Key::from("Version"), &self.version)?;
        for (name, value) in &self.tags {
            let key = Key::from(name.clone());
            match value {
                TagValue::String(s) => serializer.emit_str(key, s)?,
                TagValue::Int(i) => serializer.emit_i64(key, *i)?,
                TagValue::Float(f) => serializer.emit_f64(key, *f)?,
                TagValue::Bool(b) => serializer.emit_bool(key, *b)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pairs(Vec<(String, String)>);

    impl Serializer for Pairs {
        fn emit_arguments(&mut self, key: Key, val: &std::fmt::Arguments) -> slog::Result {
            self.0.push((key.to_string(), std::fmt::format(*val)));
            Ok(())
        }
    }

    #[test]
    fn serialize_in_order() {
        let enrichment = Enrichment {
            environment: "Staging".to_string(),
            application: "orders".to_string(),
            instance: "Instance".to_string(),
            version: "v1".to_string(),
            tags: vec![
                ("team".to_string(), TagValue::String("payments".to_string())),
                ("replicas".to_string(), TagValue::Int(3)),
            ],
        };

        let rs = slog::record_static!(slog::Level::Info, "");
        let mut pairs = Pairs(Vec::new());
        enrichment
            .serialize(
                &slog::Record::new(&rs, &format_args!(""), slog::b!()),
                &mut pairs,
            )
            .unwrap();

        assert_eq!(
            pairs.0,
            vec![
                ("Environment".to_string(), "Staging".to_string()),
                ("Application".to_string(), "orders".to_string()),
                ("Instance".to_string(), "Instance".to_string()),
                ("Version".to_string(), "v1".to_string()),
                ("team".to_string(), "payments".to_string()),
                ("replicas".to_string(), "3".to_string()),
            ]
        );
    }
}
