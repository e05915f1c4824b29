/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::cell::RefCell;
use std::fmt::Write;

use slog::{Drain, KV, Key, Level, Never, OwnedKVList, Record, Serializer};

pub(crate) const PROPERTY_REQUEST_PATH: &str = "RequestPath";

thread_local! {
    static TL_BUF: RefCell<String> = RefCell::new(String::with_capacity(128));
}

/// Minimum level enforcement with per-category thresholds.
///
/// A category is a module path prefix; the longest prefix matching the
/// record module wins, and prefixes only match at `::` segment boundaries.
pub(crate) struct LevelFilter<D: Drain<Ok = (), Err = Never>> {
    default: Level,
    overrides: Vec<(String, Level)>,
    floor: Level,
    inner: D,
}

impl<D: Drain<Ok = (), Err = Never>> LevelFilter<D> {
    pub(crate) fn new(inner: D, default: Level, mut overrides: Vec<(String, Level)>) -> Self {
        overrides.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let mut floor = default;
        for (_, level) in &overrides {
            if level.as_usize() > floor.as_usize() {
                floor = *level;
            }
        }
        LevelFilter {
            default,
            overrides,
            floor,
            inner,
        }
    }

    fn threshold(&self, module: &str) -> Level {
        for (category, level) in &self.overrides {
            if module == category.as_str()
                || (module.len() > category.len()
                    && module.starts_with(category.as_str())
                    && module.as_bytes()[category.len()..].starts_with(b"::"))
            {
                return *level;
            }
        }
        self.default
    }
}

impl<D: Drain<Ok = (), Err = Never>> Drain for LevelFilter<D> {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), Never> {
        if record.level().is_at_least(self.threshold(record.module())) {
            self.inner.log(record, logger_values)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level.is_at_least(self.floor) && self.inner.is_enabled(level)
    }
}

/// Record exclusion on property contents.
///
/// A record is dropped when it carries a property with one of the
/// configured names (any value type), or a string-typed `RequestPath`
/// value ending with one of the configured suffixes. Both the record
/// pairs and the logger chain pairs are scanned.
pub(crate) struct ExcludeFilter<D: Drain<Ok = (), Err = Never>> {
    ignored_paths: Vec<String>,
    ignored_properties: Vec<String>,
    inner: D,
}

impl<D: Drain<Ok = (), Err = Never>> ExcludeFilter<D> {
    pub(crate) fn new(
        inner: D,
        ignored_paths: Vec<String>,
        ignored_properties: Vec<String>,
    ) -> Self {
        ExcludeFilter {
            ignored_paths,
            ignored_properties,
            inner,
        }
    }

    fn excluded(&self, record: &Record, logger_values: &OwnedKVList) -> bool {
        let mut scan = ExcludeScan {
            ignored_paths: &self.ignored_paths,
            ignored_properties: &self.ignored_properties,
            matched: false,
        };
        let _ = record.kv().serialize(record, &mut scan);
        if !scan.matched {
            let _ = logger_values.serialize(record, &mut scan);
        }
        scan.matched
    }
}

impl<D: Drain<Ok = (), Err = Never>> Drain for ExcludeFilter<D> {
    type Ok = ();
    type Err = Never;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), Never> {
        if self.ignored_paths.is_empty() && self.ignored_properties.is_empty() {
            return self.inner.log(record, logger_values);
        }
        if self.excluded(record, logger_values) {
            return Ok(());
        }
        self.inner.log(record, logger_values)
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        self.inner.is_enabled(level)
    }
}

struct ExcludeScan<'a> {
    ignored_paths: &'a [String],
    ignored_properties: &'a [String],
    matched: bool,
}

impl ExcludeScan<'_> {
    fn check_name(&mut self, key: &Key) {
        if self.matched {
            return;
        }
        if self
            .ignored_properties
            .iter()
            .any(|p| key.as_bytes() == p.as_bytes())
        {
            self.matched = true;
        }
    }

    fn check(&mut self, key: &Key, value: &str) {
        self.check_name(key);
        if self.matched {
            return;
        }
        if key.as_bytes() == PROPERTY_REQUEST_PATH.as_bytes()
            && self.ignored_paths.iter().any(|s| value.ends_with(s.as_str()))
        {
            self.matched = true;
        }
    }
}

impl Serializer for ExcludeScan<'_> {
    fn emit_usize(&mut self, key: Key, _value: usize) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_isize(&mut self, key: Key, _value: isize) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_u8(&mut self, key: Key, _value: u8) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_i8(&mut self, key: Key, _value: i8) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_u16(&mut self, key: Key, _value: u16) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_i16(&mut self, key: Key, _value: i16) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_u32(&mut self, key: Key, _value: u32) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_i32(&mut self, key: Key, _value: i32) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_u64(&mut self, key: Key, _value: u64) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_i64(&mut self, key: Key, _value: i64) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_f32(&mut self, key: Key, _value: f32) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_f64(&mut self, key: Key, _value: f64) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_bool(&mut self, key: Key, _value: bool) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_char(&mut self, key: Key, _value: char) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_unit(&mut self, key: Key) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_none(&mut self, key: Key) -> slog::Result {
        self.check_name(&key);
        Ok(())
    }

    fn emit_str(&mut self, key: Key, value: &str) -> slog::Result {
        self.check(&key, value);
        Ok(())
    }

    fn emit_arguments(&mut self, key: Key, value: &std::fmt::Arguments) -> slog::Result {
        if self.matched {
            return Ok(());
        }
        if let Some(s) = value.as_str() {
            self.check(&key, s);
        } else {
            TL_BUF.with_borrow_mut(|buf| {
                buf.clear();
                let _ = buf.write_fmt(*value);
                self.check(&key, buf.as_str());
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use slog::{RecordLocation, RecordStatic, b, o};

    #[derive(Clone, Default)]
    struct Capture {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Capture {
        fn messages(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Drain for Capture {
        type Ok = ();
        type Err = Never;

        fn log(&self, record: &Record, _logger_values: &OwnedKVList) -> Result<(), Never> {
            self.seen.lock().unwrap().push(record.msg().to_string());
            Ok(())
        }
    }

    static LOC_APP: RecordLocation = RecordLocation {
        file: "",
        line: 0,
        column: 0,
        function: "",
        module: "app",
    };
    static LOC_APP_DB: RecordLocation = RecordLocation {
        file: "",
        line: 0,
        column: 0,
        function: "",
        module: "app::db",
    };
    static LOC_APP_DB_CONN: RecordLocation = RecordLocation {
        file: "",
        line: 0,
        column: 0,
        function: "",
        module: "app::db::conn",
    };
    static LOC_APP_DBX: RecordLocation = RecordLocation {
        file: "",
        line: 0,
        column: 0,
        function: "",
        module: "app::dbx",
    };

    fn send<D: Drain<Ok = (), Err = Never>>(
        drain: &D,
        loc: &'static RecordLocation,
        level: Level,
        msg: &str,
    ) {
        let rs = RecordStatic {
            location: loc,
            tag: "",
            level,
        };
        drain
            .log(
                &Record::new(&rs, &format_args!("{msg}"), b!()),
                &OwnedKVList::from(o!()),
            )
            .unwrap();
    }

    #[test]
    fn level_default_threshold() {
        let capture = Capture::default();
        let filter = LevelFilter::new(capture.clone(), Level::Info, Vec::new());

        send(&filter, &LOC_APP, Level::Debug, "dropped");
        send(&filter, &LOC_APP, Level::Info, "kept");
        send(&filter, &LOC_APP, Level::Error, "kept too");

        assert_eq!(capture.messages(), vec!["kept", "kept too"]);
    }

    #[test]
    fn level_category_override() {
        let capture = Capture::default();
        let filter = LevelFilter::new(
            capture.clone(),
            Level::Info,
            vec![("app::db".to_string(), Level::Error)],
        );

        send(&filter, &LOC_APP_DB, Level::Info, "dropped");
        send(&filter, &LOC_APP_DB_CONN, Level::Warning, "dropped too");
        send(&filter, &LOC_APP_DB, Level::Error, "db error");
        // prefix only matches whole segments
        send(&filter, &LOC_APP_DBX, Level::Info, "dbx info");
        send(&filter, &LOC_APP, Level::Info, "app info");

        assert_eq!(capture.messages(), vec!["db error", "dbx info", "app info"]);
    }

    #[test]
    fn level_longest_prefix_wins() {
        let capture = Capture::default();
        let filter = LevelFilter::new(
            capture.clone(),
            Level::Error,
            vec![
                ("app".to_string(), Level::Warning),
                ("app::db".to_string(), Level::Trace),
            ],
        );

        send(&filter, &LOC_APP_DB_CONN, Level::Debug, "db debug");
        send(&filter, &LOC_APP, Level::Debug, "dropped");
        send(&filter, &LOC_APP, Level::Warning, "app warning");

        assert_eq!(capture.messages(), vec!["db debug", "app warning"]);
    }

    #[test]
    fn level_is_enabled_floor() {
        let capture = Capture::default();
        let filter = LevelFilter::new(
            capture.clone(),
            Level::Warning,
            vec![("app::db".to_string(), Level::Debug)],
        );

        assert!(filter.is_enabled(Level::Debug));
        assert!(!filter.is_enabled(Level::Trace));
        assert!(filter.is_enabled(Level::Error));
    }

    fn send_kv<D: Drain<Ok = (), Err = Never>>(drain: &D, kv: slog::BorrowedKV, msg: &str) {
        let rs = RecordStatic {
            location: &LOC_APP,
            tag: "",
            level: Level::Info,
        };
        drain
            .log(
                &Record::new(&rs, &format_args!("{msg}"), kv),
                &OwnedKVList::from(o!()),
            )
            .unwrap();
    }

    #[test]
    fn exclude_request_path_suffix() {
        let capture = Capture::default();
        let filter = ExcludeFilter::new(
            capture.clone(),
            vec!["/healthz".to_string(), "/metrics".to_string()],
            Vec::new(),
        );

        send_kv(&filter, b!("RequestPath" => "/internal/healthz"), "dropped");
        send_kv(&filter, b!("RequestPath" => "/api/orders"), "kept");
        send_kv(&filter, b!("other" => "/healthz"), "kept other");

        assert_eq!(capture.messages(), vec!["kept", "kept other"]);
    }

    #[test]
    fn exclude_property_name() {
        let capture = Capture::default();
        let filter = ExcludeFilter::new(
            capture.clone(),
            Vec::new(),
            vec!["HealthCheck".to_string()],
        );

        send_kv(&filter, b!("HealthCheck" => "probe"), "dropped");
        // the name alone marks a record, whatever the value type
        send_kv(&filter, b!("HealthCheck" => 1u64), "dropped numeric");
        send_kv(&filter, b!("Other" => "x"), "kept");

        assert_eq!(capture.messages(), vec!["kept"]);
    }

    #[test]
    fn exclude_logger_values() {
        let capture = Capture::default();
        let filter = ExcludeFilter::new(
            capture.clone(),
            Vec::new(),
            vec!["HealthCheck".to_string()],
        );

        let rs = RecordStatic {
            location: &LOC_APP,
            tag: "",
            level: Level::Info,
        };
        filter
            .log(
                &Record::new(&rs, &format_args!("dropped"), b!()),
                &OwnedKVList::from(o!("HealthCheck" => "probe")),
            )
            .unwrap();
        filter
            .log(
                &Record::new(&rs, &format_args!("kept"), b!()),
                &OwnedKVList::from(o!("Other" => "x")),
            )
            .unwrap();

        assert_eq!(capture.messages(), vec!["kept"]);
    }

    #[test]
    fn exclude_nothing_configured() {
        let capture = Capture::default();
        let filter = ExcludeFilter::new(capture.clone(), Vec::new(), Vec::new());

        send_kv(&filter, b!("RequestPath" => "/healthz"), "kept");

        assert_eq!(capture.messages(), vec!["kept"]);
    }
}
