/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::cell::RefCell;
use std::fmt::{Arguments, Write};
use std::io::Write as IoWrite;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use flume::Receiver;
use itoa::Integer;
use ryu::Float;
use slog::{KV, OwnedKVList, Record, Serializer};
use tracing_appender::rolling::RollingFileAppender;

use g3_types::log::{AsyncLogConfig, AsyncLogFormatter, AsyncLogger, LogStats};

use crate::options::RollInterval;

thread_local! {
    static TL_BUF: RefCell<String> = RefCell::new(String::with_capacity(128));
}

pub(crate) fn new_file_sink(
    async_conf: &AsyncLogConfig,
    path: &str,
    interval: RollInterval,
) -> anyhow::Result<AsyncLogger<Vec<u8>, TextLineFormatter>> {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("no file name in log path {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let writer = RollingFileAppender::builder()
        .rotation(interval.to_rotation())
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| {
            anyhow!(
                "failed to create rolling file writer at {}: {e}",
                path.display()
            )
        })?;

    let (sender, receiver) = flume::bounded::<Vec<u8>>(async_conf.channel_capacity);

    let stats = Arc::new(LogStats::default());

    let io_thread = FileIoThread {
        receiver,
        stats: Arc::clone(&stats),
        writer,
    };

    let _detached_thread = std::thread::Builder::new()
        .name(async_conf.thread_name.clone())
        .spawn(move || io_thread.run());

    Ok(AsyncLogger::new(sender, TextLineFormatter::default(), stats))
}

struct FileIoThread {
    receiver: Receiver<Vec<u8>>,
    stats: Arc<LogStats>,
    writer: RollingFileAppender,
}

impl FileIoThread {
    fn run(mut self) {
        while let Ok(buf) = self.receiver.recv() {
            self.write_buf(&buf);

            while let Ok(buf) = self.receiver.try_recv() {
                self.write_buf(&buf);
            }

            let _ = self.writer.flush();
        }
    }

    fn write_buf(&mut self, buf: &[u8]) {
        match self.writer.write_all(buf) {
            Ok(_) => {
                self.stats.io.add_passed();
                self.stats.io.add_size(buf.len());
            }
            Err(_) => self.stats.drop.add_peer_unreachable(),
        }
    }
}

/// One record per line: timestamp, level, the kv pairs from the logger
/// chain and the call site, then the message.
#[derive(Default)]
pub(crate) struct TextLineFormatter {}

impl AsyncLogFormatter<Vec<u8>> for TextLineFormatter {
    fn format_slog(
        &self,
        record: &Record,
        logger_values: &OwnedKVList,
    ) -> Result<Vec<u8>, slog::Error> {
        let mut buf: Vec<u8> = Vec::with_capacity(256);

        let datetime = Utc::now();
        let fmt =
            datetime.format_with_items(g3_datetime::format::std::RFC3339_FIXED_MICROSECOND.iter());
        write!(&mut buf, "{fmt} {}", record.level())
            .map_err(|_| slog::Error::Fmt(std::fmt::Error))?;

        let mut kv_formatter = TextKv(&mut buf);
        logger_values.serialize(record, &mut kv_formatter)?;
        record.kv().serialize(record, &mut kv_formatter)?;

        buf.push(b' ');
        let msg = record.msg().to_string();
        buf.extend_from_slice(msg.as_bytes());
        buf.push(b'\n');

        Ok(buf)
    }
}

struct TextKv<'a>(&'a mut Vec<u8>);

impl TextKv<'_> {
    fn push_before_value(&mut self, key: &str) {
        self.0.reserve(key.len() + 3);
        self.0.push(b' ');
        self.0.extend_from_slice(key.as_bytes());
        self.0.extend_from_slice(b"=\"");
    }

    #[inline]
    fn push_after_value(&mut self) {
        self.0.push(b'\"');
    }

    fn push_str_value(&mut self, v: &str) {
        // '"' and '\' get escaped in escape_debug()
        for c in v.chars().flat_map(char::escape_debug) {
            match c.len_utf8() {
                1 => self.0.push(c as u8),
                _ => self
                    .0
                    .extend_from_slice(c.encode_utf8(&mut [0u8; 4]).as_bytes()),
            }
        }
    }

    fn emit_integer<T: Integer>(&mut self, key: slog::Key, value: T) -> slog::Result {
        self.push_before_value(key.as_ref());

        let mut buffer = itoa::Buffer::new();
        let value_s = buffer.format(value);
        self.0.extend_from_slice(value_s.as_bytes());

        self.push_after_value();
        Ok(())
    }

    fn emit_float<T: Float>(&mut self, key: slog::Key, value: T) -> slog::Result {
        self.push_before_value(key.as_ref());

        let mut buffer = ryu::Buffer::new();
        let value_s = buffer.format(value);
        self.0.extend_from_slice(value_s.as_bytes());

        self.push_after_value();
        Ok(())
    }
}

impl Serializer for TextKv<'_> {
    impl_integer_by_itoa! {
        usize => emit_usize,
        isize => emit_isize,
        u8 => emit_u8,
        i8 => emit_i8,
        u16 => emit_u16,
        i16 => emit_i16,
        u32 => emit_u32,
        i32 => emit_i32,
        u64 => emit_u64,
        i64 => emit_i64,
    }
    impl_float_by_ryu! {
        f32 => emit_f32,
        f64 => emit_f64,
    }

    fn emit_bool(&mut self, key: slog::Key, value: bool) -> slog::Result {
        if value {
            self.emit_str(key, "true")
        } else {
            self.emit_str(key, "false")
        }
    }

    fn emit_char(&mut self, key: slog::Key, value: char) -> slog::Result {
        self.emit_str(key, value.encode_utf8(&mut [0u8; 4]))
    }

    fn emit_none(&mut self, key: slog::Key) -> slog::Result {
        self.emit_str(key, "")
    }

    fn emit_unit(&mut self, key: slog::Key) -> slog::Result {
        self.emit_str(key, "()")
    }

    fn emit_str(&mut self, key: slog::Key, value: &str) -> slog::Result {
        self.push_before_value(key.as_ref());
        self.push_str_value(value);
        self.push_after_value();
        Ok(())
    }

    impl_arguments_with_tls!(TL_BUF);
}

#[cfg(test)]
mod tests {
    use super::*;

    use slog::{Level, RecordLocation, RecordStatic, b, o};

    static LOC: RecordLocation = RecordLocation {
        file: "",
        line: 0,
        column: 0,
        function: "",
        module: "app",
    };

    #[test]
    fn format_line() {
        let formatter = TextLineFormatter::default();
        let rs = RecordStatic {
            location: &LOC,
            tag: "",
            level: Level::Info,
        };
        let buf = formatter
            .format_slog(
                &Record::new(
                    &rs,
                    &format_args!("request handled"),
                    b!("RequestPath" => "/api/orders", "Status" => 200u16),
                ),
                &OwnedKVList::from(o!("Application" => "orders")),
            )
            .unwrap();

        let line = std::str::from_utf8(&buf).unwrap();
        assert!(line.ends_with(" request handled\n"));
        assert!(line.contains(" Application=\"orders\""));
        assert!(line.contains(" RequestPath=\"/api/orders\""));
        assert!(line.contains(" Status=\"200\""));
    }

    #[test]
    fn format_escapes_quotes() {
        let formatter = TextLineFormatter::default();
        let rs = RecordStatic {
            location: &LOC,
            tag: "",
            level: Level::Warning,
        };
        let buf = formatter
            .format_slog(
                &Record::new(&rs, &format_args!("x"), b!("q" => "say \"hi\"")),
                &OwnedKVList::from(o!()),
            )
            .unwrap();

        let line = std::str::from_utf8(&buf).unwrap();
        assert!(line.contains(" q=\"say \\\"hi\\\"\""));
    }
}
