/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::{Arguments, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use flume::Receiver;
use log::warn;
use serde_json::Value;
use slog::{KV, OwnedKVList, Record, Serializer};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use g3_types::log::{AsyncLogConfig, AsyncLogFormatter, AsyncLogger, LogStats};

use crate::options::DatabaseOptions;

const RETRY_QUEUE_LEN: usize = 16;
const CONNECT_DELAY: Duration = Duration::from_secs(10);

thread_local! {
    static TL_BUF: RefCell<String> = RefCell::new(String::with_capacity(128));
}

/// One row of the log table, assembled on the logging thread.
pub(crate) struct DatabaseRow {
    timestamp: DateTime<Utc>,
    level: &'static str,
    module: &'static str,
    message: String,
    properties: Value,
}

pub(crate) fn new_database_sink(
    async_conf: &AsyncLogConfig,
    options: &DatabaseOptions,
) -> anyhow::Result<AsyncLogger<DatabaseRow, RowFormatter>> {
    let connect_url = options.connect_url()?;
    let table = options.table_name()?.to_string();

    let (sender, receiver) = flume::bounded::<DatabaseRow>(async_conf.channel_capacity);

    let stats = Arc::new(LogStats::default());

    let io_thread = DbIoThread {
        receiver,
        stats: Arc::clone(&stats),
        connect_url,
        table,
        retry_queue: VecDeque::with_capacity(RETRY_QUEUE_LEN),
    };

    let _detached_thread = std::thread::Builder::new()
        .name(async_conf.thread_name.clone())
        .spawn(move || {
            let Ok(rt) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            else {
                return;
            };
            rt.block_on(io_thread.run_to_end());
        });

    Ok(AsyncLogger::new(sender, RowFormatter::default(), stats))
}

struct DbIoThread {
    receiver: Receiver<DatabaseRow>,
    stats: Arc<LogStats>,
    connect_url: String,
    table: String,
    retry_queue: VecDeque<DatabaseRow>,
}

impl DbIoThread {
    async fn run_to_end(mut self) {
        loop {
            match self.connect().await {
                Ok(pool) => match self.run_with_pool(&pool).await {
                    Ok(_) => break,
                    Err(e) => warn!("lost connection to log database: {e:?}"),
                },
                Err(e) => {
                    warn!("failed to connect to log database: {e:?}");
                    match self.run_without_connection().await {
                        Ok(_) => break,
                        Err(e) => warn!("{e:?}"),
                    }
                }
            }
        }
    }

    async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.connect_url)
            .await
            .map_err(|e| anyhow!("connect failed: {e}"))?;

        // the table identifier is validated at plan build time
        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             ts TIMESTAMPTZ NOT NULL, \
             level TEXT NOT NULL, \
             module TEXT NOT NULL, \
             message TEXT NOT NULL, \
             properties JSONB NOT NULL)",
            self.table
        );
        sqlx::query(&create_sql)
            .execute(&pool)
            .await
            .map_err(|e| anyhow!("failed to create table {}: {e}", self.table))?;

        Ok(pool)
    }

    async fn run_with_pool(&mut self, pool: &PgPool) -> anyhow::Result<()> {
        let insert_sql = format!(
            "INSERT INTO {} (ts, level, module, message, properties) \
             VALUES ($1, $2, $3, $4, $5)",
            self.table
        );

        while let Some(row) = self.retry_queue.pop_front() {
            if let Err(e) = self.insert_row(pool, &insert_sql, &row).await {
                self.retry_queue.push_front(row);
                return Err(anyhow!("insert failed: {e}"));
            }
        }

        loop {
            match self.receiver.recv_async().await {
                Ok(row) => {
                    if let Err(e) = self.insert_row(pool, &insert_sql, &row).await {
                        self.push_to_retry(row);
                        return Err(anyhow!("insert failed: {e}"));
                    }
                }
                Err(_) => return Ok(()),
            }
        }
    }

    async fn insert_row(&self, pool: &PgPool, sql: &str, row: &DatabaseRow) -> sqlx::Result<()> {
        sqlx::query(sql)
            .bind(row.timestamp)
            .bind(row.level)
            .bind(row.module)
            .bind(&row.message)
            .bind(&row.properties)
            .execute(pool)
            .await?;
        self.stats.io.add_passed();
        Ok(())
    }

    async fn run_without_connection(&mut self) -> anyhow::Result<()> {
        let drop_count = Arc::new(AtomicUsize::new(0));
        let drop_count_i = drop_count.clone();
        match tokio::time::timeout(CONNECT_DELAY, async {
            while let Ok(row) = self.receiver.recv_async().await {
                if self.push_to_retry(row).is_some() {
                    drop_count_i.fetch_add(1, Ordering::Relaxed);
                }
            }
        })
        .await
        {
            Ok(_) => Ok(()),
            Err(_) => Err(anyhow!(
                "will retry connect again, {} rows dropped during this period",
                drop_count.load(Ordering::Relaxed)
            )),
        }
    }

    fn push_to_retry(&mut self, row: DatabaseRow) -> Option<DatabaseRow> {
        self.retry_queue.push_back(row);
        if self.retry_queue.len() > RETRY_QUEUE_LEN {
            self.stats.drop.add_peer_unreachable();
            self.retry_queue.pop_front()
        } else {
            None
        }
    }
}

/// Collect the logger chain and call site kv pairs into one JSON object.
#[derive(Default)]
pub(crate) struct RowFormatter {}

impl AsyncLogFormatter<DatabaseRow> for RowFormatter {
    fn format_slog(
        &self,
        record: &Record,
        logger_values: &OwnedKVList,
    ) -> Result<DatabaseRow, slog::Error> {
        let mut properties = serde_json::Map::new();

        let mut kv_formatter = JsonKv(&mut properties);
        logger_values.serialize(record, &mut kv_formatter)?;
        record.kv().serialize(record, &mut kv_formatter)?;

        Ok(DatabaseRow {
            timestamp: Utc::now(),
            level: record.level().as_str(),
            module: record.module(),
            message: record.msg().to_string(),
            properties: Value::Object(properties),
        })
    }
}

struct JsonKv<'a>(&'a mut serde_json::Map<String, Value>);

impl JsonKv<'_> {
    fn insert<V: Into<Value>>(&mut self, key: slog::Key, value: V) -> slog::Result {
        self.0.insert(key.as_ref().to_string(), value.into());
        Ok(())
    }
}

impl Serializer for JsonKv<'_> {
    fn emit_usize(&mut self, key: slog::Key, value: usize) -> slog::Result {
        self.insert(key, value as u64)
    }

    fn emit_isize(&mut self, key: slog::Key, value: isize) -> slog::Result {
        self.insert(key, value as i64)
    }

    fn emit_u8(&mut self, key: slog::Key, value: u8) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_i8(&mut self, key: slog::Key, value: i8) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_u16(&mut self, key: slog::Key, value: u16) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_i16(&mut self, key: slog::Key, value: i16) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_u32(&mut self, key: slog::Key, value: u32) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_i32(&mut self, key: slog::Key, value: i32) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_u64(&mut self, key: slog::Key, value: u64) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_i64(&mut self, key: slog::Key, value: i64) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_f32(&mut self, key: slog::Key, value: f32) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_f64(&mut self, key: slog::Key, value: f64) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_bool(&mut self, key: slog::Key, value: bool) -> slog::Result {
        self.insert(key, value)
    }

    fn emit_char(&mut self, key: slog::Key, value: char) -> slog::Result {
        self.insert(key, value.to_string())
    }

    fn emit_none(&mut self, key: slog::Key) -> slog::Result {
        self.insert(key, Value::Null)
    }

    fn emit_unit(&mut self, key: slog::Key) -> slog::Result {
        self.insert(key, Value::Null)
    }

    fn emit_str(&mut self, key: slog::Key, value: &str) -> slog::Result {
        self.insert(key, value)
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
        module: "app::orders",
    };

    #[test]
    fn format_row() {
        let formatter = RowFormatter::default();
        let rs = RecordStatic {
            location: &LOC,
            tag: "",
            level: Level::Error,
        };
        let row = formatter
            .format_slog(
                &Record::new(
                    &rs,
                    &format_args!("query failed"),
                    b!("attempt" => 3u32, "transient" => true),
                ),
                &OwnedKVList::from(o!("Application" => "orders")),
            )
            .unwrap();

        assert_eq!(row.module, "app::orders");
        assert_eq!(row.message, "query failed");
        assert_eq!(row.properties["Application"], Value::from("orders"));
        assert_eq!(row.properties["attempt"], Value::from(3u32));
        assert_eq!(row.properties["transient"], Value::from(true));
    }
}
