/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt::Write;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::{Html, Json};
use axum::routing::get;
use serde::Serialize;

use crate::UiOptions;

pub(crate) fn router(options: Arc<UiOptions>) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/api/status", get(status_api))
        .with_state(options)
}

#[derive(Serialize)]
struct PipelineDto {
    application: String,
    environment: String,
    minimum_level: String,
    sinks: Vec<String>,
    configured_at: String,
}

#[derive(Serialize)]
struct DroppedDto {
    format_failed: u64,
    channel_closed: u64,
    channel_overflow: u64,
    peer_unreachable: u64,
}

#[derive(Serialize)]
struct SinkDto {
    name: String,
    kind: String,
    total: u64,
    passed: u64,
    size: u64,
    dropped: DroppedDto,
    consecutive_errors: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    pipeline: Option<PipelineDto>,
    sinks: Vec<SinkDto>,
}

fn collect() -> StatusResponse {
    let pipeline = ezlog::status().map(|s| PipelineDto {
        application: s.application,
        environment: s.environment,
        minimum_level: s.minimum_level.to_string(),
        sinks: s.sinks,
        configured_at: s.configured_at.to_rfc3339(),
    });

    let mut sinks = Vec::new();
    ezlog::foreach_stats(|name, stats| {
        let snap = stats.snapshot();
        sinks.push(SinkDto {
            name: name.to_string(),
            kind: stats.kind().to_string(),
            total: snap.io.total,
            passed: snap.io.passed,
            size: snap.io.size,
            dropped: DroppedDto {
                format_failed: snap.drop.format_failed,
                channel_closed: snap.drop.channel_closed,
                channel_overflow: snap.drop.channel_overflow,
                peer_unreachable: snap.drop.peer_unreachable,
            },
            consecutive_errors: stats.drain_errors(),
        });
    });
    sinks.sort_by(|a, b| a.name.cmp(&b.name));

    StatusResponse { pipeline, sinks }
}

async fn status_api() -> Json<StatusResponse> {
    Json(collect())
}

async fn status_page(State(options): State<Arc<UiOptions>>) -> Html<String> {
    Html(render_page(&options, &collect()))
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_page(options: &UiOptions, status: &StatusResponse) -> String {
    let mut page = String::with_capacity(2048);
    let title = html_escape(options.page_title());

    let _ = write!(
        page,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"{}\">\
         <title>{title}</title>\
         <style>body{{font-family:monospace;margin:2em}}\
         table{{border-collapse:collapse}}\
         td,th{{border:1px solid #999;padding:0.3em 0.8em;text-align:left}}</style>\
         </head><body><h1>{title}</h1>",
        options.refresh_seconds()
    );

    match &status.pipeline {
        Some(p) => {
            let _ = write!(
                page,
                "<p>application <b>{}</b>, environment <b>{}</b>, \
                 minimum level <b>{}</b>, configured at {}</p>",
                html_escape(&p.application),
                html_escape(&p.environment),
                p.minimum_level,
                p.configured_at
            );
        }
        None => page.push_str("<p>no logging pipeline installed</p>"),
    }

    page.push_str(
        "<table><tr><th>sink</th><th>kind</th><th>total</th><th>passed</th>\
         <th>bytes</th><th>dropped</th><th>failing</th></tr>",
    );
    for sink in &status.sinks {
        let dropped = sink.dropped.format_failed
            + sink.dropped.channel_closed
            + sink.dropped.channel_overflow
            + sink.dropped.peer_unreachable;
        let _ = write!(
            page,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{dropped}</td><td>{}</td></tr>",
            html_escape(&sink.name),
            sink.kind,
            sink.total,
            sink.passed,
            sink.size,
            sink.consecutive_errors
        );
    }
    page.push_str("</table></body></html>");

    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_empty_registry() {
        // nothing installed in this process
        let status = collect();
        assert!(status.pipeline.is_none());
        assert!(status.sinks.is_empty());
    }

    #[test]
    fn page_without_pipeline() {
        let options = UiOptions::default();
        let page = render_page(
            &options,
            &StatusResponse {
                pipeline: None,
                sinks: Vec::new(),
            },
        );
        assert!(page.contains("<title>Logging Status</title>"));
        assert!(page.contains("no logging pipeline installed"));
        assert!(page.contains("content=\"5\""));
    }

    #[test]
    fn page_with_sinks() {
        let options = UiOptions::default();
        let page = render_page(
            &options,
            &StatusResponse {
                pipeline: Some(PipelineDto {
                    application: "orders".to_string(),
                    environment: "Staging".to_string(),
                    minimum_level: "Information".to_string(),
                    sinks: vec!["orders.file".to_string()],
                    configured_at: "2025-01-01T00:00:00Z".to_string(),
                }),
                sinks: vec![SinkDto {
                    name: "orders.file".to_string(),
                    kind: "file".to_string(),
                    total: 10,
                    passed: 9,
                    size: 1024,
                    dropped: DroppedDto {
                        format_failed: 0,
                        channel_closed: 0,
                        channel_overflow: 1,
                        peer_unreachable: 0,
                    },
                    consecutive_errors: 3,
                }],
            },
        );
        assert!(page.contains("<b>orders</b>"));
        assert!(page.contains("<td>orders.file</td>"));
        assert!(page.contains("<td>1</td><td>3</td>"));
    }

    #[test]
    fn escape() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
