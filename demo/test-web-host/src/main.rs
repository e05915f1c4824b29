/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Demo web host exercising the full logging pipeline: config binding,
//! install before serving, SIGHUP reload, per-request structured records
//! carrying `RequestPath`, the status UI, and teardown on shutdown.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use clap::{Arg, Command, value_parser};
use log::{info, warn};
use yaml_rust::Yaml;

use ezlog::LoggerOptions;

const ARG_CONFIG: &str = "config";

struct HostConfig {
    listen: SocketAddr,
    environment: String,
    logger: LoggerOptions,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            environment: "Development".to_string(),
            logger: LoggerOptions::default(),
        }
    }
}

impl HostConfig {
    fn parse(map: &yaml_rust::yaml::Hash) -> anyhow::Result<Self> {
        let mut config = HostConfig::default();
        g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
            "listen" => {
                let s = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
                config.listen = SocketAddr::from_str(&s)
                    .map_err(|e| anyhow!("invalid listen address {s}: {e}"))?;
                Ok(())
            }
            "environment" => {
                config.environment = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
                Ok(())
            }
            "logger" => {
                config.logger = LoggerOptions::parse(v).context("invalid logger config")?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        })?;
        Ok(config)
    }
}

fn load_config(path: &Path) -> anyhow::Result<HostConfig> {
    let mut config = None;
    g3_yaml::foreach_doc(path, |_, doc| match doc {
        Yaml::Hash(map) => {
            config = Some(HostConfig::parse(map)?);
            Ok(())
        }
        _ => Err(anyhow!("yaml doc root should be hash")),
    })?;
    config.ok_or_else(|| anyhow!("no config doc found in file {}", path.display()))
}

async fn index() -> &'static str {
    "test-web-host\n"
}

async fn healthz() -> &'static str {
    "ok\n"
}

async fn access_log(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().as_str().to_string();
    let response = next.run(req).await;
    slog::info!(slog_scope::logger(), "request handled";
        "RequestPath" => path,
        "Method" => method,
        "Status" => response.status().as_u16(),
    );
    response
}

#[cfg(unix)]
async fn reload_on_hangup(config_file: PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut hangup) = signal(SignalKind::hangup()) else {
        warn!("failed to register the SIGHUP handler, reload disabled");
        return;
    };
    while hangup.recv().await.is_some() {
        info!("reloading logger config");
        match load_config(&config_file) {
            Ok(config) => {
                if let Err(e) = ezlog::setup::reload(&config.logger, &config.environment) {
                    warn!("failed to reload the logging pipeline: {e:?}");
                } else {
                    info!("reload finished");
                }
            }
            Err(e) => warn!("error reloading config: {e:?}"),
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new("test-web-host")
        .arg(
            Arg::new(ARG_CONFIG)
                .short('c')
                .long(ARG_CONFIG)
                .required(true)
                .value_name("CONFIG FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();
    let config_file = args
        .get_one::<PathBuf>(ARG_CONFIG)
        .ok_or_else(|| anyhow!("no config file set"))?
        .clone();

    let config = load_config(&config_file)?;
    ezlog::setup::install(ezlog::setup::resolve(&config.logger, &config.environment))
        .context("failed to install the logging pipeline")?;

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(config_file.clone()));

    let app = Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .layer(middleware::from_fn(access_log));
    let app = ezlog_ui::register(app, |options| {
        options.set_page_title("test-web-host logging".to_string());
    })?;

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .context(format!("failed to listen on {}", config.listen))?;
    info!("listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    ezlog::setup::teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn parse_str(s: &str) -> anyhow::Result<HostConfig> {
        let docs = YamlLoader::load_from_str(s).unwrap();
        let Yaml::Hash(map) = &docs[0] else {
            panic!("test doc should be a hash");
        };
        HostConfig::parse(map)
    }

    #[test]
    fn parse_ok() {
        let config = parse_str(
            r#"
                listen: 127.0.0.1:9090
                environment: Staging
                logger:
                  name: demo
                  level: Warning
            "#,
        )
        .unwrap();
        assert_eq!(config.listen, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.environment, "Staging");
        let plan = ezlog::setup::resolve(&config.logger, &config.environment);
        assert_eq!(plan.application(), "demo");
        assert_eq!(plan.minimum_level(), ezlog::Severity::Warning);
    }

    #[test]
    fn parse_err() {
        assert!(parse_str("no_such_key: 1").is_err());
        assert!(parse_str("listen: not-an-addr").is_err());
    }
}
