/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

const FLUENTD_DEFAULT_PORT: u16 = 24224;

/// Forwarding target for the network log aggregator sink.
///
/// `url` accepts `host:port`, a bare host (default port 24224) or a
/// `scheme://host:port` form. The host part may be an IP address or a DNS
/// name; names resolve once at sink build time.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FluentdOptions {
    pub(crate) enabled: bool,
    pub(crate) url: String,
    pub(crate) api_key: Option<String>,
}

impl FluentdOptions {
    pub fn parse(v: &Yaml) -> anyhow::Result<FluentdOptions> {
        match v {
            Yaml::Hash(map) => {
                let mut config = FluentdOptions::default();
                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "enabled" => {
                        config.enabled = g3_yaml::value::as_bool(v)
                            .context(format!("invalid bool value for key {k}"))?;
                        Ok(())
                    }
                    "url" => {
                        config.url = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        Ok(())
                    }
                    "api_key" | "apikey" | "shared_key" => {
                        let key = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        config.api_key = Some(key);
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;
                Ok(config)
            }
            Yaml::Null => Ok(FluentdOptions::default()),
            _ => Err(anyhow!("invalid value type")),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_url(&mut self, url: String) {
        self.url = url;
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    /// Resolve the configured url into a concrete server address.
    pub(crate) fn server_addr(&self) -> anyhow::Result<SocketAddr> {
        if self.url.is_empty() {
            return Err(anyhow!("no url set for the fluentd sink"));
        }

        let s = match self.url.find("://") {
            Some(p) => &self.url[p + 3..],
            None => self.url.as_str(),
        };
        let s = s.trim_end_matches('/');
        if s.is_empty() {
            return Err(anyhow!("no host found in fluentd url {}", self.url));
        }

        if let Ok(addr) = SocketAddr::from_str(s) {
            return Ok(addr);
        }
        if let Ok(ip) = IpAddr::from_str(s) {
            return Ok(SocketAddr::new(ip, FLUENTD_DEFAULT_PORT));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = u16::from_str(port)
                    .map_err(|e| anyhow!("invalid port in fluentd url {}: {e}", self.url))?;
                (host, port)
            }
            None => (s, FLUENTD_DEFAULT_PORT),
        };
        (host, port)
            .to_socket_addrs()
            .map_err(|e| anyhow!("failed to resolve fluentd host {host}: {e}"))?
            .next()
            .ok_or_else(|| anyhow!("fluentd host {host} resolved to no address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust::YamlLoader;

    fn with_url(url: &str) -> FluentdOptions {
        let mut config = FluentdOptions::default();
        config.set_url(url.to_string());
        config
    }

    #[test]
    fn server_addr_ok() {
        let addr = with_url("127.0.0.1:2021").server_addr().unwrap();
        assert_eq!(addr, SocketAddr::from_str("127.0.0.1:2021").unwrap());

        let addr = with_url("tcp://127.0.0.1:2021").server_addr().unwrap();
        assert_eq!(addr, SocketAddr::from_str("127.0.0.1:2021").unwrap());

        let addr = with_url("192.168.1.9").server_addr().unwrap();
        assert_eq!(addr.port(), FLUENTD_DEFAULT_PORT);

        let addr = with_url("[::1]:2021").server_addr().unwrap();
        assert_eq!(addr, SocketAddr::from_str("[::1]:2021").unwrap());

        let addr = with_url("localhost:2021").server_addr().unwrap();
        assert_eq!(addr.port(), 2021);
    }

    #[test]
    fn server_addr_err() {
        assert!(with_url("").server_addr().is_err());
        assert!(with_url("tcp://").server_addr().is_err());
        assert!(with_url("127.0.0.1:notaport").server_addr().is_err());
        assert!(with_url("no.such.host.invalid:2021").server_addr().is_err());
    }

    #[test]
    fn parse_ok() {
        let docs = YamlLoader::load_from_str(
            r#"
                enabled: true
                url: fluentd.local:24224
                ApiKey: secret
            "#,
        )
        .unwrap();
        let config = FluentdOptions::parse(&docs[0]).unwrap();
        assert!(config.enabled);
        assert_eq!(config.url, "fluentd.local:24224");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn parse_err() {
        let docs = YamlLoader::load_from_str("endpoint: x").unwrap();
        assert!(FluentdOptions::parse(&docs[0]).is_err());
    }
}
