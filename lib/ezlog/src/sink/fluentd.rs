/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use g3_fluentd::{FluentdClientConfig, FluentdFormatter};
use g3_types::log::{AsyncLogConfig, AsyncLogger};

use crate::options::FluentdOptions;

/// The io thread, transport and msgpack framing all live in the fluentd
/// client crate; this only maps the bound options onto its config.
pub(crate) fn new_fluentd_sink(
    async_conf: &AsyncLogConfig,
    options: &FluentdOptions,
    tag_name: String,
) -> anyhow::Result<AsyncLogger<Vec<u8>, FluentdFormatter>> {
    let server_addr = options.server_addr()?;
    let mut config = FluentdClientConfig::new(server_addr);
    if let Some(key) = &options.api_key {
        config.set_shared_key(key.clone());
    }
    Ok(g3_fluentd::new_async_logger(
        async_conf,
        &Arc::new(config),
        tag_name,
    ))
}
