/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Logging status UI for axum hosts.
//!
//! [`register`] nests a small sub-application into the host router: an
//! auto-refreshing HTML page at the mount path and a JSON endpoint under
//! `api/status`, both reading the pipeline status and per-sink counters
//! published by `ezlog`.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;

mod status;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("no mount path set for the logging status ui")]
    EmptyMountPath,
    #[error("mount path {0} should start with '/'")]
    RelativeMountPath(String),
}

/// Settings for the status UI, mutated in place by the registration
/// callback.
#[derive(Clone, Debug, PartialEq)]
pub struct UiOptions {
    mount_path: String,
    page_title: String,
    refresh_seconds: u32,
}

impl Default for UiOptions {
    fn default() -> Self {
        UiOptions {
            mount_path: "/logger".to_string(),
            page_title: "Logging Status".to_string(),
            refresh_seconds: 5,
        }
    }
}

impl UiOptions {
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    pub fn set_mount_path(&mut self, path: String) {
        self.mount_path = path;
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn set_page_title(&mut self, title: String) {
        self.page_title = title;
    }

    pub fn refresh_seconds(&self) -> u32 {
        self.refresh_seconds
    }

    pub fn set_refresh_seconds(&mut self, seconds: u32) {
        self.refresh_seconds = seconds;
    }
}

/// Nest the status UI into `router` at the configured mount path.
///
/// The callback runs against a default [`UiOptions`] first; an empty or
/// non-absolute mount path is rejected before the router is touched.
pub fn register<F>(router: Router, configure: F) -> Result<Router, RegisterError>
where
    F: FnOnce(&mut UiOptions),
{
    let mut options = UiOptions::default();
    configure(&mut options);

    if options.mount_path.is_empty() {
        return Err(RegisterError::EmptyMountPath);
    }
    if !options.mount_path.starts_with('/') {
        return Err(RegisterError::RelativeMountPath(options.mount_path));
    }

    let mount_path = options.mount_path.clone();
    Ok(router.nest(&mount_path, status::router(Arc::new(options))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_ok() {
        let router = register(Router::new(), |options| {
            options.set_page_title("orders logging".to_string());
            options.set_refresh_seconds(10);
        });
        assert!(router.is_ok());
    }

    #[test]
    fn register_empty_mount_path() {
        let r = register(Router::new(), |options| {
            options.set_mount_path(String::new());
        });
        assert!(matches!(r, Err(RegisterError::EmptyMountPath)));
    }

    #[test]
    fn register_relative_mount_path() {
        let r = register(Router::new(), |options| {
            options.set_mount_path("logger".to_string());
        });
        assert!(matches!(r, Err(RegisterError::RelativeMountPath(p)) if p == "logger"));
    }

    #[test]
    fn default_options() {
        let options = UiOptions::default();
        assert_eq!(options.mount_path(), "/logger");
        assert_eq!(options.page_title(), "Logging Status");
        assert_eq!(options.refresh_seconds(), 5);
    }
}
