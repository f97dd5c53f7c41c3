//! Checker configuration
//!
//! Configuration is resolved from, in increasing precedence:
//! - Default values
//! - A configuration file (YAML or JSON)
//! - Environment variables
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use crate::error::ConfigError;
use apicheck_schemas::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that switches fail-fast mode on or off
pub const FAIL_FAST_ENV: &str = "APICHECK_FAIL_FAST";

/// Options of a [`ContractChecker`](crate::ContractChecker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    /// Raise the first violation as an error instead of collecting a report
    pub fail_fast: bool,

    /// Report request headers the action does not declare
    pub report_undefined_headers: bool,

    /// Never report undefined headers starting with `X-`
    pub ignore_x_headers: bool,

    /// Capacity of each schema validator's compiled-schema cache; 0 disables it
    pub max_cached_schemas: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            report_undefined_headers: false,
            ignore_x_headers: true,
            max_cached_schemas: 256,
        }
    }
}

impl CheckerConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml { source })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Json { source })
    }

    /// Load configuration from a `.yaml`, `.yml` or `.json` file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        let content = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content()?),
            Some("json") => Self::from_json_str(&content()?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Apply environment overrides on top of this configuration
    pub fn merge_with_env(self) -> Self {
        self.merge_with_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn merge_with_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(FAIL_FAST_ENV) {
            match parse_flag(&value) {
                Some(flag) => self.fail_fast = flag,
                None => log::warn!("Ignoring invalid {} value '{}'", FAIL_FAST_ENV, value),
            }
        }
        self
    }

    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    pub fn with_undefined_headers_reported(mut self) -> Self {
        self.report_undefined_headers = true;
        self
    }

    /// Cache settings for the schema validators
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::with_capacity(self.max_cached_schemas)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
