// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::constants::{DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_MS};

/// Configuration of the rate-limit retry engine.
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `request_timeout_ms` | `0` | Budget for a whole logical chain, measured from its first attempt. `0` disables the check. |
/// | `max_retries` | `2` | Retries allowed after the original attempt. |
///
/// With the `serde` feature enabled the type can be deserialized; missing fields take their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct RetryConfig {
    /// Budget for a logical chain in milliseconds. `0` means unbounded.
    pub request_timeout_ms: u64,
    /// Maximum number of retries after the original attempt.
    pub max_retries: u32,
}

impl RetryConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in milliseconds.
    #[must_use]
    pub fn with_request_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the request timeout; [`Duration::ZERO`] means unbounded.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
