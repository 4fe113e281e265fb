// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::{HttpRequest, HttpResponse};

/// Arguments for the [`on_backoff`][super::RetryLayer::on_backoff] callback.
///
/// Describes a retry that has just been scheduled.
#[derive(Debug, Clone, Copy)]
pub struct BackoffArgs<'a> {
    pub(super) request: &'a HttpRequest,
    pub(super) response: &'a HttpResponse,
    pub(super) delay: Duration,
}

impl<'a> BackoffArgs<'a> {
    /// Returns the attempt that was rate limited.
    #[must_use]
    pub fn request(&self) -> &'a HttpRequest {
        self.request
    }

    /// Returns the `429` response.
    #[must_use]
    pub fn response(&self) -> &'a HttpResponse {
        self.response
    }

    /// Returns the correlation id of the `429` response.
    #[must_use]
    pub fn request_id(&self) -> Option<&'a str> {
        self.response.request_id()
    }

    /// Returns how long the engine waits before the next attempt.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the number of retries already issued before this one.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.request.retry_count().unwrap_or(0)
    }
}

/// Arguments for the [`on_resume`][super::RetryLayer::on_resume] callback.
///
/// Describes the retried attempt that is about to be issued.
#[derive(Debug, Clone, Copy)]
pub struct ResumeArgs<'a> {
    pub(super) request: &'a HttpRequest,
    pub(super) request_id: Option<&'a str>,
}

impl<'a> ResumeArgs<'a> {
    /// Returns the new attempt.
    #[must_use]
    pub fn request(&self) -> &'a HttpRequest {
        self.request
    }

    /// Returns the correlation id of the `429` response that caused the retry.
    #[must_use]
    pub fn request_id(&self) -> Option<&'a str> {
        self.request_id
    }

    /// Returns the retry number of the new attempt, starting at one.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.request.retry_count().unwrap_or(0)
    }
}
