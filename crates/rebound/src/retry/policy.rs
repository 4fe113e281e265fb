// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use http::{HeaderValue, StatusCode};

use super::RetryConfig;
use super::constants::DELAY_PADDING;
use crate::headers::{RATE_LIMIT_RESET, RETRY_COUNT, RETRY_FOR};
use crate::{HttpRequest, HttpResponse};

/// Decides whether a completed exchange is retried and how the retry looks.
///
/// A response is retried only when all of the following hold:
///
/// - the status is `429 Too Many Requests`,
/// - the rate-limit reset header is present and was sent exactly once ([`can_retry`][Self::can_retry]),
/// - the logical chain has not exceeded its timeout ([`has_timed_out`][Self::has_timed_out]),
/// - the chain has retries left ([`max_retries_reached`][Self::max_retries_reached]).
///
/// The policy is pure: the current time is passed in rather than read from a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    request_timeout: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    /// Creates a policy from a configuration.
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            max_retries: config.max_retries,
        }
    }

    /// Sets the chain timeout; [`Duration::ZERO`] disables it.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the chain timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the maximum number of retries.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns `true` if the reset header is present and contains no comma.
    ///
    /// A comma means the header was repeated and merged; such a value cannot be trusted as a
    /// single integer, so the response is not retried.
    #[must_use]
    pub fn can_retry(response: &HttpResponse) -> bool {
        response.header_str(&RATE_LIMIT_RESET).is_some_and(|value| !value.contains(','))
    }

    /// Returns `true` if more than the configured timeout has elapsed since the chain started.
    ///
    /// Always `false` when the timeout is zero or the request has no start time.
    #[must_use]
    pub fn has_timed_out(&self, request: &HttpRequest, now: SystemTime) -> bool {
        if self.request_timeout.is_zero() {
            return false;
        }

        request
            .start_time()
            .is_some_and(|start| now.duration_since(start).unwrap_or(Duration::ZERO) > self.request_timeout)
    }

    /// Returns `true` if the request already carries `max_retries` or more retries.
    #[must_use]
    pub fn max_retries_reached(&self, request: &HttpRequest) -> bool {
        request.retry_count().is_some_and(|count| count >= self.max_retries)
    }

    /// Returns `true` if the exchange should be retried.
    #[must_use]
    pub fn should_retry(&self, response: &HttpResponse, request: &HttpRequest, now: SystemTime) -> bool {
        response.status() == StatusCode::TOO_MANY_REQUESTS
            && Self::can_retry(response)
            && !self.has_timed_out(request, now)
            && !self.max_retries_reached(request)
    }

    /// Computes how long to wait before retrying.
    ///
    /// The delay is the distance from the server's `Date` to the rate-limit reset instant plus
    /// one second of padding. The server clock is used as the reference so that local clock
    /// skew does not shorten or stretch the wait. A reset instant at or before the server date
    /// yields only the padding.
    ///
    /// Returns `None` if either header is missing or cannot be parsed.
    #[must_use]
    pub fn compute_delay(response: &HttpResponse) -> Option<Duration> {
        let reset = response.rate_limit_reset()?;
        let server_now = response.date()?;

        let wait = reset.duration_since(server_now).unwrap_or(Duration::ZERO);
        Some(wait.saturating_add(DELAY_PADDING))
    }

    /// Builds the next attempt of a chain from the previous attempt and its response.
    ///
    /// The returned request is an independent copy. Its start time is preserved, or set to
    /// `now` if the previous attempt never recorded one. The chain id header is set from the
    /// response correlation id only if it is not already present, and the retry counter is
    /// incremented by one.
    #[must_use]
    pub fn build_retry_request(request: &HttpRequest, response: &HttpResponse, now: SystemTime) -> HttpRequest {
        let mut retry = request.clone();
        retry.start_at(now);

        let count = request.retry_count().unwrap_or(0).saturating_add(1);
        let headers = retry.headers_mut();

        if !headers.contains_key(RETRY_FOR) {
            if let Some(value) = response.request_id().and_then(|id| HeaderValue::from_str(id).ok()) {
                let _previous = headers.insert(RETRY_FOR, value);
            }
        }

        let _previous = headers.insert(RETRY_COUNT, HeaderValue::from(count));
        retry
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(&config)
    }
}
