// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::Duration;

use layered::Layer;
use tick::Clock;

use super::telemetry::RetryTelemetry;
use super::{BackoffArgs, OnBackoff, OnResume, RateLimitRetry, ResumeArgs, RetryConfig, RetryPolicy};
use super::service::RetryShared;

/// Builder for the rate-limit retry middleware.
///
/// Created by [`RetryLayer::new`] or [`RateLimitRetry::layer`]. The layer can be applied to
/// any number of transports; each application shares the same configuration and observers.
///
/// For examples, see the [retry module][crate::retry] documentation.
#[derive(Debug, Clone)]
pub struct RetryLayer {
    clock: Clock,
    policy: RetryPolicy,
    on_backoff: Vec<OnBackoff>,
    on_resume: Vec<OnResume>,
    telemetry: RetryTelemetry,
}

impl RetryLayer {
    /// Creates a layer with default settings: two retries and no chain timeout.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            policy: RetryPolicy::default(),
            on_backoff: Vec::new(),
            on_resume: Vec::new(),
            telemetry: RetryTelemetry::default(),
        }
    }

    /// Sets the budget of a whole logical chain, measured from its first attempt.
    ///
    /// A retry is not scheduled once the budget is exceeded; the `429` response is returned
    /// instead. In-flight exchanges and scheduled delays are never cut short.
    ///
    /// **Default**: [`Duration::ZERO`], which disables the check.
    #[must_use]
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.policy = self.policy.with_request_timeout(request_timeout);
        self
    }

    /// Sets the maximum number of retries after the original attempt.
    ///
    /// **Default**: 2
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy = self.policy.with_max_retries(max_retries);
        self
    }

    /// Applies the timeout and retry limit from a configuration.
    #[must_use]
    pub fn config(mut self, config: &RetryConfig) -> Self {
        self.policy = RetryPolicy::new(config);
        self
    }

    /// Registers an observer invoked each time a retry is scheduled, before the delay starts.
    ///
    /// Observers have no influence on the retry decision. Multiple observers are invoked in
    /// registration order.
    #[must_use]
    pub fn on_backoff(mut self, callback: impl Fn(BackoffArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_backoff.push(OnBackoff::new(callback));
        self
    }

    /// Registers an observer invoked with the retried attempt right before it is issued.
    #[must_use]
    pub fn on_resume(mut self, callback: impl Fn(ResumeArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_resume.push(OnResume::new(callback));
        self
    }

    /// Emits `rebound.retry.backoff` and `rebound.retry.resume` log events.
    #[must_use]
    #[cfg(any(feature = "logs", test))]
    pub fn enable_logs(mut self) -> Self {
        self.telemetry.logs_enabled = true;
        self
    }

    /// Reports scheduled retries to the `http.client.rate_limit.retry` counter.
    #[must_use]
    #[cfg(any(feature = "metrics", test))]
    pub fn enable_metrics(mut self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        let meter = crate::metrics::create_meter(provider);
        self.telemetry.retry_counter = Some(crate::metrics::create_retry_counter(&meter));
        self
    }

    #[cfg(test)]
    pub(crate) fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RateLimitRetry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitRetry {
            shared: Arc::new(RetryShared {
                clock: self.clock.clone(),
                policy: self.policy,
                on_backoff: self.on_backoff.clone(),
                on_resume: self.on_resume.clone(),
                telemetry: self.telemetry.clone(),
            }),
            inner,
        }
    }
}
