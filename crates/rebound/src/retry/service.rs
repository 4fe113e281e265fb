// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use layered::Service;
use tick::Clock;

use super::telemetry::RetryTelemetry;
use super::{BackoffArgs, OnBackoff, OnResume, ResumeArgs, RetryLayer, RetryPolicy};
use crate::{HttpRequest, HttpResponse, Result};

/// Retries rate-limited exchanges of an inner transport.
///
/// `RateLimitRetry` wraps a transport and inspects every response it returns. A `429` that
/// satisfies the [`RetryPolicy`] is held back: the engine waits until the server's rate-limit
/// window resets, derives a new attempt from the previous one and issues it. Any other
/// response, including a `429` that may not be retried, is returned unchanged. Transport
/// failures are returned immediately.
///
/// Attempts of one chain are strictly sequential.
///
/// Created by calling [`RateLimitRetry::layer`] and applying the returned
/// [`RetryLayer`] to a transport.
#[derive(Debug)]
pub struct RateLimitRetry<S> {
    pub(super) shared: Arc<RetryShared>,
    pub(super) inner: S,
}

#[derive(Debug)]
pub(super) struct RetryShared {
    pub(super) clock: Clock,
    pub(super) policy: RetryPolicy,
    pub(super) on_backoff: Vec<OnBackoff>,
    pub(super) on_resume: Vec<OnResume>,
    pub(super) telemetry: RetryTelemetry,
}

impl<S: Clone> Clone for RateLimitRetry<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inner: self.inner.clone(),
        }
    }
}

impl RateLimitRetry<()> {
    /// Creates a retry layer that uses `clock` for timeouts and delays.
    #[must_use]
    pub fn layer(clock: &Clock) -> RetryLayer {
        RetryLayer::new(clock)
    }
}

impl<S> Service<HttpRequest> for RateLimitRetry<S>
where
    S: Service<HttpRequest, Out = Result<HttpResponse>>,
{
    type Out = Result<HttpResponse>;

    async fn execute(&self, mut request: HttpRequest) -> Self::Out {
        request.start_at(self.shared.clock.system_time());

        loop {
            // the inner service gets its own copy; `request` stays untouched for the next retry
            let response = self.inner.execute(request.clone()).await?;

            match self.shared.evaluate(&request, response) {
                ControlFlow::Continue(backoff) => {
                    self.shared.clock.delay(backoff.delay).await;

                    let retry = RetryPolicy::build_retry_request(&request, &backoff.response, self.shared.clock.system_time());
                    self.shared.notify_resume(&retry, backoff.response.request_id());
                    request = retry;
                }
                ControlFlow::Break(response) => return Ok(response),
            }
        }
    }
}

impl RetryShared {
    fn evaluate(&self, request: &HttpRequest, response: HttpResponse) -> ControlFlow<HttpResponse, ScheduledRetry> {
        if !self.policy.should_retry(&response, request, self.clock.system_time()) {
            return ControlFlow::Break(response);
        }

        let Some(delay) = RetryPolicy::compute_delay(&response) else {
            return ControlFlow::Break(response);
        };

        self.notify_backoff(BackoffArgs {
            request,
            response: &response,
            delay,
        });

        ControlFlow::Continue(ScheduledRetry { response, delay })
    }

    fn notify_backoff(&self, args: BackoffArgs<'_>) {
        self.telemetry.backoff(args);
        self.on_backoff.iter().for_each(|callback| callback.call(args));
    }

    fn notify_resume(&self, request: &HttpRequest, request_id: Option<&str>) {
        let args = ResumeArgs { request, request_id };
        self.telemetry.resume(args);
        self.on_resume.iter().for_each(|callback| callback.call(args));
    }
}

/// A `429` the engine decided to retry.
struct ScheduledRetry {
    response: HttpResponse,
    delay: Duration,
}
