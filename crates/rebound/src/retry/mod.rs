// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Rate-limit retry middleware for HTTP transports.
//!
//! The primary types are [`RateLimitRetry`] and [`RetryLayer`]:
//!
//! - [`RateLimitRetry`] wraps a transport and transparently retries `429 Too Many Requests`
//!   responses once the server's rate-limit window resets
//! - [`RetryLayer`] configures and constructs the middleware
//!
//! The decisions themselves live in [`RetryPolicy`], a pure type that can be used without
//! any transport.
//!
//! # Quick Start
//!
//! ```rust
//! # use http::StatusCode;
//! # use layered::{Execute, Service, Stack};
//! # use rebound::retry::RateLimitRetry;
//! # use rebound::{HttpRequest, HttpResponse};
//! # use tick::Clock;
//! # async fn example(clock: Clock) -> rebound::Result<()> {
//! let stack = (
//!     RateLimitRetry::layer(&clock).max_retries(3),
//!     Execute::new(|_request: HttpRequest| async { Ok::<_, rebound::Error>(HttpResponse::new(StatusCode::OK)) }),
//! );
//!
//! let service = stack.into_service();
//! let response = service.execute(HttpRequest::get("https://example.com/api/v1/users")).await?;
//! # let _response = response;
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Decision
//!
//! A response is retried only if its status is `429`, the `x-rate-limit-reset` header was
//! sent exactly once, the chain is within its [`request_timeout`][RetryLayer::request_timeout]
//! and the request carries fewer than [`max_retries`][RetryLayer::max_retries] retries. Every
//! other response is returned unchanged, including the final `429` of an exhausted chain.
//! Transport failures are never retried.
//!
//! # Retry Delay
//!
//! The delay is computed from the server's clock: the distance between the `Date` header and
//! the `x-rate-limit-reset` instant, plus one second. If either header is missing or cannot be
//! parsed, the response is returned without a retry. The wait itself is a
//! [`Clock::delay`][tick::Clock::delay], so retries are deterministic under a controlled clock.
//!
//! # Retry Chain Headers
//!
//! Each retried attempt is a fresh copy of the previous one carrying two extra headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `x-okta-retry-for` | Correlation id of the first `429`; never overwritten |
//! | `x-okta-retry-count` | `1` on the first retry, incremented by one on each further retry |
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Max retries | `2` | [`max_retries`][RetryLayer::max_retries], [`config`][RetryLayer::config] |
//! | Request timeout | disabled | [`request_timeout`][RetryLayer::request_timeout], [`config`][RetryLayer::config] |
//!
//! # Telemetry
//!
//! ## Logs
//!
//! With the `logs` feature and [`enable_logs`][RetryLayer::enable_logs], the middleware emits a
//! `rebound.retry.backoff` event at `WARN` when a retry is scheduled and a
//! `rebound.retry.resume` event at `INFO` when it is issued.
//!
//! ## Metrics
//!
//! With the `metrics` feature and [`enable_metrics`][RetryLayer::enable_metrics], every
//! scheduled retry increments the `http.client.rate_limit.retry` counter with the
//! `http.retry.count` and `http.response.status_code` attributes.

mod args;
mod callbacks;
mod config;
mod constants;
mod layer;
mod policy;
mod service;
mod telemetry;

pub use args::{BackoffArgs, ResumeArgs};
pub(crate) use callbacks::{OnBackoff, OnResume};
pub use config::RetryConfig;
pub use layer::RetryLayer;
pub use policy::RetryPolicy;
pub use service::RateLimitRetry;
