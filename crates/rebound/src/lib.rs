// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Rate-limit aware HTTP request pipeline.
//!
//! This crate issues requests against a web API through a fixed, order-sensitive pipeline:
//! bearer tokens are attached, rate-limited responses are retried once the server's window
//! resets, failures are classified into typed errors, rejected tokens are refreshed, and an
//! optional cache middleware can answer calls without touching the network.
//!
//! # Core Types
//!
//! - [`Client`]: The entry point. Built with [`Client::builder`] around a transport.
//! - [`HttpRequest`] and [`HttpResponse`]: Plain values exchanged with the transport.
//! - [`Error`]: Classified API, HTTP, transport, auth and cache failures.
//! - [`RateLimitRetry`][retry::RateLimitRetry]: The retry middleware, usable on its own as a
//!   [`layered`] layer.
//!
//! # Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use layered::Execute;
//! use rebound::retry::RetryLayer;
//! use rebound::{Client, HttpRequest, HttpResponse};
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let transport = Execute::new(|_request: HttpRequest| async {
//!     Ok::<_, rebound::Error>(HttpResponse::new(StatusCode::OK).with_body("hello"))
//! });
//!
//! let client = Client::builder(transport, &clock)
//!     .retry(RetryLayer::new(&clock).max_retries(3))
//!     .default_cache_middleware()
//!     .build();
//!
//! let response = client.get("https://example.com/api/v1/users/me").await?;
//! assert_eq!(response.text(), "hello");
//! # Ok::<(), rebound::Error>(())
//! # }).unwrap();
//! ```
//!
//! # Pipeline
//!
//! | Step | Component | Configured By |
//! |------|-----------|---------------|
//! | Cache lookup | [`CacheMiddleware`][cache::CacheMiddleware] | [`ClientBuilder::cache_middleware`] |
//! | Auth injection | [`AuthProvider`][auth::AuthProvider] | [`ClientBuilder::auth_provider`] |
//! | Rate-limit retry | [`RetryLayer`][retry::RetryLayer] | [`ClientBuilder::retry`] |
//! | Exchange | [`Transport`][transport::Transport] | [`Client::builder`] |
//! | Error classification | [`Error::from_response`] | always on |
//! | Token refresh | [`AuthProvider`][auth::AuthProvider] | [`ClientBuilder::max_auth_refreshes`] |
//!
//! # Features
//!
//! - `logs` (default): Structured `tracing` events for retries and token refreshes.
//! - `metrics`: An OpenTelemetry counter of scheduled retries.
//! - `serde`: Deserializable configuration types.
//! - `hyper`: [`HyperTransport`][transport::HyperTransport], a ready-made HTTP/1 transport.

pub mod auth;
pub mod cache;
mod client;
mod error;
pub mod headers;
mod request;
mod response;
pub mod retry;
pub mod transport;
mod utils;

#[cfg(any(feature = "metrics", test))]
mod metrics;

pub use client::{CacheConfig, Client, ClientBuilder, ClientConfig};
pub use error::{ApiError, Error, HttpError, Result};
#[doc(inline)]
pub use recoverable::{Recovery, RecoveryInfo, RecoveryKind};
pub use request::{HttpRequest, RequestContext, RequestOptions};
pub use response::HttpResponse;

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;
