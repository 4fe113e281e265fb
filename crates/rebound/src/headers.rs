// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Header names the pipeline reads from responses and writes to retried requests.
//!
//! Header names are case-insensitive on the wire; [`HeaderName`] stores them lowercased.

use http::HeaderName;

/// Server-assigned correlation id of the request that produced a response.
pub const REQUEST_ID: HeaderName = HeaderName::from_static("x-okta-request-id");

/// Epoch seconds at which the current rate-limit window resets.
pub const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-rate-limit-reset");

/// Number of retries already issued for a logical request. Absent on the first attempt.
pub const RETRY_COUNT: HeaderName = HeaderName::from_static("x-okta-retry-count");

/// Correlation id of the response that started the retry chain.
pub const RETRY_FOR: HeaderName = HeaderName::from_static("x-okta-retry-for");

/// Media type used by the JSON convenience calls.
pub(crate) const APPLICATION_JSON: &str = "application/json";
