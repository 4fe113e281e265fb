// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::headers::{RETRY_COUNT, RETRY_FOR};

/// One attempt of a logical HTTP exchange.
///
/// `HttpRequest` is a plain value: cloning it produces a fully independent copy, header map
/// included. The retry engine never mutates an attempt that has been handed to the transport;
/// every retry is derived from a fresh clone of the previous attempt.
///
/// The start time is recorded once, on the first attempt of a logical chain, and is carried
/// unchanged into every retried copy. It is the reference point for the request timeout.
///
/// # Examples
///
/// ```
/// use http::{HeaderValue, Method, header};
/// use rebound::HttpRequest;
///
/// let request = HttpRequest::new(Method::POST, "https://example.com/api/v1/users")
///     .with_header(header::ACCEPT, HeaderValue::from_static("application/json"))
///     .with_body("{}");
///
/// assert_eq!(request.method(), Method::POST);
/// assert_eq!(request.retry_count(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
    start_time: Option<SystemTime>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            start_time: None,
        }
    }

    /// Creates a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Returns the target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Sets a header, replacing any previous values with the same name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        let _previous = self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the time the first attempt of this logical chain was issued.
    #[must_use]
    pub fn start_time(&self) -> Option<SystemTime> {
        self.start_time
    }

    /// Sets the start time of the logical chain.
    #[must_use]
    pub fn with_start_time(mut self, start_time: SystemTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Records `now` as the start time unless one was already recorded.
    pub(crate) fn start_at(&mut self, now: SystemTime) {
        if self.start_time.is_none() {
            self.start_time = Some(now);
        }
    }

    /// Returns the number of retries already issued for this logical chain.
    ///
    /// Returns `None` when the retry counter header is absent or is not a valid unsigned integer.
    #[must_use]
    pub fn retry_count(&self) -> Option<u32> {
        self.headers
            .get(RETRY_COUNT)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }

    /// Returns the correlation id of the response that started this retry chain.
    #[must_use]
    pub fn retry_for(&self) -> Option<&str> {
        self.headers.get(RETRY_FOR).and_then(|value| value.to_str().ok())
    }
}

/// Describes a request the caller wants the [`Client`][crate::Client] to issue.
///
/// The URL is supplied separately when executing. The method defaults to `GET`.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestOptions {
    /// Creates `GET` options with no headers and no body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing any previous values with the same name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        let _previous = self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the request, layering the caller's headers over `defaults`.
    pub(crate) fn into_request(self, url: &str, defaults: &HeaderMap) -> HttpRequest {
        let mut headers = defaults.clone();
        for (name, value) in &self.headers {
            let _previous = headers.insert(name.clone(), value.clone());
        }

        HttpRequest {
            url: url.to_owned(),
            method: self.method,
            headers,
            body: self.body,
            start_time: None,
        }
    }
}

/// Hints passed through to the cache middleware for a single call.
///
/// `is_collection` marks listing endpoints whose results should not be cached by key.
/// `resources` names additional cache keys invalidated when a mutating call succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    is_collection: bool,
    resources: Vec<String>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the call as returning a collection.
    #[must_use]
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    /// Adds a resource whose cached representation the call affects.
    #[must_use]
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Returns `true` if the call returns a collection.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    /// Returns the resources the call affects.
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub(crate) fn into_parts(self) -> (bool, Vec<String>) {
        (self.is_collection, self.resources)
    }
}
