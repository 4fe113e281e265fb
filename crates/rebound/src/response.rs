// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, StatusCode, header};
use serde::de::DeserializeOwned;
use tick::fmt::{Rfc2822, UnixSeconds};

use crate::Result;
use crate::headers::{RATE_LIMIT_RESET, REQUEST_ID};

/// The result of one transport exchange.
///
/// The body is fully buffered by the transport. Header lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    /// Creates a response with no headers and an empty body.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            url: String::new(),
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Sets the URL the response was received from.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Appends a header. Values that are not valid header values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the URL the response was received from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` for statuses in `[200, 300)`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns all values of a header joined with `", "`.
    ///
    /// Repeated headers are merged the way a fetch-style transport merges them, which is why a
    /// comma in a single-valued header indicates that the server sent it more than once.
    #[must_use]
    pub fn header_str(&self, name: &HeaderName) -> Option<String> {
        let mut values = self.headers.get_all(name).iter().filter_map(|v| v.to_str().ok()).peekable();
        values.peek()?;
        Some(values.collect::<Vec<_>>().join(", "))
    }

    /// Returns the server-assigned correlation id.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(REQUEST_ID).and_then(|value| value.to_str().ok())
    }

    /// Returns the server clock from the `Date` header.
    #[must_use]
    pub fn date(&self) -> Option<SystemTime> {
        let value = self.headers.get(header::DATE)?.to_str().ok()?;
        value.trim().parse::<Rfc2822>().ok().map(SystemTime::from)
    }

    /// Returns the instant at which the rate limit resets.
    ///
    /// Returns `None` if the header is missing, repeated, or is not an integer number of epoch seconds.
    #[must_use]
    pub fn rate_limit_reset(&self) -> Option<SystemTime> {
        let value = self.header_str(&RATE_LIMIT_RESET)?;
        value.trim().parse::<UnixSeconds>().ok().map(SystemTime::from)
    }

    /// Reads the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`][crate::Error::Json] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(HttpResponse: Send, Sync, Clone);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(StatusCode::OK).with_header(HeaderName::from_static("x-okta-request-id"), "abc");
        let mut headers = HeaderMap::new();
        let _previous = headers.insert(HeaderName::from_bytes(b"X-Okta-Request-Id").unwrap(), "abc".parse().unwrap());

        assert_eq!(response.request_id(), Some("abc"));
        assert_eq!(HttpResponse::new(StatusCode::OK).with_headers(headers).request_id(), Some("abc"));
    }

    #[test]
    fn date_parses_http_date() {
        let response = HttpResponse::new(StatusCode::OK).with_header(header::DATE, "Thu, 01 Jan 1970 00:01:40 GMT");
        assert_eq!(response.date(), Some(SystemTime::UNIX_EPOCH + Duration::from_secs(100)));
    }

    #[test]
    fn date_missing_or_invalid() {
        assert_eq!(HttpResponse::new(StatusCode::OK).date(), None);
        let response = HttpResponse::new(StatusCode::OK).with_header(header::DATE, "yesterday");
        assert_eq!(response.date(), None);
    }

    #[test]
    fn rate_limit_reset_parses_epoch_seconds() {
        let response = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS).with_header(RATE_LIMIT_RESET, "105");
        assert_eq!(response.rate_limit_reset(), Some(SystemTime::UNIX_EPOCH + Duration::from_secs(105)));
    }

    #[test]
    fn repeated_header_is_joined() {
        let response = HttpResponse::new(StatusCode::TOO_MANY_REQUESTS)
            .with_header(RATE_LIMIT_RESET, "105")
            .with_header(RATE_LIMIT_RESET, "106");

        assert_eq!(response.header_str(&RATE_LIMIT_RESET).as_deref(), Some("105, 106"));
        assert_eq!(response.rate_limit_reset(), None);
    }

    #[test]
    fn body_reads() {
        let response = HttpResponse::new(StatusCode::OK).with_body(r#"{"id":"00u1"}"#);

        assert_eq!(response.text(), r#"{"id":"00u1"}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], "00u1");
    }

    #[test]
    fn json_error_is_reported() {
        let response = HttpResponse::new(StatusCode::OK).with_body("not json");
        let error = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(error, crate::Error::Json(_)));
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(StatusCode::OK).is_success());
        assert!(HttpResponse::new(StatusCode::NO_CONTENT).is_success());
        assert!(!HttpResponse::new(StatusCode::FOUND).is_success());
        assert!(!HttpResponse::new(StatusCode::TOO_MANY_REQUESTS).is_success());
    }
}
