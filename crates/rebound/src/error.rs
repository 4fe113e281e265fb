// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display, Formatter};

use http::{HeaderMap, StatusCode};
use recoverable::{Recovery, RecoveryInfo};
use serde_json::Value;
use thiserror::Error;

use crate::HttpResponse;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Any error surfaced by the request pipeline.
///
/// Non-2xx responses are classified into [`Error::Api`] when the body is JSON and
/// [`Error::Http`] otherwise. Failures of the transport itself are forwarded unchanged as
/// [`Error::Transport`].
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A non-2xx response whose body is JSON.
    #[error(transparent)]
    Api(Box<ApiError>),

    /// A non-2xx response whose body is not JSON.
    #[error(transparent)]
    Http(Box<HttpError>),

    /// The transport failed to complete the exchange.
    #[error("transport failure: {0}")]
    Transport(#[source] BoxedError),

    /// The auth provider failed to supply or introspect a token.
    #[error("authentication failure: {0}")]
    Auth(#[source] BoxedError),

    /// The cache store or cache middleware failed.
    #[error("cache failure: {0}")]
    Cache(#[source] BoxedError),

    /// A request or response body could not be (de)serialized as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The request description could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A specialized `Result` for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps a transport failure.
    pub fn transport(cause: impl Into<BoxedError>) -> Self {
        Self::Transport(cause.into())
    }

    /// Wraps an auth provider failure.
    pub fn auth(cause: impl Into<BoxedError>) -> Self {
        Self::Auth(cause.into())
    }

    /// Wraps a cache failure.
    pub fn cache(cause: impl Into<BoxedError>) -> Self {
        Self::Cache(cause.into())
    }

    /// Classifies a non-2xx response.
    ///
    /// A body that parses as JSON yields [`Error::Api`]; anything else yields [`Error::Http`]
    /// carrying the raw text.
    #[must_use]
    pub fn from_response(response: HttpResponse) -> Self {
        match serde_json::from_slice::<Value>(response.body()) {
            Ok(body) => Self::Api(Box::new(ApiError::new(response, body))),
            Err(_) => Self::Http(Box::new(HttpError::new(response))),
        }
    }

    /// Returns the HTTP status for classified response errors.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(error) => Some(error.status),
            Self::Http(error) => Some(error.status),
            _ => None,
        }
    }
}

impl Recovery for Error {
    fn recovery(&self) -> RecoveryInfo {
        match (self, self.status()) {
            (_, Some(StatusCode::TOO_MANY_REQUESTS)) => RecoveryInfo::retry(),
            (_, Some(StatusCode::SERVICE_UNAVAILABLE)) => RecoveryInfo::unavailable(),
            (Self::Transport(_), _) => RecoveryInfo::unknown(),
            _ => RecoveryInfo::never(),
        }
    }
}

/// A non-2xx response with a JSON body.
///
/// The well-known error fields (`errorCode`, `errorSummary`, `errorId`, `errorLink` and the
/// summaries of `errorCauses`) are extracted when present; the full body stays available
/// through [`ApiError::body`].
#[derive(Debug, Clone)]
pub struct ApiError {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
    error_code: Option<String>,
    error_summary: Option<String>,
    error_id: Option<String>,
    error_link: Option<String>,
    error_causes: Vec<String>,
}

impl ApiError {
    fn new(response: HttpResponse, body: Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(ToOwned::to_owned);
        let error_causes = body
            .get("errorCauses")
            .and_then(Value::as_array)
            .map(|causes| {
                causes
                    .iter()
                    .filter_map(|cause| cause.get("errorSummary").and_then(Value::as_str))
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            url: response.url().to_owned(),
            status: response.status(),
            headers: response.headers().clone(),
            error_code: field("errorCode"),
            error_summary: field("errorSummary"),
            error_id: field("errorId"),
            error_link: field("errorLink"),
            error_causes,
            body,
        }
    }

    /// Returns the URL of the failed request.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the parsed response body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the `errorCode` field.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Returns the `errorSummary` field.
    #[must_use]
    pub fn error_summary(&self) -> Option<&str> {
        self.error_summary.as_deref()
    }

    /// Returns the `errorId` field.
    #[must_use]
    pub fn error_id(&self) -> Option<&str> {
        self.error_id.as_deref()
    }

    /// Returns the `errorLink` field.
    #[must_use]
    pub fn error_link(&self) -> Option<&str> {
        self.error_link.as_deref()
    }

    /// Returns the summaries of the `errorCauses` entries.
    #[must_use]
    pub fn error_causes(&self) -> &[String] {
        &self.error_causes
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status.as_u16())?;

        if let Some(code) = &self.error_code {
            write!(f, " {code}")?;
        }

        if let Some(summary) = &self.error_summary {
            write!(f, " {summary}")?;
        }

        if !self.error_causes.is_empty() {
            write!(f, ". {}", self.error_causes.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// A non-2xx response whose body is not JSON.
#[derive(Debug, Clone)]
pub struct HttpError {
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl HttpError {
    fn new(response: HttpResponse) -> Self {
        Self {
            body: response.text(),
            url: response.url().to_owned(),
            status: response.status(),
            headers: response.headers().clone(),
        }
    }

    /// Returns the URL of the failed request.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} {}", self.status.as_u16(), self.body)
    }
}

impl std::error::Error for HttpError {}
