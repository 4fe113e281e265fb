// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The executor that performs a single HTTP exchange.
//!
//! A transport is any [`Service`] from [`HttpRequest`] to [`Result<HttpResponse>`]. It sends
//! exactly one request and buffers the whole response body. It does not retry, classify
//! statuses, or follow redirects; the [`Client`][crate::Client] layers all of that on top.
//!
//! Closures become transports through [`layered::Execute`]:
//!
//! ```
//! use http::StatusCode;
//! use layered::Execute;
//! use rebound::transport::Transport;
//! use rebound::{HttpRequest, HttpResponse};
//!
//! fn assert_transport(_: &impl Transport) {}
//!
//! let transport = Execute::new(|request: HttpRequest| async move {
//!     Ok::<_, rebound::Error>(HttpResponse::new(StatusCode::OK).with_url(request.url()))
//! });
//! assert_transport(&transport);
//! ```
//!
//! With the `hyper` feature, [`HyperTransport`] sends requests over plain-text HTTP/1.

use layered::Service;

use crate::{HttpRequest, HttpResponse, Result};

/// A service that performs one HTTP exchange.
///
/// Implemented for every matching [`Service`]; there is nothing to implement by hand.
pub trait Transport: Service<HttpRequest, Out = Result<HttpResponse>> + 'static {}

impl<T> Transport for T where T: Service<HttpRequest, Out = Result<HttpResponse>> + 'static {}

#[cfg(feature = "hyper")]
pub use hyper_transport::HyperTransport;

#[cfg(feature = "hyper")]
mod hyper_transport {
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper_util::client::legacy::Client;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::rt::TokioExecutor;
    use layered::Service;

    use crate::{Error, HttpRequest, HttpResponse, Result};

    /// A transport backed by a pooled hyper client.
    ///
    /// Speaks HTTP/1 over TCP without TLS. Must be used from within a Tokio runtime.
    #[derive(Debug, Clone)]
    pub struct HyperTransport {
        client: Client<HttpConnector, Full<Bytes>>,
    }

    impl HyperTransport {
        /// Creates a transport with a default connection pool.
        #[must_use]
        pub fn new() -> Self {
            Self {
                client: Client::builder(TokioExecutor::new()).build_http(),
            }
        }
    }

    impl Default for HyperTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Service<HttpRequest> for HyperTransport {
        type Out = Result<HttpResponse>;

        async fn execute(&self, request: HttpRequest) -> Self::Out {
            let url = request.url().to_owned();
            let body = request.body().cloned().unwrap_or_default();

            let mut builder = http::Request::builder().method(request.method().clone()).uri(request.url());
            if let Some(headers) = builder.headers_mut() {
                headers.extend(request.headers().clone());
            }

            let outgoing = builder
                .body(Full::new(body))
                .map_err(|e| Error::InvalidRequest(e.to_string()))?;

            let (parts, incoming) = self.client.request(outgoing).await.map_err(Error::transport)?.into_parts();
            let body = incoming.collect().await.map_err(Error::transport)?.to_bytes();

            Ok(HttpResponse::new(parts.status).with_url(url).with_headers(parts.headers).with_body(body))
        }
    }

}
