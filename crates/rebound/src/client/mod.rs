// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod builder;
mod config;
mod pipeline;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use builder::ClientBuilder;
use bytes::Bytes;
pub use config::{CacheConfig, ClientConfig};
use http::{HeaderMap, HeaderValue, Method, header};
pub(crate) use pipeline::Pipeline;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::Clock;

use crate::cache::{CacheContext, CacheMiddleware, DynCacheMiddleware, DynamicStore, Next};
use crate::headers::APPLICATION_JSON;
use crate::transport::Transport;
use crate::{Error, HttpResponse, RequestContext, RequestOptions, Result};

/// Issues requests through the full pipeline.
///
/// Each call runs these steps in order:
///
/// 1. the request is built from the caller's options over the client's default headers,
/// 2. the cache middleware, if any, decides whether the network is needed,
/// 3. a bearer token from the auth provider, if any, is attached,
/// 4. the transport executes the request, transparently retrying rate-limited responses,
/// 5. a non-2xx final response becomes an [`Error::Api`] or [`Error::Http`],
/// 6. a `401` for an inactive token clears the token and repeats steps 3 to 5.
///
/// `Client` is cheap to clone; clones share the transport, collaborators and cache store.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use layered::Execute;
/// use rebound::{Client, HttpRequest, HttpResponse};
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let transport = Execute::new(|request: HttpRequest| async move {
///     Ok::<_, rebound::Error>(HttpResponse::new(StatusCode::OK).with_url(request.url()).with_body(r#"{"id":"00u1"}"#))
/// });
///
/// let client = Client::builder(transport, &Clock::new_frozen()).build();
/// let user: serde_json::Value = client.get_json("https://example.com/api/v1/users/me").await?;
///
/// assert_eq!(user["id"], "00u1");
/// # Ok::<(), rebound::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Client {
    pipeline: Arc<Pipeline>,
    cache: Option<Arc<DynCacheMiddleware<'static>>>,
    store: DynamicStore,
    default_headers: Arc<HeaderMap>,
}

impl Client {
    /// Starts building a client around `transport`.
    ///
    /// `clock` drives retry delays and chain timeouts.
    pub fn builder(transport: impl Transport, clock: &Clock) -> ClientBuilder {
        ClientBuilder::new(transport, clock)
    }

    /// Executes a request and returns its successful response.
    ///
    /// `context` is only consulted by the cache middleware.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a non-2xx final response, a transport failure, an auth
    /// provider failure, or a cache failure. A cache middleware that produces no response
    /// results in [`Error::Cache`].
    pub async fn execute(&self, url: &str, options: RequestOptions, context: RequestContext) -> Result<HttpResponse> {
        let request = options.into_request(url, &self.default_headers);

        let Some(middleware) = &self.cache else {
            return self.pipeline.send(&request).await;
        };

        let mut cache_context = CacheContext::new(request.clone(), context, self.store.clone());
        middleware
            .handle(&mut cache_context, Next::new(Arc::clone(&self.pipeline), request))
            .await?;

        cache_context.into_response().ok_or_else(|| Error::cache("no response produced"))
    }

    /// Executes a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`execute`][Self::execute].
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.execute(url, RequestOptions::new(), RequestContext::new()).await
    }

    /// Executes a `POST` request with `body`.
    ///
    /// # Errors
    ///
    /// See [`execute`][Self::execute].
    pub async fn post(&self, url: &str, body: impl Into<Bytes>) -> Result<HttpResponse> {
        self.execute(url, RequestOptions::new().method(Method::POST).body(body), RequestContext::new())
            .await
    }

    /// Executes a `PUT` request with `body`.
    ///
    /// # Errors
    ///
    /// See [`execute`][Self::execute].
    pub async fn put(&self, url: &str, body: impl Into<Bytes>) -> Result<HttpResponse> {
        self.execute(url, RequestOptions::new().method(Method::PUT).body(body), RequestContext::new())
            .await
    }

    /// Executes a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`execute`][Self::execute].
    pub async fn delete(&self, url: &str) -> Result<HttpResponse> {
        self.execute(url, RequestOptions::new().method(Method::DELETE), RequestContext::new())
            .await
    }

    /// Executes a request with JSON `Content-Type` and `Accept` headers and parses the response.
    ///
    /// # Errors
    ///
    /// See [`execute`][Self::execute]. Additionally returns [`Error::Json`] if the response body
    /// is not valid JSON for `T`.
    pub async fn http_json<T: DeserializeOwned>(&self, url: &str, options: RequestOptions, context: RequestContext) -> Result<T> {
        let options = options
            .header(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .header(header::ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

        self.execute(url, options, context).await?.json()
    }

    /// Executes a JSON `GET` request.
    ///
    /// # Errors
    ///
    /// See [`http_json`][Self::http_json].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.http_json(url, RequestOptions::new(), RequestContext::new()).await
    }

    /// Serializes `body` and executes a JSON `POST` request.
    ///
    /// # Errors
    ///
    /// See [`http_json`][Self::http_json]. Additionally returns [`Error::Json`] if `body` cannot
    /// be serialized.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let options = RequestOptions::new().method(Method::POST).body(serde_json::to_vec(body)?);
        self.http_json(url, options, RequestContext::new()).await
    }

    /// Serializes `body` and executes a JSON `PUT` request.
    ///
    /// # Errors
    ///
    /// See [`post_json`][Self::post_json].
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let options = RequestOptions::new().method(Method::PUT).body(serde_json::to_vec(body)?);
        self.http_json(url, options, RequestContext::new()).await
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("pipeline", &self.pipeline)
            .field("cache", &self.cache.is_some())
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A pipeline over a transport that counts its calls and answers every request with `status`
/// and a small JSON body.
#[cfg(test)]
pub(crate) fn test_pipeline(calls: Arc<std::sync::atomic::AtomicU32>, status: http::StatusCode) -> Arc<Pipeline> {
    use layered::{DynamicServiceExt, Execute};

    let transport = Execute::new(move |request: crate::HttpRequest| {
        calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let url = request.url().to_owned();
        async move { Ok::<_, Error>(HttpResponse::new(status).with_url(url).with_body(r#"{"ok":true}"#)) }
    })
    .into_dynamic();

    Arc::new(Pipeline::new(transport, None, 1))
}
