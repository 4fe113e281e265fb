// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Response caching around the request pipeline.
//!
//! When a [`CacheMiddleware`] is configured on the [`Client`][crate::Client], every call is
//! routed through it. The middleware receives a [`CacheContext`] describing the call and a
//! [`Next`] continuation that performs the real exchange. It may answer from the
//! [`CacheStore`] by filling the context's response slot, or run the continuation and
//! inspect or store its result.
//!
//! [`DefaultCacheMiddleware`] together with a [`MemoryStore`] caches `GET` responses of single
//! resources by URL and invalidates them when a mutating call succeeds.
//!
//! # Examples
//!
//! A middleware that only counts the exchanges that reach the network:
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use rebound::Result;
//! use rebound::cache::{CacheContext, CacheMiddleware, Next};
//!
//! #[derive(Debug, Default)]
//! struct CountingMiddleware(AtomicU64);
//!
//! impl CacheMiddleware for CountingMiddleware {
//!     async fn handle(&self, context: &mut CacheContext, next: Next) -> Result<()> {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         next.run(context).await
//!     }
//! }
//! ```

mod default_middleware;
mod store;

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use default_middleware::DefaultCacheMiddleware;
pub use store::{CacheStore, DynamicStore, MemoryStore};

use crate::client::Pipeline;
use crate::{HttpRequest, HttpResponse, RequestContext, Result};

/// Wraps the network exchange of a single call.
///
/// The middleware must either populate the context's response slot or call
/// [`Next::run`], which populates it on success. Errors returned by `run` should be
/// propagated unchanged.
#[dynosaur::dynosaur(pub(crate) DynCacheMiddleware = dyn(box) CacheMiddleware, bridge(none))]
pub trait CacheMiddleware: Send + Sync {
    /// Handles one call.
    fn handle(&self, context: &mut CacheContext, next: Next) -> impl Future<Output = Result<()>> + Send;
}

/// Everything a cache middleware knows about one call.
///
/// Owned by a single call and never shared between calls.
#[derive(Debug)]
pub struct CacheContext {
    request: HttpRequest,
    is_collection: bool,
    resources: Vec<String>,
    store: DynamicStore,
    response: Option<HttpResponse>,
}

impl CacheContext {
    pub(crate) fn new(request: HttpRequest, context: RequestContext, store: DynamicStore) -> Self {
        let (is_collection, resources) = context.into_parts();

        Self {
            request,
            is_collection,
            resources,
            store,
            response: None,
        }
    }

    /// Returns the request URL, which is also the cache key of the call.
    #[must_use]
    pub fn url(&self) -> &str {
        self.request.url()
    }

    /// Returns the request as built from the caller's options, before auth injection.
    #[must_use]
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// Returns `true` if the call returns a collection.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.is_collection
    }

    /// Returns additional cache keys affected by the call.
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Returns the store shared by all calls of the client.
    #[must_use]
    pub fn store(&self) -> &DynamicStore {
        &self.store
    }

    /// Returns the response, if one has been produced.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Sets the response; the network exchange is skipped if this happens before [`Next::run`].
    pub fn set_response(&mut self, response: HttpResponse) {
        self.response = Some(response);
    }

    pub(crate) fn into_response(self) -> Option<HttpResponse> {
        self.response
    }
}

/// Continuation that performs the network exchange of a call.
///
/// Consumed by [`run`][Next::run], so the exchange happens at most once per call.
pub struct Next {
    pipeline: Arc<Pipeline>,
    request: HttpRequest,
}

impl Next {
    pub(crate) fn new(pipeline: Arc<Pipeline>, request: HttpRequest) -> Self {
        Self { pipeline, request }
    }

    /// Performs the exchange and stores the response in `context`.
    ///
    /// Does nothing if the context already holds a response.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a non-2xx response, a transport failure, or an auth
    /// failure; the context is left without a response.
    pub async fn run(self, context: &mut CacheContext) -> Result<()> {
        if context.response.is_some() {
            return Ok(());
        }

        let response = self.pipeline.send(&self.request).await?;
        context.response = Some(response);
        Ok(())
    }
}

impl Debug for Next {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("request", &self.request).finish_non_exhaustive()
    }
}
