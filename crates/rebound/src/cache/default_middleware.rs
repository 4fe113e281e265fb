// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use http::{Method, StatusCode, header};

use super::{CacheContext, CacheMiddleware, CacheStore, Next};
use crate::headers::APPLICATION_JSON;
use crate::{HttpResponse, Result};

/// Caches single-resource `GET` responses by URL.
///
/// | Call | Behavior |
/// |------|----------|
/// | `GET`, not a collection | Answers from the store when the URL is cached. Otherwise runs the exchange and stores a `200` body. |
/// | `GET`, collection | Runs the exchange; nothing is cached. |
/// | Any other method | Runs the exchange and, on success, deletes the URL and every [`resources`][CacheContext::resources] key. |
///
/// Cached answers are synthesized as `200` responses with a JSON content type.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct DefaultCacheMiddleware;

impl DefaultCacheMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CacheMiddleware for DefaultCacheMiddleware {
    async fn handle(&self, context: &mut CacheContext, next: Next) -> Result<()> {
        let store = context.store().clone();
        let url = context.url().to_owned();

        if context.request().method() != Method::GET {
            next.run(context).await?;

            store.delete(&url).await?;
            for resource in context.resources() {
                store.delete(resource).await?;
            }

            return Ok(());
        }

        if context.is_collection() {
            return next.run(context).await;
        }

        if let Some(body) = store.get(&url).await? {
            context.set_response(
                HttpResponse::new(StatusCode::OK)
                    .with_url(url)
                    .with_header(header::CONTENT_TYPE, APPLICATION_JSON)
                    .with_body(body),
            );
            return Ok(());
        }

        next.run(context).await?;

        if let Some(response) = context.response().filter(|response| response.status() == StatusCode::OK) {
            store.set(&url, response.body().clone()).await?;
        }

        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use bytes::Bytes;

    use super::*;
    use crate::cache::{DynamicStore, MemoryStore};
    use crate::client::test_pipeline;
    use crate::{HttpRequest, RequestContext};

    const URL: &str = "https://example.com/api/v1/users/00u1";

    async fn handle(request: HttpRequest, context: RequestContext, store: &MemoryStore, status: StatusCode) -> (CacheContext, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let pipeline = test_pipeline(Arc::clone(&calls), status);
        let mut cache_context = CacheContext::new(request.clone(), context, DynamicStore::new(store.clone()));

        DefaultCacheMiddleware::new()
            .handle(&mut cache_context, Next::new(pipeline, request))
            .await
            .unwrap();

        (cache_context, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn get_miss_stores_body() {
        let store = MemoryStore::new();

        let (context, calls) = handle(HttpRequest::get(URL), RequestContext::new(), &store, StatusCode::OK).await;

        assert_eq!(calls, 1);
        assert_eq!(context.response().unwrap().status(), StatusCode::OK);
        assert_eq!(store.get(URL).await.unwrap(), Some(Bytes::from_static(b"{\"ok\":true}")));
    }

    #[tokio::test]
    async fn get_hit_short_circuits() {
        let store = MemoryStore::new();
        store.set(URL, Bytes::from_static(b"{\"cached\":true}")).await.unwrap();

        let (context, calls) = handle(HttpRequest::get(URL), RequestContext::new(), &store, StatusCode::OK).await;

        let response = context.response().unwrap();
        assert_eq!(calls, 0);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.url(), URL);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        assert_eq!(response.text(), "{\"cached\":true}");
    }

    #[tokio::test]
    async fn non_200_is_not_stored() {
        let store = MemoryStore::new();

        let (_context, calls) = handle(HttpRequest::get(URL), RequestContext::new(), &store, StatusCode::NO_CONTENT).await;

        assert_eq!(calls, 1);
        assert_eq!(store.get(URL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn collection_is_not_cached() {
        let store = MemoryStore::new();
        store.set(URL, Bytes::from_static(b"stale")).await.unwrap();

        let (context, calls) = handle(HttpRequest::get(URL), RequestContext::new().collection(), &store, StatusCode::OK).await;

        assert_eq!(calls, 1);
        assert_eq!(context.response().unwrap().text(), "{\"ok\":true}");
        assert_eq!(store.get(URL).await.unwrap(), Some(Bytes::from_static(b"stale")));
    }

    #[tokio::test]
    async fn mutation_invalidates_url_and_resources() {
        let store = MemoryStore::new();
        store.set(URL, Bytes::from_static(b"user")).await.unwrap();
        store.set("https://example.com/api/v1/groups/00g1", Bytes::from_static(b"group")).await.unwrap();
        store.set("https://example.com/api/v1/apps/0oa1", Bytes::from_static(b"app")).await.unwrap();

        let request = HttpRequest::new(Method::POST, URL).with_body("{}");
        let context = RequestContext::new().resource("https://example.com/api/v1/groups/00g1");
        let (_context, calls) = handle(request, context, &store, StatusCode::OK).await;

        assert_eq!(calls, 1);
        assert_eq!(store.get(URL).await.unwrap(), None);
        assert_eq!(store.get("https://example.com/api/v1/groups/00g1").await.unwrap(), None);
        assert!(store.get("https://example.com/api/v1/apps/0oa1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_mutation_keeps_cache() {
        let store = MemoryStore::new();
        store.set(URL, Bytes::from_static(b"user")).await.unwrap();

        let calls = Arc::new(AtomicU32::new(0));
        let pipeline = test_pipeline(Arc::clone(&calls), StatusCode::BAD_REQUEST);
        let request = HttpRequest::new(Method::DELETE, URL);
        let mut context = CacheContext::new(request.clone(), RequestContext::new(), DynamicStore::new(store.clone()));

        let error = DefaultCacheMiddleware::new()
            .handle(&mut context, Next::new(pipeline, request))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(StatusCode::BAD_REQUEST));
        assert!(store.get(URL).await.unwrap().is_some());
    }
}
