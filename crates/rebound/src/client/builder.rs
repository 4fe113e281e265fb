// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, header};
use layered::{DynamicService, DynamicServiceExt, Layer};
use tick::Clock;

use super::{Client, ClientConfig, Pipeline};
use crate::auth::{AuthProvider, DynAuthProvider};
use crate::cache::{CacheMiddleware, DefaultCacheMiddleware, DynCacheMiddleware, DynamicStore, MemoryStore};
use crate::retry::{RetryConfig, RetryLayer};
use crate::transport::Transport;
use crate::{Error, HttpRequest, HttpResponse, Result};

const DEFAULT_USER_AGENT: &str = concat!("rebound/", env!("CARGO_PKG_VERSION"));
const DEFAULT_MAX_AUTH_REFRESHES: u32 = 1;

/// Builder for [`Client`].
///
/// Every collaborator is injected here; nothing is global. Created by [`Client::builder`].
///
/// | Setting | Default |
/// |---------|---------|
/// | Retry | [`RetryLayer::new`] on the given clock: two retries, no chain timeout |
/// | Auth provider | none; no `Authorization` header is sent |
/// | Cache middleware | none; every call reaches the transport |
/// | Cache store | an unbounded [`MemoryStore`] |
/// | Default headers | `User-Agent: rebound/<version>` |
/// | Max auth refreshes | `1` per call |
pub struct ClientBuilder {
    transport: DynamicService<HttpRequest, Result<HttpResponse>>,
    retry: RetryLayer,
    auth: Option<Arc<DynAuthProvider<'static>>>,
    cache: Option<Arc<DynCacheMiddleware<'static>>>,
    store: Option<DynamicStore>,
    default_headers: HeaderMap,
    max_auth_refreshes: u32,
}

impl ClientBuilder {
    pub(super) fn new(transport: impl Transport, clock: &Clock) -> Self {
        let mut default_headers = HeaderMap::new();
        let _previous = default_headers.insert(header::USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        Self {
            transport: transport.into_dynamic(),
            retry: RetryLayer::new(clock),
            auth: None,
            cache: None,
            store: None,
            default_headers,
            max_auth_refreshes: DEFAULT_MAX_AUTH_REFRESHES,
        }
    }

    /// Replaces the retry layer, e.g. to register observers or enable telemetry.
    #[must_use]
    pub fn retry(mut self, retry: RetryLayer) -> Self {
        self.retry = retry;
        self
    }

    /// Applies a retry configuration to the current retry layer.
    #[must_use]
    pub fn retry_config(mut self, config: &RetryConfig) -> Self {
        self.retry = self.retry.config(config);
        self
    }

    /// Sets the provider of bearer tokens.
    #[must_use]
    pub fn auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth = Some(DynAuthProvider::new_arc(provider));
        self
    }

    /// Routes every call through `middleware`.
    #[must_use]
    pub fn cache_middleware(mut self, middleware: impl CacheMiddleware + 'static) -> Self {
        self.cache = Some(DynCacheMiddleware::new_arc(middleware));
        self
    }

    /// Routes every call through the [`DefaultCacheMiddleware`].
    #[must_use]
    pub fn default_cache_middleware(self) -> Self {
        self.cache_middleware(DefaultCacheMiddleware::new())
    }

    /// Sets the store handed to the cache middleware.
    #[must_use]
    pub fn cache_store(mut self, store: impl crate::cache::CacheStore + 'static) -> Self {
        self.store = Some(DynamicStore::new(store));
        self
    }

    /// Adds a header sent with every request unless the call sets the same header.
    #[must_use]
    pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        let _previous = self.default_headers.insert(name, value);
        self
    }

    /// Sets how many times a single call may clear an inactive token and start over.
    ///
    /// With `0`, every `401` is returned without introspecting the token.
    #[must_use]
    pub fn max_auth_refreshes(mut self, max_auth_refreshes: u32) -> Self {
        self.max_auth_refreshes = max_auth_refreshes;
        self
    }

    /// Applies a declarative configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the configured user agent is not a valid header value.
    pub fn config(mut self, config: &ClientConfig) -> Result<Self> {
        self = self.retry_config(&config.retry);

        if let Some(user_agent) = &config.user_agent {
            let value = HeaderValue::try_from(user_agent.as_str()).map_err(|e| Error::InvalidRequest(format!("user agent: {e}")))?;
            self = self.default_header(header::USER_AGENT, value);
        }

        if config.cache.enabled {
            self = self
                .default_cache_middleware()
                .cache_store(MemoryStore::build(config.cache.max_capacity, config.cache.time_to_live()));
        }

        Ok(self)
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> Client {
        let transport = self.retry.layer(self.transport).into_dynamic();

        Client {
            pipeline: Arc::new(Pipeline::new(transport, self.auth, self.max_auth_refreshes)),
            cache: self.cache,
            store: self.store.unwrap_or_else(|| DynamicStore::new(MemoryStore::new())),
            default_headers: Arc::new(self.default_headers),
        }
    }
}

impl Debug for ClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("retry", &self.retry)
            .field("auth", &self.auth.is_some())
            .field("cache", &self.cache.is_some())
            .field("default_headers", &self.default_headers)
            .field("max_auth_refreshes", &self.max_auth_refreshes)
            .finish_non_exhaustive()
    }
}
