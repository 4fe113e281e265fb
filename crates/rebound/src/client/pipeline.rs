// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use http::{HeaderValue, StatusCode, header};
use layered::{DynamicService, Service};

use crate::auth::{AuthProvider, DynAuthProvider};
use crate::{Error, HttpRequest, HttpResponse, Result};

/// The network half of a call: auth injection, the retrying transport, error classification
/// and the `401` refresh loop.
pub(crate) struct Pipeline {
    transport: DynamicService<HttpRequest, Result<HttpResponse>>,
    auth: Option<Arc<DynAuthProvider<'static>>>,
    max_auth_refreshes: u32,
}

impl Pipeline {
    pub(crate) fn new(
        transport: DynamicService<HttpRequest, Result<HttpResponse>>,
        auth: Option<Arc<DynAuthProvider<'static>>>,
        max_auth_refreshes: u32,
    ) -> Self {
        Self {
            transport,
            auth,
            max_auth_refreshes,
        }
    }

    /// Runs `request` to a successful response or a classified error.
    ///
    /// A `401` triggers token introspection. An inactive token is cleared and the whole
    /// exchange repeated, at most `max_auth_refreshes` times per call; in every other case the
    /// `401` error is returned.
    pub(crate) async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut refreshes = 0;

        loop {
            let error = match self.exchange(request.clone()).await {
                Err(error) if error.status() == Some(StatusCode::UNAUTHORIZED) => error,
                result => return result,
            };

            let Some(auth) = &self.auth else {
                return Err(error);
            };

            if refreshes >= self.max_auth_refreshes || auth.introspect_access_token().await?.is_active() {
                return Err(error);
            }

            auth.clear_cached_access_token().await;
            refreshes += 1;

            #[cfg(any(feature = "logs", test))]
            tracing::event!(
                name: "rebound.auth.refresh",
                tracing::Level::DEBUG,
                http.url = request.url(),
                auth.refresh.count = refreshes,
            );
        }
    }

    async fn exchange(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if let Some(auth) = &self.auth {
            let token = auth.access_token().await?;
            let mut value = HeaderValue::try_from(format!("Bearer {}", token.access_token())).map_err(Error::auth)?;
            value.set_sensitive(true);
            let _previous = request.headers_mut().insert(header::AUTHORIZATION, value);
        }

        let url = request.url().to_owned();
        let response = self.transport.execute(request).await?;

        if response.is_success() {
            Ok(response)
        } else {
            // errors report the URL that was requested, not whatever the transport recorded
            Err(Error::from_response(response.with_url(url)))
        }
    }
}

impl Debug for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transport", &self.transport)
            .field("auth", &self.auth.is_some())
            .field("max_auth_refreshes", &self.max_auth_refreshes)
            .finish()
    }
}
