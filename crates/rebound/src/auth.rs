// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Credential capability consumed by the [`Client`][crate::Client].
//!
//! The client never acquires tokens itself. It asks an [`AuthProvider`] for a bearer token
//! before every exchange and, when the server answers `401`, asks the provider whether the
//! token is still active. An inactive token is cleared and the call re-executed once with a
//! freshly acquired token.

use std::fmt::{self, Debug, Formatter};

use crate::Result;

/// Supplies and manages bearer tokens.
///
/// Implementations are expected to cache the token between calls; the client calls
/// [`access_token`][AuthProvider::access_token] before every exchange. Failures should be
/// reported as [`Error::Auth`][crate::Error::Auth].
///
/// # Examples
///
/// ```
/// use rebound::Result;
/// use rebound::auth::{AccessToken, AuthProvider, Introspection};
///
/// struct StaticToken(String);
///
/// impl AuthProvider for StaticToken {
///     async fn access_token(&self) -> Result<AccessToken> {
///         Ok(AccessToken::new(self.0.clone()))
///     }
///
///     async fn introspect_access_token(&self) -> Result<Introspection> {
///         Ok(Introspection::active())
///     }
///
///     async fn clear_cached_access_token(&self) {}
/// }
/// ```
#[dynosaur::dynosaur(pub(crate) DynAuthProvider = dyn(box) AuthProvider, bridge(none))]
pub trait AuthProvider: Send + Sync {
    /// Returns the token to send in the `Authorization` header.
    fn access_token(&self) -> impl Future<Output = Result<AccessToken>> + Send;

    /// Asks the authorization server whether the current token is still active.
    fn introspect_access_token(&self) -> impl Future<Output = Result<Introspection>> + Send;

    /// Forgets the cached token so that the next [`access_token`][AuthProvider::access_token]
    /// call acquires a new one.
    fn clear_cached_access_token(&self) -> impl Future<Output = ()> + Send;
}

/// A bearer token.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessToken {
    access_token: String,
}

impl AccessToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Returns the raw token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken").field("access_token", &"***").finish()
    }
}

/// The outcome of a token introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Introspection {
    active: bool,
}

impl Introspection {
    /// The token is still valid.
    #[must_use]
    pub fn active() -> Self {
        Self { active: true }
    }

    /// The token expired or was revoked.
    #[must_use]
    pub fn inactive() -> Self {
        Self { active: false }
    }

    /// Returns `true` if the token is still valid.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl From<bool> for Introspection {
    fn from(active: bool) -> Self {
        Self { active }
    }
}
