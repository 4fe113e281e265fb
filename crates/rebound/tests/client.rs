// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! End-to-end tests of the [`Client`] pipeline against scripted transports.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use http::{Method, StatusCode, header};
use layered::Execute;
use rebound::auth::{AccessToken, AuthProvider, Introspection};
use rebound::headers::{RATE_LIMIT_RESET, REQUEST_ID, RETRY_COUNT};
use rebound::{Client, Error, HttpRequest, HttpResponse, RequestContext, RequestOptions};
use serde_json::{Value, json};
use tick::fmt::Rfc2822;
use tick::{Clock, ClockControl};

const START: u64 = 1_700_000_000;

fn clock() -> Clock {
    ClockControl::new_at(SystemTime::UNIX_EPOCH + Duration::from_secs(START))
        .auto_advance_timers(true)
        .to_clock()
}

fn throttled(clock: &Clock, id: &str) -> HttpResponse {
    let now = clock.system_time();
    let secs = now.duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs();

    HttpResponse::new(StatusCode::TOO_MANY_REQUESTS)
        .with_header(REQUEST_ID, id)
        .with_header(RATE_LIMIT_RESET, &(secs + 3).to_string())
        .with_header(header::DATE, &Rfc2822::try_from(now).unwrap().to_string())
        .with_body(r#"{"errorCode": "E0000047", "errorSummary": "API call exceeded rate limit due to too many requests."}"#)
}

/// Issues `token-N` where `N` is the number of times the cache was cleared.
#[derive(Debug, Default)]
struct RotatingAuth {
    cleared: AtomicU32,
    introspections: AtomicU32,
    active: bool,
}

impl AuthProvider for RotatingAuth {
    async fn access_token(&self) -> rebound::Result<AccessToken> {
        Ok(AccessToken::new(format!("token-{}", self.cleared.load(Ordering::SeqCst))))
    }

    async fn introspect_access_token(&self) -> rebound::Result<Introspection> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        Ok(Introspection::from(self.active))
    }

    async fn clear_cached_access_token(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn rate_limited_call_recovers() {
    let clock = clock();
    let calls = Arc::new(Mutex::new(Vec::<HttpRequest>::new()));
    let calls_clone = Arc::clone(&calls);
    let transport_clock = clock.clone();

    let transport = Execute::new(move |request: HttpRequest| {
        let attempt = {
            let mut calls = calls_clone.lock().unwrap();
            calls.push(request);
            calls.len()
        };
        let response = if attempt == 1 {
            throttled(&transport_clock, "req-0")
        } else {
            HttpResponse::new(StatusCode::OK).with_body(r#"{"id": "00u1"}"#)
        };
        async move { Ok::<_, Error>(response) }
    });

    let client = Client::builder(transport, &clock).build();
    let started = clock.system_time();

    let user: Value = client.get_json("https://example.com/api/v1/users/me").await.unwrap();

    assert_eq!(user, json!({"id": "00u1"}));
    assert!(clock.system_time().duration_since(started).unwrap() >= Duration::from_secs(4));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].headers()[RETRY_COUNT], "1");
    assert_eq!(calls[1].headers()[header::ACCEPT], "application/json");
}

#[tokio::test]
async fn exhausted_retries_surface_api_error() {
    let clock = clock();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);
    let transport_clock = clock.clone();

    let transport = Execute::new(move |_request: HttpRequest| {
        let index = calls_clone.fetch_add(1, Ordering::SeqCst);
        let response = throttled(&transport_clock, &format!("req-{index}"));
        async move { Ok::<_, Error>(response) }
    });

    let client = Client::builder(transport, &clock).build();

    let error = client.get("https://example.com/api/v1/users").await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let Error::Api(api) = error else {
        panic!("expected an API error");
    };
    assert_eq!(api.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(api.error_code(), Some("E0000047"));
    assert_eq!(api.url(), "https://example.com/api/v1/users");
    assert_eq!(api.headers()[REQUEST_ID], "req-2");
}

#[tokio::test]
async fn revoked_token_is_refreshed_once() {
    let clock = clock();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let tokens_clone = Arc::clone(&tokens);

    // Accepts only the refreshed token.
    let transport = Execute::new(move |request: HttpRequest| {
        let token = request.headers()[header::AUTHORIZATION].to_str().unwrap().to_owned();
        let status = if token == "Bearer token-1" {
            StatusCode::OK
        } else {
            StatusCode::UNAUTHORIZED
        };
        tokens_clone.lock().unwrap().push(token);
        async move { Ok::<_, Error>(HttpResponse::new(status)) }
    });

    let auth = Arc::new(RotatingAuth::default());
    let client = Client::builder(transport, &clock).auth_provider(SharedAuth(Arc::clone(&auth))).build();

    let response = client.get("https://example.com/api/v1/users").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*tokens.lock().unwrap(), ["Bearer token-0", "Bearer token-1"]);
    assert_eq!(auth.introspections.load(Ordering::SeqCst), 1);
    assert_eq!(auth.cleared.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn second_401_surfaces() {
    let clock = clock();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let transport = Execute::new(move |_request: HttpRequest| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Error>(HttpResponse::new(StatusCode::UNAUTHORIZED).with_body("unauthorized")) }
    });

    let auth = Arc::new(RotatingAuth::default());
    let client = Client::builder(transport, &clock).auth_provider(SharedAuth(Arc::clone(&auth))).build();

    let error = client.get("https://example.com/api/v1/users").await.unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(matches!(error, Error::Http(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(auth.cleared.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn active_token_401_is_not_refreshed() {
    let clock = clock();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let transport = Execute::new(move |_request: HttpRequest| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Error>(HttpResponse::new(StatusCode::UNAUTHORIZED)) }
    });

    let auth = Arc::new(RotatingAuth {
        active: true,
        ..RotatingAuth::default()
    });
    let client = Client::builder(transport, &clock).auth_provider(SharedAuth(Arc::clone(&auth))).build();

    let error = client.get("https://example.com/api/v1/users").await.unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(auth.introspections.load(Ordering::SeqCst), 1);
    assert_eq!(auth.cleared.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cached_reads_skip_the_transport() {
    let clock = clock();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let transport = Execute::new(move |request: HttpRequest| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        let body = if *request.method() == Method::GET { r#"{"name": "before"}"# } else { "" };
        async move { Ok::<_, Error>(HttpResponse::new(StatusCode::OK).with_body(body)) }
    });

    let client = Client::builder(transport, &clock).default_cache_middleware().build();
    let url = "https://example.com/api/v1/groups/00g1";

    let first: Value = client.get_json(url).await.unwrap();
    let second: Value = client.get_json(url).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A mutation invalidates the cached entry.
    let _response = client
        .execute(url, RequestOptions::new().method(Method::DELETE), RequestContext::new())
        .await
        .unwrap();
    let _third: Value = client.get_json(url).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn collections_are_not_cached() {
    let clock = clock();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let transport = Execute::new(move |_request: HttpRequest| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, Error>(HttpResponse::new(StatusCode::OK).with_body("[]")) }
    });

    let client = Client::builder(transport, &clock).default_cache_middleware().build();

    for _ in 0..2 {
        let _response = client
            .execute("https://example.com/api/v1/groups", RequestOptions::new(), RequestContext::new().collection())
            .await
            .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Lets the test keep a handle on the provider it hands to the client.
struct SharedAuth(Arc<RotatingAuth>);

impl AuthProvider for SharedAuth {
    async fn access_token(&self) -> rebound::Result<AccessToken> {
        self.0.access_token().await
    }

    async fn introspect_access_token(&self) -> rebound::Result<Introspection> {
        self.0.introspect_access_token().await
    }

    async fn clear_cached_access_token(&self) {
        self.0.clear_cached_access_token().await;
    }
}
