// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Caches single-resource reads in memory and shows how a successful update invalidates
//! the cached entry. A custom middleware wraps the default one to report whether each call
//! reached the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use http::{Method, StatusCode};
use layered::Execute;
use rebound::cache::{CacheContext, CacheMiddleware, CacheStore, DefaultCacheMiddleware, MemoryStore, Next};
use rebound::{Client, ClientConfig, Error, HttpRequest, HttpResponse, RequestContext, RequestOptions, Result};
use serde_json::Value;
use tick::Clock;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let clock = Clock::new_tokio();
    let exchanges = Arc::new(AtomicU64::new(0));

    let transport = Execute::new({
        let exchanges = Arc::clone(&exchanges);
        move |request: HttpRequest| {
            exchanges.fetch_add(1, Ordering::Relaxed);
            let response = HttpResponse::new(StatusCode::OK)
                .with_url(request.url())
                .with_body(r#"{"id": "00g1", "profile": {"name": "Everyone"}}"#);
            async move { Ok::<_, Error>(response) }
        }
    });

    let mut config = ClientConfig::default();
    config.user_agent = Some("cached-client-example/1.0".to_string());

    let client = Client::builder(transport, &clock)
        .config(&config)?
        .cache_middleware(Reporting::default())
        .cache_store(MemoryStore::with_capacity(1_000))
        .build();

    let url = "https://example.com/api/v1/groups/00g1";

    for _ in 0..2 {
        let group: Value = client.get_json(url).await?;
        println!("group name: {}", group["profile"]["name"]);
    }

    let _response = client
        .execute(
            url,
            RequestOptions::new().method(Method::PUT).body(r#"{"profile": {"name": "All"}}"#),
            RequestContext::new().resource(url),
        )
        .await?;

    let _group: Value = client.get_json(url).await?;

    println!("network exchanges: {}", exchanges.load(Ordering::Relaxed));
    Ok(())
}

#[derive(Debug, Default)]
struct Reporting {
    inner: DefaultCacheMiddleware,
}

impl CacheMiddleware for Reporting {
    async fn handle(&self, context: &mut CacheContext, next: Next) -> Result<()> {
        let cached = context.store().get(context.url()).await?.is_some();
        println!("{} {} ({})", context.request().method(), context.url(), if cached { "cached" } else { "network" });

        self.inner.handle(context, next).await
    }
}
