// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Drives a client against a simulated server that allows two requests per window and
//! answers `429` with a reset instant after that. The retry layer waits for the reset and
//! resends; its log events are printed to the terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use http::{StatusCode, header};
use layered::Execute;
use rebound::headers::{RATE_LIMIT_RESET, REQUEST_ID};
use rebound::retry::RetryLayer;
use rebound::{Client, Error, HttpRequest, HttpResponse};
use tick::Clock;
use tick::fmt::Rfc2822;
use tracing::Level;

const REQUESTS_PER_WINDOW: u64 = 2;
const WINDOW_SECS: u64 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let clock = Clock::new_tokio();
    let server = Arc::new(Server::default());

    let transport = Execute::new({
        let server = Arc::clone(&server);
        let clock = clock.clone();
        move |request: HttpRequest| {
            let response = server.respond(&request, clock.system_time());
            async move { Ok::<_, Error>(response) }
        }
    });

    let retry = RetryLayer::new(&clock)
        .max_retries(3)
        .enable_logs()
        .on_backoff(|args| println!("throttled, waiting {}ms", args.delay().as_millis()));

    let client = Client::builder(transport, &clock).retry(retry).build();

    for user in 1..=5 {
        let url = format!("https://example.com/api/v1/users/00u{user}");
        let response = client.get(&url).await?;
        println!("{url}: {}", response.text());
    }

    Ok(())
}

#[derive(Debug, Default)]
struct Server {
    window: AtomicU64,
    used: AtomicU64,
    issued: AtomicU64,
}

impl Server {
    fn respond(&self, request: &HttpRequest, now: SystemTime) -> HttpResponse {
        let secs = now.duration_since(SystemTime::UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
        let window = secs / WINDOW_SECS;
        let id = format!("req-{}", self.issued.fetch_add(1, Ordering::Relaxed));

        if self.window.swap(window, Ordering::Relaxed) != window {
            self.used.store(0, Ordering::Relaxed);
        }

        let date = Rfc2822::try_from(now).map(|date| date.to_string()).unwrap_or_default();

        if self.used.fetch_add(1, Ordering::Relaxed) < REQUESTS_PER_WINDOW {
            return HttpResponse::new(StatusCode::OK)
                .with_url(request.url())
                .with_header(REQUEST_ID, &id)
                .with_header(header::DATE, &date)
                .with_body(format!(r#"{{"requestId": "{id}"}}"#));
        }

        let reset = (window + 1) * WINDOW_SECS;
        HttpResponse::new(StatusCode::TOO_MANY_REQUESTS)
            .with_url(request.url())
            .with_header(REQUEST_ID, &id)
            .with_header(header::DATE, &date)
            .with_header(RATE_LIMIT_RESET, &reset.to_string())
    }
}
