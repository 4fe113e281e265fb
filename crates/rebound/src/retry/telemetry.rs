// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{BackoffArgs, ResumeArgs};

/// Reports backoff and resume events to the enabled telemetry sinks.
#[derive(Debug, Clone, Default)]
pub(super) struct RetryTelemetry {
    #[cfg(any(feature = "metrics", test))]
    pub(super) retry_counter: Option<opentelemetry::metrics::Counter<u64>>,
    pub(super) logs_enabled: bool,
}

impl RetryTelemetry {
    #[cfg_attr(
        not(any(feature = "logs", feature = "metrics", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs nor metrics are used")
    )]
    pub(super) fn backoff(&self, args: BackoffArgs<'_>) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "rebound.retry.backoff",
                tracing::Level::WARN,
                http.url = args.request().url(),
                http.request_id = args.request_id().unwrap_or_default(),
                http.retry.count = args.retry_count(),
                http.retry.delay = args.delay().as_secs_f32(),
            );
        }

        #[cfg(any(feature = "metrics", test))]
        if let Some(counter) = &self.retry_counter {
            use crate::metrics::{RETRY_COUNT, STATUS_CODE};

            counter.add(
                1,
                &[
                    opentelemetry::KeyValue::new(RETRY_COUNT, i64::from(args.retry_count().saturating_add(1))),
                    opentelemetry::KeyValue::new(STATUS_CODE, i64::from(args.response().status().as_u16())),
                ],
            );
        }
    }

    #[cfg_attr(
        not(any(feature = "logs", test)),
        expect(unused_variables, clippy::unused_self, reason = "unused when logs feature not used")
    )]
    pub(super) fn resume(&self, args: ResumeArgs<'_>) {
        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            tracing::event!(
                name: "rebound.retry.resume",
                tracing::Level::INFO,
                http.url = args.request().url(),
                http.request_id = args.request_id().unwrap_or_default(),
                http.retry.count = args.retry_count(),
                http.retry_for = args.request().retry_for().unwrap_or_default(),
            );
        }
    }
}
