// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Default number of retries after the original attempt.
pub(super) const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default request timeout; zero disables the check.
pub(super) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 0;

/// Added to every computed delay.
///
/// Both the reset instant and the `Date` header are truncated to whole seconds, so the raw
/// difference can be up to a second short of the real reset.
pub(super) const DELAY_PADDING: Duration = Duration::from_secs(1);
