// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{BackoffArgs, ResumeArgs};

crate::utils::define_fn_wrapper!(OnBackoff(Fn(args: BackoffArgs<'_>)));
crate::utils::define_fn_wrapper!(OnResume(Fn(args: ResumeArgs<'_>)));
