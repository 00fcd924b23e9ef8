// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background jobs driven by the cron scheduler.

mod repository_scan;

pub use repository_scan::RepositoryScanJob;
