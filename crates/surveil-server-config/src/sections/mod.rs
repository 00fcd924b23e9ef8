// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for surveil-server.

pub mod database;
pub mod github;
pub mod logging;
pub mod notify;
pub mod scan;

pub use database::{DatabaseConfig, DatabaseConfigLayer, DEFAULT_DATABASE_URL};
pub use github::{GithubConfig, GithubConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use notify::{NotifyConfig, NotifyConfigLayer};
pub use scan::{ScanConfig, ScanConfigLayer};
