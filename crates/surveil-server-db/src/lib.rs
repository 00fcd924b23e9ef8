// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # surveil-server-db
//!
//! SQLite persistence for the surveil server.
//!
//! Each domain has a `*Store` trait consumed by the rest of the server and a
//! `*Repository` struct implementing it over a `SqlitePool`:
//!
//! - [`RepoStore`] / [`RepoRepository`]: tracked repositories
//! - [`SettingsStore`] / [`SettingsRepository`]: scan settings singleton
//! - [`NotificationStore`] / [`NotificationRepository`]: webhook settings singleton
//!
//! `NotFound` is returned only for ids the caller expects to exist; plain
//! lookups return `Option`.

pub mod error;
pub mod notification;
pub mod pool;
pub mod repository;
pub mod settings;
pub mod testing;

pub use error::{DbError, Result};
pub use notification::{
	NotificationRepository, NotificationSettings, NotificationStore, NotificationUpdate, PingMode,
};
pub use pool::{create_pool, run_migrations};
pub use repository::{NewRepository, RepoRepository, RepoStore, TrackedRepository};
pub use settings::{
	ScanSettings, SettingsDefaults, SettingsRepository, SettingsStore, SettingsUpdate,
};
