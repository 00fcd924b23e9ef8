// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory pools for tests in this and downstream crates.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Empty in-memory database. A single connection keeps every query on the same database.
pub async fn create_test_pool() -> SqlitePool {
	SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap()
}

/// In-memory database with the full schema applied.
pub async fn create_surveil_test_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	crate::run_migrations(&pool).await.unwrap();
	pool
}
