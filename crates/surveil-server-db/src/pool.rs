// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use crate::error::DbError;

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./surveil.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Run all schema migrations.
///
/// Every statement is `CREATE ... IF NOT EXISTS`, so this is safe to call on
/// every startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	let migrations = [
		(
			"001_create_repositories",
			include_str!("../migrations/001_create_repositories.sql"),
		),
		(
			"002_create_settings",
			include_str!("../migrations/002_create_settings.sql"),
		),
		(
			"003_create_notification_settings",
			include_str!("../migrations/003_create_notification_settings.sql"),
		),
	];

	for (name, sql) in migrations {
		for stmt in split_statements(sql) {
			sqlx::query(stmt).execute(pool).await?;
		}
		tracing::debug!(migration = name, "migration applied");
	}

	Ok(())
}

/// Split a migration file into executable statements, dropping comment-only chunks.
fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').filter(|chunk| {
		chunk
			.lines()
			.map(str::trim)
			.any(|line| !line.is_empty() && !line.starts_with("--"))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn comment_only_chunks_are_skipped() {
		let sql = "-- header\n\nCREATE TABLE a (x INTEGER);\n-- trailing\n";
		let stmts: Vec<&str> = split_statements(sql).collect();
		assert_eq!(stmts.len(), 1);
		assert!(stmts[0].contains("CREATE TABLE a"));
	}

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = crate::testing::create_test_pool().await;
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let (count,): (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('repositories', 'settings', 'notification_settings')",
		)
		.fetch_one(&pool)
		.await
		.unwrap();
		assert_eq!(count, 3);
	}
}
