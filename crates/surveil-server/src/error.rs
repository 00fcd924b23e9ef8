// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the surveil service layer and server bootstrap.

use surveil_server_config::ConfigError;
use surveil_server_db::DbError;
use surveil_server_jobs::JobError;
use surveil_server_notify::DeliveryError;
use surveil_server_releases::ReleaseError;
use surveil_server_scan::ScanError;
use surveil_server_vault::VaultError;
use thiserror::Error;

/// Errors returned by [`crate::SurveilService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("validation failed: {0}")]
	Validation(String),

	#[error("not found: {0}")]
	NotFound(String),

	/// Transient fetch failure, surfaced only when adding a repository.
	#[error("no release information available for {0}")]
	ReleaseUnavailable(String),

	#[error("storage failure: {0}")]
	Persistence(DbError),

	#[error("credential failure: {0}")]
	Crypto(String),

	/// Only test notifications report delivery failures to the caller.
	#[error("notification delivery failed: {0}")]
	Delivery(String),

	#[error("schedule error: {0}")]
	Schedule(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

impl From<DbError> for ServiceError {
	fn from(e: DbError) -> Self {
		match e {
			DbError::NotFound(what) => ServiceError::NotFound(what),
			DbError::Conflict(msg) => ServiceError::Validation(msg),
			other => ServiceError::Persistence(other),
		}
	}
}

impl From<VaultError> for ServiceError {
	fn from(e: VaultError) -> Self {
		if e.is_validation() {
			ServiceError::Validation(e.to_string())
		} else {
			ServiceError::Crypto(e.to_string())
		}
	}
}

impl From<DeliveryError> for ServiceError {
	fn from(e: DeliveryError) -> Self {
		match e {
			DeliveryError::Settings(db) => db.into(),
			other => ServiceError::Delivery(other.to_string()),
		}
	}
}

impl From<JobError> for ServiceError {
	fn from(e: JobError) -> Self {
		match e {
			JobError::InvalidExpression { .. } => ServiceError::Validation(e.to_string()),
			JobError::Repository(db) => db.into(),
			other => ServiceError::Schedule(other.to_string()),
		}
	}
}

impl From<ScanError> for ServiceError {
	fn from(e: ScanError) -> Self {
		match e {
			ScanError::Store(db) => db.into(),
		}
	}
}

impl From<ReleaseError> for ServiceError {
	fn from(e: ReleaseError) -> Self {
		ServiceError::Validation(format!("GitHub token rejected: {e}"))
	}
}

/// Fatal errors while bringing the server up.
#[derive(Debug, Error)]
pub enum ServerError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("database error: {0}")]
	Database(#[from] DbError),

	#[error("release client error: {0}")]
	Releases(#[from] ReleaseError),

	#[error("webhook client error: {0}")]
	Notify(#[from] DeliveryError),

	#[error("scheduler error: {0}")]
	Scheduler(#[from] JobError),

	#[error(transparent)]
	Service(#[from] ServiceError),
}
