// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use surveil_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("invalid schedule expression '{expression}': {message}")]
	InvalidExpression { expression: String, message: String },

	#[error("scheduler already started")]
	AlreadyStarted,

	#[error("Job failed: {message}")]
	Failed { message: String },

	#[error("Repository error: {0}")]
	Repository(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, JobError>;
