// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Recurring scheduler for the surveil scan job.
//!
//! Exactly one job runs on one cron cadence. The cadence can be replaced at
//! runtime without ever leaving zero or two registrations active.

pub mod context;
pub mod error;
pub mod health;
pub mod job;
pub mod schedule;
pub mod scheduler;

pub use context::{JobContext, TriggerSource};
pub use error::{JobError, Result};
pub use health::{HealthState, JobHealthStatus, LastRunInfo};
pub use job::{Job, JobOutput};
pub use schedule::{next_fire_time, parse_expression, validate_expression};
pub use scheduler::{CronScheduler, ScheduleHandle};
