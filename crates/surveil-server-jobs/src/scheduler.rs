// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-job cron scheduler with atomic schedule replacement.
//!
//! One dispatcher task owns the timer. The active [`ScheduleHandle`] lives in a
//! `watch` channel; [`CronScheduler::update`] publishes a replacement with
//! `send_replace`, so the dispatcher always sees exactly one registration and
//! re-arms against it on the next loop iteration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use surveil_server_db::SettingsStore;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::context::{JobContext, TriggerSource};
use crate::error::{JobError, Result};
use crate::health::{determine_health_state, HealthTracker, JobHealthStatus, LastRunInfo};
use crate::job::{Job, JobOutput};
use crate::schedule::{next_after, next_fire_time, parse_expression, validate_expression};

/// The active registration. Replaced as a whole, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleHandle {
	pub expression: String,
	/// Starts at 1 and increases with every successful start or update.
	pub generation: u64,
}

pub struct CronScheduler {
	job: Arc<dyn Job>,
	timezone: Tz,
	settings: Arc<dyn SettingsStore>,
	handle_tx: watch::Sender<Arc<ScheduleHandle>>,
	update_lock: Mutex<()>,
	shutdown_tx: broadcast::Sender<()>,
	dispatcher: Mutex<Option<JoinHandle<()>>>,
	health: Arc<HealthTracker>,
}

impl CronScheduler {
	pub fn new(job: Arc<dyn Job>, timezone: Tz, settings: Arc<dyn SettingsStore>) -> Self {
		let (handle_tx, _) = watch::channel(Arc::new(ScheduleHandle {
			expression: String::new(),
			generation: 0,
		}));
		let (shutdown_tx, _) = broadcast::channel(1);
		Self {
			job,
			timezone,
			settings,
			handle_tx,
			update_lock: Mutex::new(()),
			shutdown_tx,
			dispatcher: Mutex::new(None),
			health: Arc::new(HealthTracker::default()),
		}
	}

	/// Validate `expression` and spawn the dispatcher.
	#[instrument(skip(self), fields(job_id = self.job.id()))]
	pub async fn start(&self, expression: &str) -> Result<()> {
		validate_expression(expression)?;

		let _guard = self.update_lock.lock().await;
		let mut dispatcher = self.dispatcher.lock().await;
		if dispatcher.is_some() {
			return Err(JobError::AlreadyStarted);
		}

		let handle = self.publish(expression);
		let handle_rx = self.handle_tx.subscribe();
		let shutdown_rx = self.shutdown_tx.subscribe();

		*dispatcher = Some(tokio::spawn(dispatch(
			Arc::clone(&self.job),
			self.timezone,
			handle_rx,
			shutdown_rx,
			Arc::clone(&self.health),
		)));

		info!(
			expression = %handle.expression,
			generation = handle.generation,
			"Cron scheduler started"
		);
		Ok(())
	}

	/// Replace the active schedule.
	///
	/// An invalid expression is rejected before anything changes, so the
	/// current registration keeps firing. Updates are serialized.
	#[instrument(skip(self), fields(job_id = self.job.id()))]
	pub async fn update(&self, expression: &str) -> Result<Arc<ScheduleHandle>> {
		let _guard = self.update_lock.lock().await;

		if let Err(e) = validate_expression(expression) {
			warn!(error = %e, "rejected schedule update; keeping current schedule");
			return Err(e);
		}

		let handle = self.publish(expression);
		info!(
			expression = %handle.expression,
			generation = handle.generation,
			"schedule replaced"
		);
		Ok(handle)
	}

	fn publish(&self, expression: &str) -> Arc<ScheduleHandle> {
		let generation = self.handle_tx.borrow().generation + 1;
		let handle = Arc::new(ScheduleHandle {
			expression: expression.trim().to_string(),
			generation,
		});
		self.handle_tx.send_replace(Arc::clone(&handle));
		handle
	}

	pub fn current_handle(&self) -> Arc<ScheduleHandle> {
		Arc::clone(&self.handle_tx.borrow())
	}

	pub fn current_expression(&self) -> String {
		self.handle_tx.borrow().expression.clone()
	}

	pub fn timezone(&self) -> Tz {
		self.timezone
	}

	pub async fn is_running(&self) -> bool {
		self
			.dispatcher
			.lock()
			.await
			.as_ref()
			.is_some_and(|h| !h.is_finished())
	}

	/// Next firing of the active schedule, if one has been started.
	pub fn next_run_time(&self) -> Option<DateTime<Utc>> {
		let expression = self.current_expression();
		if expression.is_empty() {
			return None;
		}
		next_fire_time(&expression, self.timezone, Utc::now()).ok()
	}

	/// Completion time of the last scan, from the settings store.
	pub async fn last_run_time(&self) -> Result<Option<DateTime<Utc>>> {
		Ok(self.settings.get_last_scan().await?)
	}

	/// Run the job now, outside the timer.
	#[instrument(skip(self), fields(job_id = self.job.id()))]
	pub async fn trigger(&self, triggered_by: TriggerSource) -> Result<JobOutput> {
		self
			.trigger_as(Uuid::new_v4().to_string(), triggered_by)
			.await
	}

	/// [`CronScheduler::trigger`] under a caller-chosen run id.
	pub async fn trigger_as(&self, run_id: String, triggered_by: TriggerSource) -> Result<JobOutput> {
		let ctx = JobContext {
			run_id,
			triggered_by,
			generation: None,
		};
		execute(self.job.as_ref(), ctx, &self.health).await
	}

	pub fn health(&self) -> JobHealthStatus {
		let (last_run, consecutive_failures) = self.health.snapshot();
		JobHealthStatus {
			job_id: self.job.id().to_string(),
			name: self.job.name().to_string(),
			status: determine_health_state(&last_run, consecutive_failures),
			last_run,
			consecutive_failures,
		}
	}

	/// Stop the dispatcher. Runs already in flight finish first.
	#[instrument(skip(self))]
	pub async fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());

		if let Some(handle) = self.dispatcher.lock().await.take() {
			let _ = handle.await;
		}

		info!("Cron scheduler shut down");
	}
}

async fn dispatch(
	job: Arc<dyn Job>,
	timezone: Tz,
	mut handle_rx: watch::Receiver<Arc<ScheduleHandle>>,
	mut shutdown_rx: broadcast::Receiver<()>,
	health: Arc<HealthTracker>,
) {
	let mut runs = JoinSet::new();
	let mut last_fire: Option<DateTime<Utc>> = None;

	loop {
		let handle = Arc::clone(&handle_rx.borrow_and_update());

		let now = Utc::now();
		let after = match last_fire {
			Some(fired) if fired > now => fired,
			_ => now,
		};
		let next = match parse_expression(&handle.expression) {
			Ok(schedule) => next_after(&schedule, timezone, after),
			Err(e) => {
				warn!(error = %e, "active schedule cannot be evaluated");
				None
			}
		};
		if next.is_none() {
			warn!(expression = %handle.expression, "schedule has no future firing; waiting for an update");
		}
		let delay = next.map(|at| (at - now).to_std().unwrap_or(Duration::ZERO));

		let sleep = async {
			match delay {
				Some(delay) => tokio::time::sleep(delay).await,
				None => std::future::pending::<()>().await,
			}
		};

		tokio::select! {
			_ = sleep => {
				last_fire = next;
				let ctx = JobContext {
					run_id: Uuid::new_v4().to_string(),
					triggered_by: TriggerSource::Schedule,
					generation: Some(handle.generation),
				};
				let job = Arc::clone(&job);
				let health = Arc::clone(&health);
				runs.spawn(async move {
					let _ = execute(job.as_ref(), ctx, &health).await;
				});
			}
			changed = handle_rx.changed() => {
				if changed.is_err() {
					break;
				}
			}
			_ = shutdown_rx.recv() => {
				info!(job_id = job.id(), "Shutting down cron dispatcher");
				break;
			}
			Some(_) = runs.join_next(), if !runs.is_empty() => {}
		}
	}

	while runs.join_next().await.is_some() {}
}

async fn execute(job: &dyn Job, ctx: JobContext, health: &HealthTracker) -> Result<JobOutput> {
	let started_at = Utc::now();
	let start = Instant::now();
	info!(
		job_id = job.id(),
		run_id = %ctx.run_id,
		triggered_by = %ctx.triggered_by,
		generation = ?ctx.generation,
		"Job started"
	);

	let result = job.run(&ctx).await;
	let duration_ms = start.elapsed().as_millis() as i64;

	match &result {
		Ok(output) => info!(
			job_id = job.id(),
			run_id = %ctx.run_id,
			duration_ms,
			message = %output.message,
			"Job completed"
		),
		Err(e) => warn!(
			job_id = job.id(),
			run_id = %ctx.run_id,
			duration_ms,
			error = %e,
			"Job failed"
		),
	}

	health.record(LastRunInfo {
		run_id: ctx.run_id,
		triggered_by: ctx.triggered_by,
		started_at,
		duration_ms,
		error: result.as_ref().err().map(|e| e.to_string()),
	});

	result
}
