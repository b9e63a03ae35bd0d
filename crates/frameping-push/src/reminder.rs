//! Daily reminder batch
//!
//! Sends the reminder notification to every user with an enabled credential,
//! one user at a time. At most one batch runs per process: a trigger that
//! arrives while a batch is in flight is skipped. A `RateLimited` outcome
//! ends the run early since every further request would be throttled too.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::prelude::*;
use crate::send::{DispatchOutcome, send_notification};
use frameping_core::scheduler::Task;

pub const REMINDER_TITLE: &str = "Your daily frame is ready";
pub const REMINDER_BODY: &str = "Come back and see what is new today.";

/// Key of the recurring reminder task in the scheduler
pub const REMINDER_TASK_KEY: &str = "push.reminder.daily";

/// Counters of a completed batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
	pub sent: usize,
	pub failed: usize,
	/// Users whose credential turned out to be unusable at dispatch time
	pub skipped: usize,
	/// The run stopped early on a rate-limited dispatch
	pub rate_limited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRun {
	/// Another batch was already running
	Skipped,
	Completed(BatchReport),
	/// The batch could not enumerate its recipients
	Failed(Box<str>),
}

/// Process-wide reminder batch state, registered as an app extension
#[derive(Debug, Default)]
pub struct ReminderBatch {
	running: AtomicBool,
}

/// Clears the running flag on every exit path
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

impl ReminderBatch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::Acquire)
	}

	fn try_start(&self) -> Option<RunningGuard<'_>> {
		self.running
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| RunningGuard(&self.running))
	}

	/// Runs one batch unless one is already in flight
	pub async fn trigger(&self, app: &App) -> BatchRun {
		let Some(_guard) = self.try_start() else {
			info!("Reminder batch already running, skipping");
			return BatchRun::Skipped;
		};

		let recipients = match app.credentials.list_enabled().await {
			Ok(recipients) => recipients,
			Err(e) => {
				error!(error = %e, "Failed to list notification credentials");
				return BatchRun::Failed(e.to_string().into());
			}
		};
		info!(recipients = recipients.len(), "Starting reminder batch");

		let mut report = BatchReport::default();
		for (fid, credential) in &recipients {
			match send_notification(app, *fid, REMINDER_TITLE, REMINDER_BODY, Some(credential))
				.await
			{
				DispatchOutcome::Success => report.sent += 1,
				DispatchOutcome::NoCredential => {
					debug!(fid = %fid, "No usable credential, skipping");
					report.skipped += 1;
				}
				DispatchOutcome::TransportError(e) => {
					warn!(fid = %fid, error = %e, "Reminder delivery failed");
					report.failed += 1;
				}
				DispatchOutcome::RateLimited => {
					warn!(fid = %fid, "Rate limited, stopping reminder batch");
					report.rate_limited = true;
					break;
				}
			}
		}

		info!(
			sent = report.sent,
			failed = report.failed,
			skipped = report.skipped,
			rate_limited = report.rate_limited,
			"Reminder batch finished"
		);
		BatchRun::Completed(report)
	}
}

/// Scheduler task firing the reminder batch
#[derive(Debug, Default)]
pub struct ReminderTask;

#[async_trait]
impl Task<App> for ReminderTask {
	fn kind() -> &'static str {
		"push.reminder"
	}

	fn kind_of(&self) -> &'static str {
		Self::kind()
	}

	async fn run(&self, app: &App) -> ClResult<()> {
		match app.ext::<ReminderBatch>()?.trigger(app).await {
			BatchRun::Failed(e) => Err(Error::Internal(e.into())),
			BatchRun::Skipped | BatchRun::Completed(_) => Ok(()),
		}
	}
}


// vim: ts=4
