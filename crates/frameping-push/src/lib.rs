//! Push notification module
//!
//! Delivers notifications to users through their push provider and runs the
//! daily reminder batch.
//!
//! # Features
//!
//! - Single-user dispatch with outcome classification (`send_notification`)
//! - Daily reminder batch with a single-run guard and rate-limit back-off
//! - Scheduler integration for the reminder batch

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod reminder;
pub mod send;

mod prelude;

pub use reminder::{BatchReport, BatchRun, ReminderBatch, ReminderTask};
pub use send::{DispatchOutcome, send_notification};

use std::sync::Arc;

use crate::prelude::*;
use frameping_core::AppBuilder;

/// Registers the reminder batch state
pub fn register(builder: &mut AppBuilder) {
	builder.extension(ReminderBatch::new());
}

/// Schedules the daily reminder at the configured UTC time
pub async fn init(app: &App) -> ClResult<()> {
	let (hour, minute) = (app.opts.reminder_hour, app.opts.reminder_minute);
	app.scheduler
		.task(Arc::new(ReminderTask))
		.key(reminder::REMINDER_TASK_KEY)
		.daily_at(hour, minute)
		.schedule()
		.await?;
	info!("Daily reminder scheduled at {:02}:{:02} UTC", hour, minute);
	Ok(())
}

// vim: ts=4
