//! Scheduler subsystem. Runs one-shot and cron-repeated async tasks in memory.

use async_trait::async_trait;
use std::{
	collections::{BTreeMap, HashMap},
	fmt::Debug,
	str::FromStr,
	sync::{
		Arc, Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

use chrono::{DateTime, Utc};
use croner::Cron;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use crate::prelude::*;

pub type TaskId = u64;

/// Cron schedule wrapper using the croner crate
#[derive(Debug, Clone)]
pub struct CronSchedule {
	expr: Box<str>,
	cron: Cron,
}

impl CronSchedule {
	/// Parse a cron expression (5 fields: minute hour day month weekday)
	pub fn parse(expr: &str) -> ClResult<Self> {
		let cron = Cron::from_str(expr)
			.map_err(|e| Error::ValidationError(format!("invalid cron expression: {}", e)))?;
		Ok(Self { expr: expr.into(), cron })
	}

	/// Daily schedule at the given UTC hour and minute
	pub fn daily(hour: u8, minute: u8) -> ClResult<Self> {
		if hour > 23 || minute > 59 {
			return Err(Error::ValidationError(format!(
				"invalid time of day: {:02}:{:02}",
				hour, minute
			)));
		}
		Self::parse(&format!("{} {} * * *", minute, hour))
	}

	/// Calculate the next execution time strictly after the given timestamp
	pub fn next_execution(&self, after: Timestamp) -> ClResult<Timestamp> {
		let dt = DateTime::<Utc>::from_timestamp(after.0, 0).unwrap_or_else(Utc::now);

		self.cron
			.find_next_occurrence(&dt, false)
			.map(|next| Timestamp(next.timestamp()))
			.map_err(|e| {
				error!("Failed to find next cron occurrence for '{}': {}", self.expr, e);
				Error::ValidationError(format!("cron next_execution failed: {}", e))
			})
	}
}

impl PartialEq for CronSchedule {
	fn eq(&self, other: &Self) -> bool {
		self.expr == other.expr
	}
}

impl Eq for CronSchedule {}

#[async_trait]
pub trait Task<S: Clone>: Send + Sync + Debug {
	fn kind() -> &'static str
	where
		Self: Sized;
	async fn run(&self, state: &S) -> ClResult<()>;

	fn kind_of(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct TaskMeta<S: Clone> {
	pub task: Arc<dyn Task<S>>,
	pub key: Option<Box<str>>,
	pub next_at: Option<Timestamp>,
	pub cron: Option<CronSchedule>,
}

// TaskSchedulerBuilder - Fluent API for task scheduling
//************************************************************
pub struct TaskSchedulerBuilder<'a, S: Clone> {
	scheduler: &'a Scheduler<S>,
	task: Arc<dyn Task<S>>,
	key: Option<String>,
	cron: Option<ClResult<CronSchedule>>,
}

impl<'a, S: Clone + Send + Sync + 'static> TaskSchedulerBuilder<'a, S> {
	fn new(scheduler: &'a Scheduler<S>, task: Arc<dyn Task<S>>) -> Self {
		Self { scheduler, task, key: None, cron: None }
	}

	/// Set a string key; scheduling again under the same key replaces the earlier task
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Schedule task daily at specified UTC time
	/// Example: `.daily_at(17, 0)` for 5 PM daily
	pub fn daily_at(mut self, hour: u8, minute: u8) -> Self {
		self.cron = Some(CronSchedule::daily(hour, minute));
		self
	}

	/// Queues the task; without a schedule it runs right away
	pub async fn schedule(self) -> ClResult<TaskId> {
		let cron = self.cron.transpose()?;
		let next_at = cron.as_ref().map(|cron| cron.next_execution(Timestamp::now())).transpose()?;

		self.scheduler.schedule_task_impl(TaskMeta {
			task: self.task,
			key: self.key.map(Into::into),
			next_at,
			cron,
		})
	}
}

type ScheduledTaskMap<S> = BTreeMap<(Timestamp, TaskId), TaskMeta<S>>;

// Scheduler
#[derive(Clone)]
pub struct Scheduler<S: Clone> {
	last_id: Arc<AtomicU64>,
	keys: Arc<Mutex<HashMap<Box<str>, TaskId>>>,
	tasks_running: Arc<Mutex<HashMap<TaskId, TaskMeta<S>>>>,
	tasks_scheduled: Arc<Mutex<ScheduledTaskMap<S>>>,
	notify_schedule: Arc<tokio::sync::Notify>,
}

impl<S: Clone> Debug for Scheduler<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scheduler").field("last_id", &self.last_id).finish_non_exhaustive()
	}
}

impl<S: Clone + Send + Sync + 'static> Scheduler<S> {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			last_id: Arc::new(AtomicU64::new(0)),
			keys: Arc::new(Mutex::new(HashMap::new())),
			tasks_running: Arc::new(Mutex::new(HashMap::new())),
			tasks_scheduled: Arc::new(Mutex::new(BTreeMap::new())),
			notify_schedule: Arc::new(tokio::sync::Notify::new()),
		})
	}

	/// Starts the dispatch loop. Tasks due in the past run immediately.
	pub fn start(&self, state: S) {
		let schedule = self.clone();
		tokio::spawn(async move {
			loop {
				let next = match schedule.spawn_due(&state) {
					Ok(next) => next,
					Err(e) => {
						error!("Scheduler loop failed: {}", e);
						return;
					}
				};

				match next {
					Some(timestamp) => {
						let diff = timestamp.0 - Timestamp::now().0;
						let wait =
							tokio::time::Duration::from_secs(u64::try_from(diff).unwrap_or_default());
						tokio::select! {
							() = tokio::time::sleep(wait) => (),
							() = schedule.notify_schedule.notified() => (),
						};
					}
					None => schedule.notify_schedule.notified().await,
				}
			}
		});
	}

	/// Spawns every due task and returns the timestamp of the next pending one
	fn spawn_due(&self, state: &S) -> ClResult<Option<Timestamp>> {
		let mut tasks_scheduled = lock!(self.tasks_scheduled, "tasks_scheduled")?;
		loop {
			let Some(&(timestamp, id)) = tasks_scheduled.keys().next() else {
				return Ok(None);
			};
			if timestamp > Timestamp::now() {
				return Ok(Some(timestamp));
			}
			if let Some(task_meta) = tasks_scheduled.remove(&(timestamp, id)) {
				debug!("Spawning task id {} (from schedule)", id);
				lock!(self.tasks_running, "tasks_running")?.insert(id, task_meta.clone());
				self.spawn_task(state.clone(), id, task_meta);
			}
		}
	}

	/// Create a builder for scheduling a task using the fluent API
	pub fn task(&self, task: Arc<dyn Task<S>>) -> TaskSchedulerBuilder<'_, S> {
		TaskSchedulerBuilder::new(self, task)
	}

	fn schedule_task_impl(&self, task_meta: TaskMeta<S>) -> ClResult<TaskId> {
		let id = match &task_meta.key {
			Some(key) => {
				let mut keys = lock!(self.keys, "keys")?;
				if let Some(&existing_id) = keys.get(key) {
					info!("Replacing task '{}' (id={})", key, existing_id);
					existing_id
				} else {
					let id = self.next_id();
					keys.insert(key.clone(), id);
					id
				}
			}
			None => self.next_id(),
		};

		self.add_queue(id, task_meta)
	}

	fn next_id(&self) -> TaskId {
		self.last_id.fetch_add(1, Ordering::Relaxed) + 1
	}

	pub fn add_queue(&self, id: TaskId, task_meta: TaskMeta<S>) -> ClResult<TaskId> {
		// A running task picks up the new metadata when it finishes
		{
			let mut running = lock!(self.tasks_running, "tasks_running")?;
			if let Some(existing_meta) = running.get_mut(&id) {
				debug!("Task {} is already running, updating metadata", id);
				*existing_meta = task_meta;
				return Ok(id);
			}
		}

		let mut scheduled = lock!(self.tasks_scheduled, "tasks_scheduled")?;
		scheduled.retain(|(_, tid), _| *tid != id);

		let next_at = match task_meta.next_at {
			Some(next_at) if next_at > Timestamp::now() => next_at,
			_ => Timestamp(0),
		};
		debug!("Scheduling task {} ({}) for {}", id, task_meta.task.kind_of(), next_at);
		scheduled.insert((next_at, id), task_meta);
		self.notify_schedule.notify_one();
		Ok(id)
	}

	fn spawn_task(&self, state: S, id: TaskId, task_meta: TaskMeta<S>) {
		let scheduler = self.clone();
		tokio::spawn(async move {
			let kind = task_meta.task.kind_of();
			match AssertUnwindSafe(task_meta.task.run(&state)).catch_unwind().await {
				Ok(Ok(())) => debug!("Task {} ({}) completed successfully", id, kind),
				Ok(Err(e)) => error!("Task {} ({}) failed: {}", id, kind, e),
				Err(_) => error!("Task {} ({}) panicked", id, kind),
			}
			if let Err(e) = scheduler.finished(id) {
				error!("Failed to finish task {}: {}", id, e);
			}
		});
	}

	/// Moves a finished task out of the running queue, rescheduling cron tasks
	fn finished(&self, id: TaskId) -> ClResult<()> {
		let Some(task_meta) = lock!(self.tasks_running, "tasks_running")?.remove(&id) else {
			warn!("Completed task {} not found in running queue", id);
			return Ok(());
		};

		let Some(cron) = &task_meta.cron else {
			if let Some(key) = &task_meta.key {
				lock!(self.keys, "keys")?.remove(key);
			}
			return Ok(());
		};

		let next_at = cron.next_execution(Timestamp::now())?;
		info!("Recurring task {} completed, scheduling next execution at {}", id, next_at);
		self.add_queue(id, TaskMeta { next_at: Some(next_at), ..task_meta })?;
		Ok(())
	}

	/// Number of tasks waiting for their execution time
	pub fn pending(&self) -> ClResult<usize> {
		Ok(lock!(self.tasks_scheduled, "tasks_scheduled")?.len())
	}

	/// Next execution time of a keyed task, if it is queued
	pub fn next_run(&self, key: &str) -> ClResult<Option<Timestamp>> {
		let Some(id) = lock!(self.keys, "keys")?.get(key).copied() else {
			return Ok(None);
		};
		let scheduled = lock!(self.tasks_scheduled, "tasks_scheduled")?;
		Ok(scheduled.keys().find(|(_, tid)| *tid == id).map(|(ts, _)| *ts))
	}
}


// vim: ts=4
