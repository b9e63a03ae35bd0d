//! Outbound dispatch rate limiting
//!
//! Every push delivery, whether triggered by a webhook or by the reminder
//! batch, waits on the same `Throttle` before hitting the network. The
//! production implementation is a governor GCRA limiter with a burst of one,
//! which spaces requests at least `interval` apart.

use std::fmt::Debug;
use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

#[async_trait]
pub trait Throttle: Debug + Send + Sync {
	/// Waits until the next outbound request is allowed
	async fn acquire(&self);
}

/// GCRA-based throttle shared by all dispatches
pub struct GovernorThrottle {
	limiter: DefaultDirectRateLimiter,
	interval: Duration,
}

impl GovernorThrottle {
	/// Allows one request per `interval`. A zero interval disables limiting.
	pub fn new(interval: Duration) -> Self {
		let quota = Quota::with_period(interval).unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));
		Self { limiter: RateLimiter::direct(quota), interval }
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}
}

impl Debug for GovernorThrottle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GovernorThrottle").field("interval", &self.interval).finish()
	}
}

#[async_trait]
impl Throttle for GovernorThrottle {
	async fn acquire(&self) {
		self.limiter.until_ready().await;
	}
}

/// Throttle that never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

#[async_trait]
impl Throttle for Unthrottled {
	async fn acquire(&self) {}
}


// vim: ts=4
