//! App state type and builder

use std::{path::PathBuf, sync::Arc, time::Duration};

use frameping_types::credential_adapter::CredentialAdapter;

use crate::credential_store::CredentialStore;
use crate::extensions::Extensions;
use crate::prelude::*;
use crate::throttle::{GovernorThrottle, Throttle};
use crate::{request, scheduler};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub scheduler: Arc<scheduler::Scheduler<App>>,
	pub request: request::Request,
	pub credentials: Arc<CredentialStore>,
	pub throttle: Arc<dyn Throttle>,
	pub opts: AppBuilderOpts,

	// Type-erased extension map for feature-specific state
	pub extensions: Extensions,
}

impl AppState {
	/// Get a registered extension by type. Returns error if not found.
	pub fn ext<T: Send + Sync + 'static>(&self) -> ClResult<&T> {
		self.extensions.get::<T>().ok_or_else(|| {
			Error::Internal(format!("Extension {} not registered", std::any::type_name::<T>()))
		})
	}
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub data_dir: Box<std::path::Path>,
	/// Deep-link target attached to every notification
	pub app_url: Box<str>,
	pub hub_api_url: Option<Box<str>>,
	pub hub_api_key: Option<Box<str>>,
	pub reminder_hour: u8,
	pub reminder_minute: u8,
	/// Minimum spacing between outbound push requests
	pub dispatch_interval: Duration,
	pub dispatch_timeout: Duration,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:3000".into(),
			data_dir: PathBuf::from("./data").into(),
			app_url: "https://frameping.app".into(),
			hub_api_url: None,
			hub_api_key: None,
			reminder_hour: 17,
			reminder_minute: 0,
			dispatch_interval: Duration::from_millis(500),
			dispatch_timeout: Duration::from_secs(10),
		}
	}
}

impl AppBuilderOpts {
	/// Hub URL and key, present only when both are configured
	pub fn hub(&self) -> Option<(&str, &str)> {
		match (&self.hub_api_url, &self.hub_api_key) {
			(Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
				Some((url.as_ref(), key.as_ref()))
			}
			_ => None,
		}
	}
}

pub struct AppBuilder {
	opts: AppBuilderOpts,
	credential_adapter: Option<Arc<dyn CredentialAdapter>>,
	throttle: Option<Arc<dyn Throttle>>,
	extensions: Extensions,
}

impl AppBuilder {
	pub fn new() -> Self {
		AppBuilder {
			opts: AppBuilderOpts::default(),
			credential_adapter: None,
			throttle: None,
			extensions: Extensions::new(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn data_dir(&mut self, data_dir: impl Into<Box<std::path::Path>>) -> &mut Self {
		self.opts.data_dir = data_dir.into();
		self
	}
	pub fn app_url(&mut self, app_url: impl Into<Box<str>>) -> &mut Self {
		self.opts.app_url = app_url.into();
		self
	}
	pub fn hub_api_url(&mut self, hub_api_url: impl Into<Box<str>>) -> &mut Self {
		self.opts.hub_api_url = Some(hub_api_url.into());
		self
	}
	pub fn hub_api_key(&mut self, hub_api_key: impl Into<Box<str>>) -> &mut Self {
		self.opts.hub_api_key = Some(hub_api_key.into());
		self
	}
	pub fn reminder_at(&mut self, hour: u8, minute: u8) -> &mut Self {
		self.opts.reminder_hour = hour;
		self.opts.reminder_minute = minute;
		self
	}
	pub fn dispatch_interval(&mut self, interval: Duration) -> &mut Self {
		self.opts.dispatch_interval = interval;
		self
	}
	pub fn dispatch_timeout(&mut self, timeout: Duration) -> &mut Self {
		self.opts.dispatch_timeout = timeout;
		self
	}
	pub fn opts(&self) -> &AppBuilderOpts {
		&self.opts
	}

	// Adapters
	pub fn credential_adapter(&mut self, adapter: Arc<dyn CredentialAdapter>) -> &mut Self {
		self.credential_adapter = Some(adapter);
		self
	}
	/// Overrides the default governor throttle
	pub fn throttle(&mut self, throttle: Arc<dyn Throttle>) -> &mut Self {
		self.throttle = Some(throttle);
		self
	}
	/// Registers feature-specific state, retrievable with `AppState::ext`
	pub fn extension<T: Send + Sync + 'static>(&mut self, val: T) -> &mut Self {
		if self.extensions.insert(val) {
			warn!("Extension {} registered twice, keeping the last one", std::any::type_name::<T>());
		}
		self
	}

	pub fn build(self) -> ClResult<App> {
		let Some(credential_adapter) = self.credential_adapter else {
			error!("FATAL: No credential adapter configured");
			return Err(Error::ConfigError("No credential adapter configured".into()));
		};
		if self.opts.reminder_hour > 23 || self.opts.reminder_minute > 59 {
			return Err(Error::ConfigError(format!(
				"invalid reminder time {:02}:{:02}",
				self.opts.reminder_hour, self.opts.reminder_minute
			)));
		}

		let throttle = self
			.throttle
			.unwrap_or_else(|| Arc::new(GovernorThrottle::new(self.opts.dispatch_interval)));

		Ok(Arc::new(AppState {
			scheduler: scheduler::Scheduler::new(),
			request: request::Request::new()?,
			credentials: Arc::new(CredentialStore::new(credential_adapter)),
			throttle,
			opts: self.opts,
			extensions: self.extensions,
		}))
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}


// vim: ts=4
