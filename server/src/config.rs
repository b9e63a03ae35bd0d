//! Environment configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `LISTEN` | `127.0.0.1:3000` |
//! | `DATA_DIR` | `./data` |
//! | `APP_URL` | `https://frameping.app` |
//! | `HUB_API_URL` | unset, disables webhook verification |
//! | `HUB_API_KEY` | unset, disables webhook verification |
//! | `REMINDER_HOUR` | `17` (UTC) |
//! | `REMINDER_MINUTE` | `0` |
//! | `DISPATCH_INTERVAL_MS` | `500` |
//! | `DISPATCH_TIMEOUT_SECS` | `10` |

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::prelude::*;
use frameping_core::AppBuilder;

fn parse_var<T>(name: &str, value: &str) -> ClResult<T>
where
	T: FromStr,
	T::Err: Display,
{
	value
		.trim()
		.parse()
		.map_err(|e| Error::ConfigError(format!("{}={:?}: {}", name, value, e)))
}

/// Applies configuration variables to the builder
///
/// `lookup` resolves a variable name. Unset variables keep the builder's
/// current value; empty values count as unset.
pub fn apply<F>(builder: &mut AppBuilder, lookup: F) -> ClResult<()>
where
	F: Fn(&str) -> Option<String>,
{
	let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

	if let Some(listen) = lookup("LISTEN") {
		builder.listen(listen);
	}
	if let Some(data_dir) = lookup("DATA_DIR") {
		builder.data_dir(PathBuf::from(data_dir));
	}
	if let Some(app_url) = lookup("APP_URL") {
		builder.app_url(app_url);
	}
	if let Some(hub_api_url) = lookup("HUB_API_URL") {
		builder.hub_api_url(hub_api_url);
	}
	if let Some(hub_api_key) = lookup("HUB_API_KEY") {
		builder.hub_api_key(hub_api_key);
	}

	let hour = match lookup("REMINDER_HOUR") {
		Some(v) => parse_var("REMINDER_HOUR", &v)?,
		None => builder.opts().reminder_hour,
	};
	let minute = match lookup("REMINDER_MINUTE") {
		Some(v) => parse_var("REMINDER_MINUTE", &v)?,
		None => builder.opts().reminder_minute,
	};
	builder.reminder_at(hour, minute);

	if let Some(v) = lookup("DISPATCH_INTERVAL_MS") {
		builder.dispatch_interval(Duration::from_millis(parse_var("DISPATCH_INTERVAL_MS", &v)?));
	}
	if let Some(v) = lookup("DISPATCH_TIMEOUT_SECS") {
		builder.dispatch_timeout(Duration::from_secs(parse_var("DISPATCH_TIMEOUT_SECS", &v)?));
	}
	Ok(())
}

/// Applies the process environment to the builder
pub fn from_env(builder: &mut AppBuilder) -> ClResult<()> {
	apply(builder, |name| std::env::var(name).ok())
}


// vim: ts=4
