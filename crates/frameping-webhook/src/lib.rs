//! Frame webhook module
//!
//! Verifies signed frame lifecycle events and keeps the per-user notification
//! credential in sync with them.
//!
//! # Events
//!
//! - `frame_added` stores the attached credential and sends a welcome notification
//! - `frame_removed` deletes the credential
//! - `notifications_enabled` stores the attached credential
//! - `notifications_disabled` keeps the credential but stops delivery

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod event;
pub mod handler;
pub mod process;
pub mod verify;

mod prelude;

pub use event::{FrameEvent, NotificationDetails, VerifiedEvent};
pub use process::{ProcessingResult, WebhookResponse, process};
pub use verify::{AppKeyVerifier, EventVerifier, Verifier, VerifyError};

use std::sync::Arc;

use frameping_core::AppBuilder;

/// Registers the hub-backed verifier when the hub is configured
pub fn register(builder: &mut AppBuilder) {
	let verifier = builder.opts().hub().map(|(url, key)| AppKeyVerifier::new(url, key));
	match verifier {
		Some(verifier) => {
			builder.extension(Verifier(Arc::new(verifier)));
		}
		None => tracing::warn!("Hub API not configured, webhook verification disabled"),
	}
}

// vim: ts=4
