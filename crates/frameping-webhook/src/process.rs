//! Webhook event processing
//!
//! Verifies an incoming event, applies it to the user's credential and sends
//! the welcome notification when a frame is added with notifications.

use axum::{Json, http::StatusCode, response::IntoResponse};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::event::{FrameEvent, VerifiedEvent};
use crate::prelude::*;
use crate::verify::EventVerifier;
use frameping_push::send_notification;
use frameping_types::credential_adapter::NotificationCredential;

pub const WELCOME_TITLE: &str = "Welcome to Frameping";
pub const WELCOME_BODY: &str = "You will get a reminder every day when a new frame is ready.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
	pub status: StatusCode,
	pub body: WebhookResponse,
}

impl ProcessingResult {
	fn ok(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::OK,
			body: WebhookResponse { success: true, message: Some(message.into()), error: None },
		}
	}

	fn failed(status: StatusCode, error: impl Into<String>) -> Self {
		Self { status, body: WebhookResponse { success: false, message: None, error: Some(error.into()) } }
	}
}

impl IntoResponse for ProcessingResult {
	fn into_response(self) -> axum::response::Response {
		(self.status, Json(self.body)).into_response()
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"unknown error".to_string()
	}
}

/// Processes a raw webhook body
///
/// Without a verifier nothing is processed and the call succeeds. A panic
/// anywhere in verification or processing becomes a 500 response.
pub async fn process(app: &App, verifier: Option<&dyn EventVerifier>, raw: &[u8]) -> ProcessingResult {
	let Some(verifier) = verifier else {
		return ProcessingResult::ok("verification not enabled");
	};

	match AssertUnwindSafe(verify_and_apply(app, verifier, raw)).catch_unwind().await {
		Ok(result) => result,
		Err(panic) => {
			let msg = panic_message(&*panic);
			error!(error = %msg, "Webhook processing panicked");
			ProcessingResult::failed(StatusCode::INTERNAL_SERVER_ERROR, msg)
		}
	}
}

async fn verify_and_apply(app: &App, verifier: &dyn EventVerifier, raw: &[u8]) -> ProcessingResult {
	let verified = match verifier.verify(app, raw).await {
		Ok(verified) => verified,
		Err(e) => {
			warn!(status = %e.status(), error = %e, "Webhook verification failed");
			return ProcessingResult::failed(e.status(), e.to_string());
		}
	};

	match apply_event(app, &verified).await {
		Ok(()) => ProcessingResult::ok(format!(
			"processed {} for fid {}",
			verified.event.name(),
			verified.fid
		)),
		Err(e) => {
			error!(fid = %verified.fid, error = %e, "Webhook processing failed");
			ProcessingResult::failed(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
		}
	}
}

/// Applies a verified event to the user's credential
pub async fn apply_event(app: &App, verified: &VerifiedEvent) -> ClResult<()> {
	let fid = verified.fid;
	info!(fid = %fid, event = verified.event.name(), "Applying frame event");

	match &verified.event {
		FrameEvent::FrameAdded { notification_details: Some(details) } => {
			let credential = NotificationCredential::enabled(&details.url, &details.token);
			app.credentials.upsert(fid, credential.clone()).await?;

			let outcome =
				send_notification(app, fid, WELCOME_TITLE, WELCOME_BODY, Some(&credential)).await;
			info!(fid = %fid, outcome = ?outcome, "Welcome notification dispatched");
		}
		FrameEvent::FrameAdded { notification_details: None } => {
			// Nothing changes; the current snapshot is written back as is
			app.credentials.modify(fid, Ok).await?;
		}
		FrameEvent::FrameRemoved => app.credentials.remove(fid).await?,
		FrameEvent::NotificationsEnabled { notification_details: details } => {
			app.credentials
				.upsert(fid, NotificationCredential::enabled(&details.url, &details.token))
				.await?;
		}
		FrameEvent::NotificationsDisabled => {
			if !app.credentials.disable(fid).await? {
				debug!(fid = %fid, "No credential to disable");
			}
		}
	}
	Ok(())
}


// vim: ts=4
