//! Notification delivery
//!
//! Sends one notification to one user through the push provider endpoint
//! named in the user's credential and classifies the result. Delivery never
//! returns an error: every failure is folded into a `DispatchOutcome`.

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use frameping_types::credential_adapter::NotificationCredential;
use frameping_types::utils::truncate_chars;

/// Maximum notification title length accepted by the provider
pub const MAX_TITLE_CHARS: usize = 32;
/// Maximum notification body length accepted by the provider
pub const MAX_BODY_CHARS: usize = 128;

/// Result of a single dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// Accepted by the provider
	Success,
	/// The user has no enabled credential
	NoCredential,
	/// The provider throttled the token, callers should back off
	RateLimited,
	/// Network failure, timeout, non-2xx status or malformed response
	TransportError(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationRequest<'a> {
	notification_id: String,
	title: &'a str,
	body: &'a str,
	target_url: &'a str,
	tokens: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendNotificationResult {
	successful_tokens: Vec<String>,
	invalid_tokens: Vec<String>,
	rate_limited_tokens: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SendNotificationResponse {
	result: SendNotificationResult,
}

/// Send a notification to a user
///
/// When `credential` is `None` the user's credential is looked up in the
/// store. A missing or disabled credential yields `NoCredential` without
/// touching the network.
pub async fn send_notification(
	app: &App,
	fid: Fid,
	title: &str,
	body: &str,
	credential: Option<&NotificationCredential>,
) -> DispatchOutcome {
	let stored;
	let credential = match credential {
		Some(credential) => credential,
		None => match app.credentials.get(fid).await {
			Some(credential) => {
				stored = credential;
				&stored
			}
			None => return DispatchOutcome::NoCredential,
		},
	};
	if !credential.enabled {
		return DispatchOutcome::NoCredential;
	}

	let request = SendNotificationRequest {
		notification_id: uuid::Uuid::new_v4().to_string(),
		title: truncate_chars(title, MAX_TITLE_CHARS),
		body: truncate_chars(body, MAX_BODY_CHARS),
		target_url: &app.opts.app_url,
		tokens: [credential.token.as_str()],
	};

	app.throttle.acquire().await;

	let response =
		match app.request.post_json(&credential.url, &request, app.opts.dispatch_timeout).await {
			Ok(response) => response,
			Err(e) => {
				warn!(fid = %fid, error = %e, "Push notification request failed");
				return DispatchOutcome::TransportError(e.to_string());
			}
		};

	if !response.status.is_success() {
		let body = response.body_text();
		warn!(fid = %fid, status = %response.status, body = %body, "Push provider rejected notification");
		return DispatchOutcome::TransportError(body);
	}

	let parsed: SendNotificationResponse = match serde_json::from_slice(&response.body) {
		Ok(parsed) => parsed,
		Err(e) => {
			warn!(fid = %fid, error = %e, "Malformed push provider response");
			return DispatchOutcome::TransportError(format!("invalid response: {}", e));
		}
	};

	if parsed.result.invalid_tokens.iter().any(|t| *t == credential.token) {
		warn!(fid = %fid, "Push provider reported the token as invalid");
	}
	if !parsed.result.rate_limited_tokens.is_empty() {
		info!(fid = %fid, "Push notification rate limited");
		return DispatchOutcome::RateLimited;
	}

	debug!(
		fid = %fid,
		notification_id = %request.notification_id,
		accepted = parsed.result.successful_tokens.len(),
		"Push notification sent"
	);
	DispatchOutcome::Success
}

// vim: ts=4
