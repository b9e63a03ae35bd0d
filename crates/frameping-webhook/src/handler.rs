//! Webhook HTTP handler

use axum::body::Bytes;
use axum::extract::State;

use crate::prelude::*;
use crate::process::{ProcessingResult, process};
use crate::verify::Verifier;

/// POST /frames-webhook
///
/// Accepts a signed frame lifecycle event. Returns 200 without processing
/// when no verifier is configured.
pub async fn post_frames_webhook(State(app): State<App>, body: Bytes) -> ProcessingResult {
	let verifier = app.ext::<Verifier>().ok().map(|v| v.0.as_ref());
	process(&app, verifier, &body).await
}

// vim: ts=4
