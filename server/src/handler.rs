//! Front-end handlers outside the notification core

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use frameping_core::app::VERSION;

#[derive(Debug, Deserialize)]
pub struct CastAppreciation {
	pub fid: Fid,
	pub token: String,
	pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
	pub success: bool,
}

/// POST /cast-appreciation
///
/// Accepted and acknowledged without further processing.
pub async fn post_cast_appreciation(
	body: Result<Json<CastAppreciation>, JsonRejection>,
) -> Json<SuccessResponse> {
	match body {
		Ok(Json(req)) => {
			info!(fid = %req.fid, text_len = req.text.len(), "Cast appreciation received");
		}
		Err(e) => debug!(error = %e, "Unparseable cast appreciation"),
	}
	Json(SuccessResponse { success: true })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "ok", version: VERSION })
}

// vim: ts=4
