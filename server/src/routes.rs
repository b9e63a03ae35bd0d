use axum::{
	Router,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::prelude::*;
use frameping_webhook::handler::post_frames_webhook;

pub fn init(app: App) -> Router {
	Router::new()
		.route("/frames-webhook", post(post_frames_webhook))
		.route("/cast-appreciation", post(handler::post_cast_appreciation))
		.route("/health", get(handler::get_health))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
