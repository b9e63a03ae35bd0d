//! Shared fixtures for push integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use frameping_core::throttle::{Throttle, Unthrottled};
use frameping_core::{App, AppBuilder};
use frameping_credential_adapter_fs::CredentialAdapterFs;
use frameping_types::credential_adapter::NotificationCredential;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{Request, Respond, ResponseTemplate};

pub const APP_URL: &str = "https://frames.example.com/app";

pub async fn create_test_app() -> (App, TempDir) {
	create_test_app_with(Arc::new(Unthrottled)).await
}

pub async fn create_test_app_with(throttle: Arc<dyn Throttle>) -> (App, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = CredentialAdapterFs::new(temp_dir.path().into())
		.await
		.expect("Failed to create adapter");

	let mut builder = AppBuilder::new();
	builder
		.credential_adapter(Arc::new(adapter))
		.throttle(throttle)
		.dispatch_timeout(Duration::from_millis(500))
		.app_url(APP_URL);
	frameping_push::register(&mut builder);

	(builder.build().expect("Failed to build app"), temp_dir)
}

pub fn credential(server_uri: &str, token: &str) -> NotificationCredential {
	NotificationCredential::enabled(format!("{}/notify", server_uri), token)
}

pub fn provider_response(successful: &[&str], invalid: &[&str], rate_limited: &[&str]) -> Value {
	json!({
		"result": {
			"successfulTokens": successful,
			"invalidTokens": invalid,
			"rateLimitedTokens": rate_limited,
		}
	})
}

pub fn accepted(token: &str) -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_json(provider_response(&[token], &[], &[]))
}

pub fn rate_limited(token: &str) -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_json(provider_response(&[], &[], &[token]))
}

/// Shared, ordered record of throttle permits and provider requests
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Throttle that never waits but logs every permit
#[derive(Debug, Default)]
pub struct RecordingThrottle(pub EventLog);

#[async_trait]
impl Throttle for RecordingThrottle {
	async fn acquire(&self) {
		self.0.lock().unwrap().push("acquire".into());
	}
}

/// Provider responder logging `send:<token>` and answering per token
pub struct RecordingProvider {
	pub log: EventLog,
	pub rate_limited: Vec<String>,
}

impl Respond for RecordingProvider {
	fn respond(&self, request: &Request) -> ResponseTemplate {
		let body: Value = request.body_json().unwrap();
		let token = body["tokens"][0].as_str().unwrap().to_string();
		self.log.lock().unwrap().push(format!("send:{}", token));
		if self.rate_limited.contains(&token) {
			rate_limited(&token)
		} else {
			accepted(&token)
		}
	}
}

// vim: ts=4
