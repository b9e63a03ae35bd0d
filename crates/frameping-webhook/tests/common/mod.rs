//! Shared fixtures for webhook integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signer, SigningKey};
use frameping_core::throttle::{Throttle, Unthrottled};
use frameping_core::{App, AppBuilder};
use frameping_credential_adapter_fs::CredentialAdapterFs;
use frameping_types::types::Fid;
use frameping_webhook::{EventVerifier, FrameEvent, NotificationDetails, VerifiedEvent, VerifyError};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::ResponseTemplate;

pub async fn create_test_app(hub_url: Option<&str>) -> (App, TempDir) {
	create_test_app_with(hub_url, Arc::new(Unthrottled)).await
}

pub async fn create_test_app_with(
	hub_url: Option<&str>,
	throttle: Arc<dyn Throttle>,
) -> (App, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = CredentialAdapterFs::new(temp_dir.path().into())
		.await
		.expect("Failed to create adapter");

	let mut builder = AppBuilder::new();
	builder
		.credential_adapter(Arc::new(adapter))
		.throttle(throttle)
		.dispatch_timeout(Duration::from_millis(500));
	if let Some(hub_url) = hub_url {
		builder.hub_api_url(hub_url).hub_api_key("test-api-key");
	}
	frameping_push::register(&mut builder);
	frameping_webhook::register(&mut builder);

	(builder.build().expect("Failed to build app"), temp_dir)
}

/// Throttle that never waits but counts permits
#[derive(Debug, Default)]
pub struct CountingThrottle(pub AtomicUsize);

impl CountingThrottle {
	pub fn count(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Throttle for CountingThrottle {
	async fn acquire(&self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

/// Verifier returning a fixed result
#[derive(Debug)]
pub struct FixedVerifier(pub Result<VerifiedEvent, VerifyError>);

#[async_trait]
impl EventVerifier for FixedVerifier {
	async fn verify(&self, _app: &App, _raw: &[u8]) -> Result<VerifiedEvent, VerifyError> {
		self.0.clone()
	}
}

#[derive(Debug)]
pub struct PanickingVerifier;

#[async_trait]
impl EventVerifier for PanickingVerifier {
	async fn verify(&self, _app: &App, _raw: &[u8]) -> Result<VerifiedEvent, VerifyError> {
		panic!("hub client exploded");
	}
}

pub fn verified(fid: u64, event: FrameEvent) -> FixedVerifier {
	FixedVerifier(Ok(VerifiedEvent { fid: Fid(fid), app_key: "0x00".into(), event }))
}

pub fn details(server_uri: &str, token: &str) -> NotificationDetails {
	NotificationDetails { url: format!("{}/notify", server_uri), token: token.into() }
}

pub fn accepted(token: &str) -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_json(json!({
		"result": { "successfulTokens": [token], "invalidTokens": [], "rateLimitedTokens": [] }
	}))
}

pub fn signing_key() -> SigningKey {
	SigningKey::from_bytes(&[11u8; 32])
}

pub fn app_key(key: &SigningKey) -> String {
	format!("0x{}", hex::encode(key.verifying_key().as_bytes()))
}

/// Builds a signed webhook envelope
pub fn envelope(key: &SigningKey, fid: u64, payload: &Value) -> Vec<u8> {
	let header = json!({ "fid": fid, "type": "app_key", "key": app_key(key) });
	let header = URL_SAFE_NO_PAD.encode(header.to_string());
	let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
	let signature = key.sign(format!("{}.{}", header, payload).as_bytes());
	json!({
		"header": header,
		"payload": payload,
		"signature": URL_SAFE_NO_PAD.encode(signature.to_bytes()),
	})
	.to_string()
	.into_bytes()
}

pub fn signers_response(keys: &[&str]) -> Value {
	let events: Vec<Value> =
		keys.iter().map(|k| json!({ "signerEventBody": { "key": k } })).collect();
	json!({ "events": events })
}

// vim: ts=4
