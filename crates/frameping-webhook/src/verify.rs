//! Webhook envelope verification
//!
//! Envelope checks happen in two stages. `parse_envelope` decodes the
//! envelope and checks the Ed25519 signature against the key named in the
//! header. `AppKeyVerifier` then asks the hub whether that key is an active
//! app key of the user.

use async_trait::async_trait;
use axum::http::StatusCode;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;

use crate::event::{EnvelopeHeader, FrameEvent, SignedEnvelope, VerifiedEvent};
use crate::prelude::*;

/// base64url accepting both padded and unpadded input
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const APP_KEY_TYPE: &str = "app_key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
	/// Envelope, header or signature is malformed or does not verify
	InvalidData(String),
	/// Payload does not decode into a known event
	InvalidEventData(String),
	/// Signing key is not an active app key of the user
	InvalidAppKey(String),
	/// The hub could not be asked
	VerifyAppKey(String),
}

impl VerifyError {
	pub fn status(&self) -> StatusCode {
		match self {
			VerifyError::InvalidData(_) | VerifyError::InvalidEventData(_) => {
				StatusCode::BAD_REQUEST
			}
			VerifyError::InvalidAppKey(_) => StatusCode::UNAUTHORIZED,
			VerifyError::VerifyAppKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl std::fmt::Display for VerifyError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VerifyError::InvalidData(msg) => write!(f, "invalid data: {}", msg),
			VerifyError::InvalidEventData(msg) => write!(f, "invalid event data: {}", msg),
			VerifyError::InvalidAppKey(msg) => write!(f, "invalid app key: {}", msg),
			VerifyError::VerifyAppKey(msg) => write!(f, "app key verification failed: {}", msg),
		}
	}
}

impl std::error::Error for VerifyError {}

#[async_trait]
pub trait EventVerifier: Debug + Send + Sync {
	/// Verifies a raw webhook body and extracts its event
	async fn verify(&self, app: &App, raw: &[u8]) -> Result<VerifiedEvent, VerifyError>;
}

/// App extension holding the configured verifier
#[derive(Debug, Clone)]
pub struct Verifier(pub Arc<dyn EventVerifier>);

fn decode_part(name: &str, part: &str) -> Result<Vec<u8>, VerifyError> {
	URL_SAFE_LENIENT
		.decode(part.trim())
		.map_err(|e| VerifyError::InvalidData(format!("{}: {}", name, e)))
}

/// Parses a `0x`-prefixed hex Ed25519 public key
fn parse_app_key(key: &str) -> Result<VerifyingKey, VerifyError> {
	let hex_key = key.strip_prefix("0x").unwrap_or(key);
	let bytes = hex::decode(hex_key)
		.map_err(|e| VerifyError::InvalidData(format!("app key: {}", e)))?;
	let bytes: [u8; 32] = bytes
		.try_into()
		.map_err(|_| VerifyError::InvalidData("app key must be 32 bytes".into()))?;
	VerifyingKey::from_bytes(&bytes)
		.map_err(|e| VerifyError::InvalidData(format!("app key: {}", e)))
}

/// Decodes an envelope and checks its signature
///
/// Does not consult the hub: the returned event is authentic for the key in
/// its header, not yet for the user.
pub fn parse_envelope(raw: &[u8]) -> Result<VerifiedEvent, VerifyError> {
	let envelope: SignedEnvelope = serde_json::from_slice(raw)
		.map_err(|e| VerifyError::InvalidData(format!("envelope: {}", e)))?;

	let header: EnvelopeHeader = serde_json::from_slice(&decode_part("header", &envelope.header)?)
		.map_err(|e| VerifyError::InvalidData(format!("header: {}", e)))?;
	if header.kind != APP_KEY_TYPE {
		return Err(VerifyError::InvalidData(format!("unsupported header type: {}", header.kind)));
	}

	let key = parse_app_key(&header.key)?;
	let signature = decode_part("signature", &envelope.signature)?;
	let signature = Signature::from_slice(&signature)
		.map_err(|e| VerifyError::InvalidData(format!("signature: {}", e)))?;
	let message = format!("{}.{}", envelope.header, envelope.payload);
	key.verify(message.as_bytes(), &signature)
		.map_err(|_| VerifyError::InvalidData("signature does not match".into()))?;

	let payload = URL_SAFE_LENIENT
		.decode(envelope.payload.trim())
		.map_err(|e| VerifyError::InvalidEventData(format!("payload: {}", e)))?;
	let event: FrameEvent = serde_json::from_slice(&payload)
		.map_err(|e| VerifyError::InvalidEventData(format!("payload: {}", e)))?;
	if let Some(details) = event.notification_details() {
		if details.url.trim().is_empty() || details.token.trim().is_empty() {
			return Err(VerifyError::InvalidEventData(
				"notification details need a url and a token".into(),
			));
		}
	}

	Ok(VerifiedEvent { fid: header.fid, app_key: header.key.to_lowercase(), event })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignerEventBody {
	key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignerEvent {
	signer_event_body: SignerEventBody,
}

#[derive(Debug, Deserialize)]
struct SignersResponse {
	events: Vec<SignerEvent>,
}

/// Verifies envelopes against the hub's list of on-chain signers
#[derive(Debug, Clone)]
pub struct AppKeyVerifier {
	hub_url: Box<str>,
	api_key: Box<str>,
}

impl AppKeyVerifier {
	pub fn new(hub_url: impl Into<Box<str>>, api_key: impl Into<Box<str>>) -> Self {
		Self { hub_url: hub_url.into(), api_key: api_key.into() }
	}

	async fn is_active_signer(&self, app: &App, fid: Fid, key: &str) -> Result<bool, VerifyError> {
		let url = format!("{}/v1/onChainSignersByFid?fid={}", self.hub_url.trim_end_matches('/'), fid);
		let response = app
			.request
			.get(&url, &[("x-api-key", &*self.api_key)], app.opts.dispatch_timeout)
			.await
			.map_err(|e| VerifyError::VerifyAppKey(e.to_string()))?;

		if !response.status.is_success() {
			return Err(VerifyError::VerifyAppKey(format!(
				"hub returned {}: {}",
				response.status,
				response.body_text()
			)));
		}

		let signers: SignersResponse = serde_json::from_slice(&response.body)
			.map_err(|e| VerifyError::VerifyAppKey(format!("hub response: {}", e)))?;
		Ok(signers.events.iter().any(|e| e.signer_event_body.key.eq_ignore_ascii_case(key)))
	}
}

#[async_trait]
impl EventVerifier for AppKeyVerifier {
	async fn verify(&self, app: &App, raw: &[u8]) -> Result<VerifiedEvent, VerifyError> {
		let verified = parse_envelope(raw)?;

		if !self.is_active_signer(app, verified.fid, &verified.app_key).await? {
			return Err(VerifyError::InvalidAppKey(format!(
				"{} is not an active signer of fid {}",
				verified.app_key, verified.fid
			)));
		}
		debug!(fid = %verified.fid, event = verified.event.name(), "Webhook envelope verified");
		Ok(verified)
	}
}


// vim: ts=4
