//! Adapter that persists per-user notification credentials.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

/// Destination and token needed to push a notification to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCredential {
	/// Delivery endpoint of the push provider
	pub url: String,
	/// Opaque delivery token issued by the push provider
	pub token: String,
	/// `false` suppresses delivery without discarding the record
	pub enabled: bool,
	pub last_updated: Timestamp,
}

impl NotificationCredential {
	/// Creates an enabled credential stamped with the current time
	pub fn enabled(url: impl Into<String>, token: impl Into<String>) -> Self {
		Self { url: url.into(), token: token.into(), enabled: true, last_updated: Timestamp::now() }
	}

	/// Returns a disabled copy with a refreshed timestamp
	pub fn disabled(self) -> Self {
		Self { enabled: false, last_updated: Timestamp::now(), ..self }
	}

	/// Checks that an enabled credential carries both a url and a token
	pub fn validate(&self) -> ClResult<()> {
		if self.enabled && (self.url.trim().is_empty() || self.token.trim().is_empty()) {
			return Err(Error::ValidationError(
				"enabled credential requires a non-empty url and token".into(),
			));
		}
		Ok(())
	}
}

#[async_trait]
pub trait CredentialAdapter: Debug + Send + Sync {
	/// Reads the credential of a user
	///
	/// Returns `Error::NotFound` if the user has no record and `Error::Corrupt`
	/// if the record exists but cannot be decoded.
	async fn read_credential(&self, fid: Fid) -> ClResult<NotificationCredential>;

	/// Replaces the credential of a user. Readers never observe a partial write.
	async fn write_credential(&self, fid: Fid, credential: &NotificationCredential)
	-> ClResult<()>;

	/// Deletes the credential of a user. Deleting a missing record is not an error.
	async fn delete_credential(&self, fid: Fid) -> ClResult<()>;

	/// Lists every user that has a stored record, readable or not
	async fn list_fids(&self) -> ClResult<Vec<Fid>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_credential_json_layout() {
		let cred = NotificationCredential {
			url: "https://api.example.com/v1/notify".into(),
			token: "tok-1".into(),
			enabled: true,
			last_updated: Timestamp(1_700_000_000),
		};
		let json = serde_json::to_value(&cred).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"url": "https://api.example.com/v1/notify",
				"token": "tok-1",
				"enabled": true,
				"lastUpdated": 1_700_000_000
			})
		);
	}

	#[test]
	fn test_validate() {
		assert!(NotificationCredential::enabled("https://x", "t").validate().is_ok());
		assert!(NotificationCredential::enabled("", "t").validate().is_err());
		assert!(NotificationCredential::enabled("https://x", " ").validate().is_err());
		// Disabled records may be incomplete
		assert!(NotificationCredential::enabled("", "").disabled().validate().is_ok());
	}

	#[test]
	fn test_disabled_keeps_token() {
		let cred = NotificationCredential::enabled("https://x", "tok");
		let disabled = cred.clone().disabled();
		assert!(!disabled.enabled);
		assert_eq!(disabled.token, cred.token);
		assert_eq!(disabled.url, cred.url);
	}
}

// vim: ts=4
