//! Frame lifecycle event types
//!
//! Events arrive wrapped in a signed envelope. Each of the three envelope
//! parts is base64url-encoded; the header names the user and the app key
//! that signed the payload.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Push destination attached to `frame_added` and `notifications_enabled`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDetails {
	pub url: String,
	pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FrameEvent {
	FrameAdded {
		#[serde(rename = "notificationDetails", default, skip_serializing_if = "Option::is_none")]
		notification_details: Option<NotificationDetails>,
	},
	FrameRemoved,
	NotificationsEnabled {
		#[serde(rename = "notificationDetails")]
		notification_details: NotificationDetails,
	},
	NotificationsDisabled,
}

impl FrameEvent {
	pub fn name(&self) -> &'static str {
		match self {
			FrameEvent::FrameAdded { .. } => "frame_added",
			FrameEvent::FrameRemoved => "frame_removed",
			FrameEvent::NotificationsEnabled { .. } => "notifications_enabled",
			FrameEvent::NotificationsDisabled => "notifications_disabled",
		}
	}

	pub fn notification_details(&self) -> Option<&NotificationDetails> {
		match self {
			FrameEvent::FrameAdded { notification_details } => notification_details.as_ref(),
			FrameEvent::NotificationsEnabled { notification_details } => Some(notification_details),
			FrameEvent::FrameRemoved | FrameEvent::NotificationsDisabled => None,
		}
	}
}

/// Event whose signature and app key have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEvent {
	pub fid: Fid,
	/// Hex-encoded app key that signed the event, `0x`-prefixed
	pub app_key: String,
	pub event: FrameEvent,
}

/// Raw webhook body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
	pub header: String,
	pub payload: String,
	pub signature: String,
}

/// Decoded envelope header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
	pub fid: Fid,
	#[serde(rename = "type")]
	pub kind: String,
	pub key: String,
}


// vim: ts=4
