//! Single notification dispatch tests against a mocked push provider

mod common;

use std::time::Duration;

use common::*;
use frameping_push::send::{MAX_BODY_CHARS, MAX_TITLE_CHARS};
use frameping_push::{DispatchOutcome, send_notification};
use frameping_types::types::Fid;
use serde_json::Value;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_no_credential_makes_no_request() {
	let server = MockServer::start().await;
	Mock::given(method("POST")).respond_with(accepted("tok")).expect(0).mount(&server).await;
	let (app, _temp) = create_test_app().await;

	let outcome = send_notification(&app, Fid(1), "Hi", "Body", None).await;
	assert_eq!(outcome, DispatchOutcome::NoCredential);
}

#[tokio::test]
async fn test_disabled_credential_makes_no_request() {
	let server = MockServer::start().await;
	Mock::given(method("POST")).respond_with(accepted("tok")).expect(0).mount(&server).await;
	let (app, _temp) = create_test_app().await;

	app.credentials.upsert(Fid(1), credential(&server.uri(), "tok")).await.unwrap();
	app.credentials.disable(Fid(1)).await.unwrap();

	assert_eq!(
		send_notification(&app, Fid(1), "Hi", "Body", None).await,
		DispatchOutcome::NoCredential
	);

	let disabled = credential(&server.uri(), "tok").disabled();
	assert_eq!(
		send_notification(&app, Fid(1), "Hi", "Body", Some(&disabled)).await,
		DispatchOutcome::NoCredential
	);
}

#[tokio::test]
async fn test_success_with_stored_credential() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/notify"))
		.and(header("content-type", "application/json"))
		.and(body_partial_json(serde_json::json!({
			"title": "Hello",
			"body": "World",
			"targetUrl": APP_URL,
			"tokens": ["tok-1"],
		})))
		.respond_with(accepted("tok-1"))
		.expect(1)
		.mount(&server)
		.await;
	let (app, _temp) = create_test_app().await;
	app.credentials.upsert(Fid(7), credential(&server.uri(), "tok-1")).await.unwrap();

	let outcome = send_notification(&app, Fid(7), "Hello", "World", None).await;
	assert_eq!(outcome, DispatchOutcome::Success);
}

#[tokio::test]
async fn test_request_carries_fresh_notification_id() {
	let server = MockServer::start().await;
	Mock::given(method("POST")).respond_with(accepted("tok")).expect(2).mount(&server).await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;

	let requests = server.received_requests().await.unwrap();
	let ids: Vec<String> = requests
		.iter()
		.map(|r| {
			let body: Value = r.body_json().unwrap();
			body["notificationId"].as_str().unwrap().to_string()
		})
		.collect();
	assert_eq!(ids.len(), 2);
	assert_ne!(ids[0], ids[1]);
	assert!(ids.iter().all(|id| uuid::Uuid::parse_str(id).is_ok()));
}

#[tokio::test]
async fn test_title_and_body_are_truncated() {
	let server = MockServer::start().await;
	Mock::given(method("POST")).respond_with(accepted("tok")).expect(1).mount(&server).await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	let title = "é".repeat(40);
	let body = "x".repeat(200);
	send_notification(&app, Fid(1), &title, &body, Some(&cred)).await;

	let requests = server.received_requests().await.unwrap();
	let sent: Value = requests[0].body_json().unwrap();
	assert_eq!(sent["title"].as_str().unwrap().chars().count(), MAX_TITLE_CHARS);
	assert_eq!(sent["body"].as_str().unwrap().chars().count(), MAX_BODY_CHARS);
}

#[tokio::test]
async fn test_rate_limited() {
	let server = MockServer::start().await;
	Mock::given(method("POST")).respond_with(rate_limited("tok")).mount(&server).await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	let outcome = send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	assert_eq!(outcome, DispatchOutcome::RateLimited);
}

#[tokio::test]
async fn test_invalid_token_is_still_success() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(
			ResponseTemplate::new(200).set_body_json(provider_response(&[], &["tok"], &[])),
		)
		.mount(&server)
		.await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	let outcome = send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	assert_eq!(outcome, DispatchOutcome::Success);
}

#[tokio::test]
async fn test_schema_mismatch_is_transport_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"result": { "successfulTokens": ["tok"] }
		})))
		.mount(&server)
		.await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	match send_notification(&app, Fid(1), "a", "b", Some(&cred)).await {
		DispatchOutcome::TransportError(detail) => assert!(detail.contains("invalidTokens")),
		other => panic!("unexpected outcome: {:?}", other),
	}
}

#[tokio::test]
async fn test_non_success_status_carries_body() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(503).set_body_string("provider down"))
		.mount(&server)
		.await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	let outcome = send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	assert_eq!(outcome, DispatchOutcome::TransportError("provider down".into()));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(accepted("tok").set_delay(Duration::from_secs(3)))
		.mount(&server)
		.await;
	let (app, _temp) = create_test_app().await;
	let cred = credential(&server.uri(), "tok");

	let outcome = send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	assert!(matches!(outcome, DispatchOutcome::TransportError(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
	let (app, _temp) = create_test_app().await;
	// Nothing listens on the discard port
	let cred = credential("http://127.0.0.1:9", "tok");

	let outcome = send_notification(&app, Fid(1), "a", "b", Some(&cred)).await;
	assert!(matches!(outcome, DispatchOutcome::TransportError(_)));
}

// vim: ts=4
