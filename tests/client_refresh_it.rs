#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use authgate::{
	client::{ApiRequest, AuthenticatedClient, ReqwestAuthenticatedClient},
	config::ClientConfig,
	error::{Error, RefreshError},
	nav::RecordingNavigator,
	store::{MemoryStore, TokenStore},
	token::{TokenKind, TokenPair, TokenSecret},
};

fn build_client(
	server: &MockServer,
	store: Arc<MemoryStore>,
) -> (ReqwestAuthenticatedClient, RecordingNavigator) {
	let config = ClientConfig::builder(
		Url::parse(&server.url("/api/v1")).expect("Mock base URL should parse successfully."),
	)
	.refresh_timeout(Some(Duration::from_secs(5)))
	.build()
	.expect("Client configuration should build successfully.");
	let navigator = RecordingNavigator::default();
	let client = AuthenticatedClient::new(config, store, Arc::new(navigator.clone()))
		.expect("Reqwest client should build successfully.");

	(client, navigator)
}

fn seeded(access: &str, refresh: &str) -> Arc<MemoryStore> {
	Arc::new(MemoryStore::with_pair(TokenPair::new(access, refresh)))
}

fn stored(store: &MemoryStore, kind: TokenKind) -> Option<String> {
	store.get(kind).map(|secret| secret.expose().to_owned())
}

#[tokio::test]
async fn concurrent_expired_requests_share_one_refresh() {
	let server = MockServer::start_async().await;
	let store = seeded("access-old", "refresh-1");
	let (client, navigator) = build_client(&server, store.clone());
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/auth/refresh")
				.json_body(json!({ "refresh_token": "refresh-1" }));
			then.status(200)
				.delay(Duration::from_millis(200))
				.json_body(json!({ "access_token": "access-new", "refresh_token": "refresh-2" }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/history").header("authorization", "Bearer access-old");
			then.status(401).json_body(json!({ "detail": "Token expired" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/history").header("authorization", "Bearer access-new");
			then.status(200).json_body(json!({ "items": [] }));
		})
		.await;
	let (first, second) = tokio::join!(
		client.get_json::<serde_json::Value>("history"),
		client.get_json::<serde_json::Value>("history"),
	);

	assert_eq!(first.expect("First request should recover."), json!({ "items": [] }));
	assert_eq!(second.expect("Second request should recover."), json!({ "items": [] }));

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;
	fresh.assert_calls_async(2).await;

	assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("access-new"));
	assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("refresh-2"));
	assert_eq!(navigator.count(), 0);
	assert_eq!(client.refresh_metrics().attempts(), 1);
}

#[tokio::test]
async fn rejected_refresh_ends_session_with_one_redirect() {
	let server = MockServer::start_async().await;
	let store = seeded("access-old", "refresh-revoked");
	let (client, navigator) = build_client(&server, store.clone());
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(401)
				.delay(Duration::from_millis(200))
				.json_body(json!({ "detail": "Invalid refresh token" }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/profile");
			then.status(401).json_body(json!({ "detail": "Token expired" }));
		})
		.await;
	let (first, second) = tokio::join!(
		client.execute(ApiRequest::get("profile")),
		client.execute(ApiRequest::get("profile")),
	);

	for outcome in [first, second] {
		match outcome {
			Err(Error::RefreshFailed(RefreshError::Rejected(envelope))) => {
				assert_eq!(envelope.http_status, 401);
				assert_eq!(envelope.message, "Invalid refresh token");
			},
			other => panic!("Unexpected outcome: {other:?}."),
		}
	}

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(2).await;

	assert!(store.is_empty());
	assert_eq!(navigator.history(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn missing_refresh_token_skips_refresh_call() {
	let server = MockServer::start_async().await;
	let store = Arc::new(MemoryStore::default());

	store
		.set(TokenKind::Access, TokenSecret::new("access-only"))
		.expect("Memory store writes should succeed.");

	let (client, navigator) = build_client(&server, store.clone());
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(json!({ "access_token": "never" }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/settings");
			then.status(401).json_body(json!({ "detail": "Token expired" }));
		})
		.await;
	let err = client
		.execute(ApiRequest::get("settings"))
		.await
		.expect_err("Requests without a refresh token cannot recover.");

	assert!(matches!(err, Error::RefreshFailed(RefreshError::MissingRefreshToken)));
	assert!(err.is_session_ended());

	refresh.assert_calls_async(0).await;
	expired.assert_calls_async(1).await;

	assert!(store.is_empty());
	assert_eq!(navigator.last().as_deref(), Some("/login"));
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
	let server = MockServer::start_async().await;
	let store = seeded("access-old", "refresh-1");
	let (client, navigator) = build_client(&server, store.clone());
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(json!({ "access_token": "access-new" }));
		})
		.await;
	let denied = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/detections/9");
			then.status(401).json_body(json!({
				"error": { "code": "TOKEN_REVOKED", "message": "Session revoked" }
			}));
		})
		.await;
	let err = client.delete("detections/9").await.expect_err("A second 401 must surface.");

	match &err {
		Error::Unauthorized(envelope) => {
			assert_eq!(envelope.code, "TOKEN_REVOKED");
			assert_eq!(envelope.message, "Session revoked");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	refresh.assert_calls_async(1).await;
	denied.assert_calls_async(2).await;

	assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("access-new"));
	assert_eq!(navigator.count(), 0);
}

#[tokio::test]
async fn server_errors_are_normalized_and_not_retried() {
	let server = MockServer::start_async().await;
	let (client, _) = build_client(&server, seeded("access", "refresh"));
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(json!({ "access_token": "never" }));
		})
		.await;
	let failing = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/detections")
				.header("authorization", "Bearer access")
				.json_body(json!({ "image_id": 3 }));
			then.status(422).json_body(json!({
				"detail": [{ "loc": ["body", "image_id"], "msg": "unknown image" }]
			}));
		})
		.await;
	let err = client
		.post_json::<_, serde_json::Value>("detections", &json!({ "image_id": 3 }))
		.await
		.expect_err("Validation failures should surface.");
	let envelope = err.envelope();

	assert!(matches!(err, Error::Server(_)));
	assert_eq!(envelope.code, "UNKNOWN_ERROR");
	assert_eq!(envelope.http_status, 422);
	assert_eq!(envelope.message, "Request failed with status code 422");
	assert!(envelope.details.is_some());

	failing.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}
