#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use tesla_oauth2::{
	error::Error,
	flows::{AuthorizationOptions, CallbackParams, PROVIDER_NAME},
	url::Url,
};

const TOKEN_PATH: &str = "/oauth2/v3/token";
const USER_INFO_PATH: &str = "/api/1/users/me";

fn callback_url(code: &str, state: &str) -> Url {
	let mut url = redirect_uri();

	url.query_pairs_mut().append_pair("code", code).append_pair("state", state);

	url
}

#[tokio::test]
async fn login_round_trip_produces_auth_hash() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let session = authenticator
		.start_authorization(&AuthorizationOptions::default(), &redirect_uri())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("code", "NA_code-it")
				.form_urlencoded_tuple("audience", AUDIENCE)
				.form_urlencoded_tuple("redirect_uri", REDIRECT_URI);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-it\",\"refresh_token\":\"refresh-it\",\"token_type\":\"Bearer\",\"expires_in\":28800}",
			);
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_INFO_PATH).header("authorization", "Bearer access-it");
			then.status(200).header("content-type", "application/json").body(
				"{\"response\":{\"vault_uuid\":\"vault-1\",\"email\":\"driver@example.com\",\"full_name\":\"Model Driver\",\"profile_image_url\":\"https://example.com/a.png\"}}",
			);
		})
		.await;
	let params = CallbackParams::from_query(&callback_url("NA_code-it", session.state()));
	let hash = authenticator.callback(&session, &params).await.expect("Login should succeed.");

	token_mock.assert_calls_async(1).await;
	user_mock.assert_calls_async(1).await;

	assert_eq!(hash.provider, PROVIDER_NAME);
	assert_eq!(hash.uid.as_deref(), Some("vault-1"));
	assert_eq!(hash.info.email.as_deref(), Some("driver@example.com"));
	assert_eq!(hash.info.full_name.as_deref(), Some("Model Driver"));
	assert_eq!(hash.credentials.token.expose(), "access-it");
	assert_eq!(
		hash.credentials.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-it")
	);
	assert!(hash.credentials.expires);
	assert_eq!(hash.extra.raw_info["response"]["vault_uuid"], json!("vault-1"));
}

#[tokio::test]
async fn identity_failure_still_authenticates_with_empty_profile() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let session = authenticator
		.start_authorization(&AuthorizationOptions::default(), &redirect_uri())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-it\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_INFO_PATH);
			then.status(503).body("maintenance");
		})
		.await;
	let params = CallbackParams::from_query(&callback_url("code", session.state()));
	let hash = authenticator
		.callback(&session, &params)
		.await
		.expect("Identity failures must not abort the login.");

	token_mock.assert_async().await;
	user_mock.assert_async().await;

	assert_eq!(hash.uid, None);
	assert_eq!(hash.info.email, None);
	assert_eq!(hash.extra.raw_info, json!({}));
	assert_eq!(hash.credentials.token.expose(), "access-it");
	assert!(!hash.credentials.expires);
}

#[tokio::test]
async fn token_failure_terminates_login() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let session = authenticator
		.start_authorization(&AuthorizationOptions::default(), &redirect_uri())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(USER_INFO_PATH);
			then.status(200).body("{}");
		})
		.await;
	let params = CallbackParams::from_query(&callback_url("code", session.state()));
	let err = authenticator
		.callback(&session, &params)
		.await
		.expect_err("Token failures must abort the login.");

	assert!(matches!(err, Error::TokenExchange(_)));

	token_mock.assert_calls_async(1).await;
	user_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn invalid_callbacks_never_reach_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let session = authenticator
		.start_authorization(&AuthorizationOptions::default(), &redirect_uri())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let denied = CallbackParams::from_query_str(
		"error=access_denied&error_description=The%20user%20denied%20access",
	);
	let forged = CallbackParams::from_query(&callback_url("code", "forged-state"));
	let stateless = CallbackParams::from_pairs([("code", "code")]);
	let codeless = CallbackParams::from_pairs([("state", session.state())]);

	match authenticator.callback(&session, &denied).await {
		Err(Error::AuthorizationDenied { error, description }) => {
			assert_eq!(error, "access_denied");
			assert_eq!(description.as_deref(), Some("The user denied access"));
		},
		other => panic!("Expected an authorization denial, got {other:?}."),
	}

	assert!(matches!(
		authenticator.callback(&session, &forged).await,
		Err(Error::StateMismatch)
	));
	assert!(matches!(
		authenticator.callback(&session, &stateless).await,
		Err(Error::StateMismatch)
	));
	assert!(matches!(authenticator.callback(&session, &codeless).await, Err(Error::MissingCode)));

	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn callback_url_matches_configured_path() {
	let server = MockServer::start_async().await;
	let config = test_config(&server);
	let url = config
		.callback_url("https://app.example.com/", "/portal")
		.expect("Callback URL should build.");

	assert_eq!(url.as_str(), "https://app.example.com/portal/auth/tesla/callback");
}
