#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use tesla_oauth2::{
	error::{ConfigError, Error, TokenEndpointError},
	provider::{ClientDefaults, GrantType, ProviderErrorKind},
};

const TOKEN_PATH: &str = "/oauth2/v3/token";

#[tokio::test]
async fn exchange_posts_audience_and_computes_expiry() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "NA_valid-code")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("audience", AUDIENCE)
				.form_urlencoded_tuple("redirect_uri", REDIRECT_URI);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-it\",\"refresh_token\":\"refresh-it\",\"token_type\":\"Bearer\",\"expires_in\":28800}",
			);
		})
		.await;
	let before = OffsetDateTime::now_utc();
	let tokens = authenticator
		.exchange_code_for_token("NA_valid-code", &redirect_uri())
		.await
		.expect("Authorization code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-it");
	assert_eq!(tokens.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-it"));
	assert!(tokens.is_expiring());

	let expires_at = tokens.expires_at.expect("Expiry should be derived from expires_in.");

	assert!(expires_at >= before + Duration::hours(8));
	assert!(expires_at <= OffsetDateTime::now_utc() + Duration::hours(8));
}

#[tokio::test]
async fn exchange_without_expires_in_is_not_expiring() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-it\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let tokens = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect("Exchange should succeed without expires_in.");

	mock.assert_async().await;

	assert!(!tokens.is_expiring());
	assert_eq!(tokens.expires_at, None);
	assert!(!tokens.is_expired());
	assert_eq!(tokens.refresh_token, None);
}

#[tokio::test]
async fn exchange_accepts_response_without_token_type() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-it\",\"expires_in\":3600}");
		})
		.await;
	let tokens = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect("A token response without token_type should be accepted.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-it");
	assert!(tokens.is_expiring());
}

#[tokio::test]
async fn exchange_accepts_any_success_status() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-created\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let tokens = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect("A 201 token response should be accepted.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-created");
}

#[tokio::test]
async fn oversized_expires_in_is_an_unexpected_response() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-it\",\"token_type\":\"Bearer\",\"expires_in\":100000000000000}",
			);
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect_err("An expiry past the supported range must fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::TokenExchange(TokenEndpointError::UnexpectedResponse { .. })));
}

#[tokio::test]
async fn slow_token_endpoint_times_out() {
	let server = MockServer::start_async().await;
	let config = test_config_builder(&server)
		.request_timeout(StdDuration::from_millis(200))
		.build_with_defaults(&ClientDefaults::builtin())
		.expect("Test configuration should build.");
	let authenticator = build_test_authenticator(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"late\",\"token_type\":\"Bearer\"}")
				.delay(StdDuration::from_secs(2));
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect_err("A response slower than the timeout must fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::TokenExchange(TokenEndpointError::Timeout)));
}

#[tokio::test]
async fn per_call_audience_overrides_configuration() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.form_urlencoded_tuple("audience", "https://fleet-api.prd.eu.vn.cloud.tesla.com");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-eu\",\"token_type\":\"Bearer\",\"expires_in\":60}");
		})
		.await;
	let tokens = authenticator
		.exchange_code_for_token_with_audience(
			"code",
			&redirect_uri(),
			"https://fleet-api.prd.eu.vn.cloud.tesla.com",
		)
		.await
		.expect("Exchange with an audience override should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "access-eu");
}

#[tokio::test]
async fn rejected_code_surfaces_raw_body_and_is_not_retried() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("used-code", &redirect_uri())
		.await
		.expect_err("A reused authorization code must fail.");

	mock.assert_calls_async(1).await;

	let Error::TokenExchange(inner) = &err else {
		panic!("Expected a token exchange error, got {err:?}.");
	};

	assert!(matches!(
		inner,
		TokenEndpointError::Rejected {
			grant: GrantType::AuthorizationCode,
			kind: ProviderErrorKind::InvalidGrant,
			status: Some(400),
			..
		}
	));
	assert!(inner.is_terminal());
	assert_eq!(
		inner.provider_body(),
		Some("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}")
	);
	assert!(err.to_string().starts_with("Authentication failed:"));
}

#[tokio::test]
async fn response_without_access_token_is_malformed() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect_err("A token response without access_token must fail.");

	mock.assert_async().await;

	match err {
		Error::TokenExchange(TokenEndpointError::MalformedResponse { body, .. }) => {
			assert_eq!(body.as_deref(), Some("{\"token_type\":\"Bearer\",\"expires_in\":3600}"));
		},
		other => panic!("Expected a malformed response error, got {other:?}."),
	}
}

#[tokio::test]
async fn non_json_server_error_keeps_provider_body() {
	let server = MockServer::start_async().await;
	let authenticator = build_test_authenticator(test_config(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(502).header("content-type", "text/html").body("<html>bad gateway</html>");
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect_err("A gateway error must fail the exchange.");

	mock.assert_calls_async(1).await;

	let Error::TokenExchange(inner) = err else {
		panic!("Expected a token exchange error.");
	};

	assert_eq!(inner.status(), Some(502));
	assert_eq!(inner.provider_body(), Some("<html>bad gateway</html>"));
	assert!(!inner.is_terminal());
}

#[tokio::test]
async fn missing_secret_aborts_before_contacting_provider() {
	let server = MockServer::start_async().await;
	let mut config = test_config(&server);

	config.client_secret = None;

	let authenticator = build_test_authenticator(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let err = authenticator
		.exchange_code_for_token("code", &redirect_uri())
		.await
		.expect_err("Missing secret must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingClientSecret)));

	mock.assert_calls_async(0).await;
}
