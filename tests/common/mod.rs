//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::time::Duration;
// crates.io
use httpmock::MockServer;
// self
use tesla_oauth2::{
	flows::ReqwestAuthenticator,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{ClientConfig, ClientConfigBuilder, ClientDefaults},
	reqwest::Client as ReqwestClient,
	url::Url,
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const AUDIENCE: &str = "https://fleet-api.prd.na.vn.cloud.tesla.com";
pub const REDIRECT_URI: &str = "https://app.example.com/auth/tesla/callback";

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests and gives up after `timeout`.
pub fn test_reqwest_http_client(timeout: Duration) -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(tesla_oauth2::reqwest::redirect::Policy::none())
		.timeout(timeout)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn mock_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

/// Config builder pointing every endpoint at `server`.
pub fn test_config_builder(server: &MockServer) -> ClientConfigBuilder {
	ClientConfig::builder()
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.authorize_url(mock_url(server, "/oauth2/v3/authorize"))
		.token_url(mock_url(server, "/oauth2/v3/token"))
		.user_info_url(mock_url(server, "/api/1/users/me"))
		.audience(AUDIENCE)
}

pub fn test_config(server: &MockServer) -> ClientConfig {
	test_config_builder(server)
		.build_with_defaults(&ClientDefaults::builtin())
		.expect("Test configuration should build.")
}

/// Authenticator backed by the insecure test transport, honoring the configured timeout.
pub fn build_test_authenticator(config: ClientConfig) -> ReqwestAuthenticator {
	let http_client = test_reqwest_http_client(config.request_timeout);

	ReqwestAuthenticator::with_http_client(config, http_client, ReqwestTransportErrorMapper)
}

pub fn redirect_uri() -> Url {
	Url::parse(REDIRECT_URI).expect("Redirect URI should parse successfully.")
}
