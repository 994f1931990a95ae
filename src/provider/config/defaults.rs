// std
use std::sync::OnceLock;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Fleet API authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://auth.tesla.com/oauth2/v3/authorize";
/// Fleet API token endpoint (code exchange and refresh).
pub const TOKEN_URL: &str = "https://fleet-auth.prd.vn.cloud.tesla.com/oauth2/v3/token";
/// Fleet API user-info endpoint.
pub const USER_INFO_URL: &str = "https://fleet-api.prd.na.vn.cloud.tesla.com/api/1/users/me";
/// Provider site root.
pub const SITE_URL: &str = "https://auth.tesla.com";
/// Scope requested when neither the caller nor the settings supply one.
pub const DEFAULT_SCOPE: &str = "openid offline_access user_data";
/// Audience required by the Fleet token endpoint for the North America region.
pub const DEFAULT_AUDIENCE: &str = "https://fleet-api.prd.na.vn.cloud.tesla.com";
/// Callback path below the application's mount point.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/tesla/callback";
/// Default bound for each outbound request.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Environment variable consulted for the process-wide client identifier.
pub const ENV_CLIENT_ID: &str = "TESLA_CLIENT_ID";
/// Environment variable consulted for the process-wide client secret.
pub const ENV_CLIENT_SECRET: &str = "TESLA_CLIENT_SECRET";
/// Environment variable consulted for the process-wide audience.
pub const ENV_AUDIENCE: &str = "TESLA_AUDIENCE";

static GLOBAL_DEFAULTS: OnceLock<ClientDefaults> = OnceLock::new();

/// Fallback values used for anything a [`ClientConfigBuilder`] leaves unset.
///
/// URLs are kept as strings and validated when a configuration is built, so a bad default
/// surfaces as a [`ConfigError`] instead of a panic.
///
/// [`ClientConfigBuilder`]: crate::provider::ClientConfigBuilder
/// [`ConfigError`]: crate::error::ConfigError
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientDefaults {
	/// Process-wide client identifier.
	pub client_id: Option<String>,
	/// Process-wide client secret.
	pub client_secret: Option<TokenSecret>,
	/// Provider site root.
	pub site: String,
	/// Authorization endpoint.
	pub authorize_url: String,
	/// Token endpoint.
	pub token_url: String,
	/// User-info endpoint.
	pub user_info_url: String,
	/// Space-delimited default scope.
	pub scope: String,
	/// Token exchange audience.
	pub audience: String,
	/// Callback path.
	pub callback_path: String,
	/// Outbound request timeout.
	pub request_timeout: StdDuration,
}
impl ClientDefaults {
	/// Built-in Fleet API values without client credentials.
	pub fn builtin() -> Self {
		Self {
			client_id: None,
			client_secret: None,
			site: SITE_URL.into(),
			authorize_url: AUTHORIZE_URL.into(),
			token_url: TOKEN_URL.into(),
			user_info_url: USER_INFO_URL.into(),
			scope: DEFAULT_SCOPE.into(),
			audience: DEFAULT_AUDIENCE.into(),
			callback_path: DEFAULT_CALLBACK_PATH.into(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		}
	}

	/// Built-in values overlaid with the `TESLA_*` environment variables.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Built-in values overlaid with whatever `lookup` returns for the `TESLA_*` keys.
	///
	/// Empty values are ignored.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
		let mut defaults = Self::builtin();

		defaults.client_id = read(ENV_CLIENT_ID);
		defaults.client_secret = read(ENV_CLIENT_SECRET).map(TokenSecret::new);

		if let Some(audience) = read(ENV_AUDIENCE) {
			defaults.audience = audience;
		}

		defaults
	}

	/// Process-wide defaults, resolved from the environment on first access and immutable
	/// afterwards.
	pub fn global() -> &'static Self {
		GLOBAL_DEFAULTS.get_or_init(Self::from_env)
	}
}
impl Default for ClientDefaults {
	fn default() -> Self {
		Self::builtin()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn lookup_overlays_credentials_and_audience() {
		let defaults = ClientDefaults::from_lookup(|key| match key {
			ENV_CLIENT_ID => Some("env-client".into()),
			ENV_CLIENT_SECRET => Some("env-secret".into()),
			ENV_AUDIENCE => Some("   ".into()),
			_ => None,
		});

		assert_eq!(defaults.client_id.as_deref(), Some("env-client"));
		assert_eq!(defaults.client_secret.as_ref().map(TokenSecret::expose), Some("env-secret"));
		assert_eq!(defaults.audience, DEFAULT_AUDIENCE, "Blank values must be ignored.");
		assert_eq!(defaults.token_url, TOKEN_URL);
	}

	#[test]
	fn global_defaults_resolve_once() {
		let first = ClientDefaults::global();
		let second = ClientDefaults::global();

		assert!(std::ptr::eq(first, second));
		assert_eq!(first.authorize_url, AUTHORIZE_URL);
	}
}
