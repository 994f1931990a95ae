//! Client configuration consumed by every flow.
//!
//! A [`ClientConfig`] is resolved once from explicit settings layered over
//! [`ClientDefaults`] and stays immutable afterwards, so a single value can be shared by
//! concurrent login attempts without locking.

/// Builder API for resolving client configurations.
pub mod builder;
/// Built-in and process-wide default values.
pub mod defaults;

pub use builder::*;
pub use defaults::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
};

/// Endpoint set used by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEndpoints {
	/// Provider site root.
	pub site: Url,
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// User-info endpoint queried with the bearer token.
	pub user_info: Url,
}

/// Immutable client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// OAuth 2.0 client identifier; required once a provider call is made.
	pub client_id: Option<String>,
	/// OAuth 2.0 client secret; required once a token endpoint call is made.
	pub client_secret: Option<TokenSecret>,
	/// Provider endpoints, all absolute HTTPS URLs.
	pub endpoints: FleetEndpoints,
	/// Scope requested when the caller does not supply one.
	pub default_scope: ScopeSet,
	/// Audience sent with the authorization code exchange.
	pub audience: String,
	/// Path (below the host's script name) the provider redirects back to.
	pub callback_path: String,
	/// Upper bound applied to every outbound request.
	pub request_timeout: StdDuration,
}
impl ClientConfig {
	/// Creates a new builder with no explicit values.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Returns the client identifier or fails fast when it is not configured.
	pub fn require_client_id(&self) -> Result<&str, ConfigError> {
		self.client_id.as_deref().filter(|id| !id.is_empty()).ok_or(ConfigError::MissingClientId)
	}

	/// Returns the client id/secret pair or fails fast when either is missing.
	pub fn credentials(&self) -> Result<ClientCredentials<'_>, ConfigError> {
		let client_id = self.require_client_id()?;
		let client_secret = self
			.client_secret
			.as_ref()
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingClientSecret)?;

		Ok(ClientCredentials { client_id, client_secret })
	}

	/// Reconstructs the external callback URL as `full_host + script_name + callback_path`.
	///
	/// `full_host` is the scheme, host, and port the user reached the application on
	/// (e.g. `https://app.example.com`); `script_name` is the mount prefix of the
	/// application, empty when mounted at the root.
	pub fn callback_url(&self, full_host: &str, script_name: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}{}{}",
			full_host.trim_end_matches('/'),
			script_name.trim_end_matches('/'),
			self.callback_path
		);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidRedirect { source })
	}
}

/// Borrowed client credentials validated by [`ClientConfig::credentials`].
#[derive(Clone, Copy)]
pub struct ClientCredentials<'a> {
	/// OAuth 2.0 client identifier.
	pub client_id: &'a str,
	/// OAuth 2.0 client secret.
	pub client_secret: &'a TokenSecret,
}
impl Debug for ClientCredentials<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}
