// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	provider::{ClientConfig, ClientDefaults, FleetEndpoints},
};

/// Explicit per-instance settings, typically deserialized from the host's config file.
///
/// Every field is optional; anything left unset falls back to [`ClientDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
	/// OAuth 2.0 client identifier.
	pub client_id: Option<String>,
	/// OAuth 2.0 client secret.
	pub client_secret: Option<TokenSecret>,
	/// Provider site root.
	pub site: Option<Url>,
	/// Authorization endpoint.
	pub authorize_url: Option<Url>,
	/// Token endpoint.
	pub token_url: Option<Url>,
	/// User-info endpoint.
	pub user_info_url: Option<Url>,
	/// Space-delimited default scope.
	pub scope: Option<String>,
	/// Token exchange audience.
	pub audience: Option<String>,
	/// Callback path below the application's mount point.
	pub callback_path: Option<String>,
	/// Outbound request timeout in seconds.
	pub request_timeout_secs: Option<u64>,
}

/// Builder for [`ClientConfig`] values.
///
/// Explicit values always win over defaults; defaults are only consulted in
/// [`build`](Self::build) / [`build_with_defaults`](Self::build_with_defaults).
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
	settings: ClientSettings,
	request_timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Seeds a builder from deserialized settings.
	pub fn from_settings(settings: ClientSettings) -> Self {
		Self { settings, request_timeout: None }
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.settings.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.settings.client_secret = Some(TokenSecret::new(client_secret));

		self
	}

	/// Sets the provider site root.
	pub fn site(mut self, url: Url) -> Self {
		self.settings.site = Some(url);

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorize_url(mut self, url: Url) -> Self {
		self.settings.authorize_url = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.settings.token_url = Some(url);

		self
	}

	/// Sets the user-info endpoint.
	pub fn user_info_url(mut self, url: Url) -> Self {
		self.settings.user_info_url = Some(url);

		self
	}

	/// Sets the space-delimited default scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.settings.scope = Some(scope.into());

		self
	}

	/// Sets the token exchange audience.
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.settings.audience = Some(audience.into());

		self
	}

	/// Sets the callback path.
	pub fn callback_path(mut self, path: impl Into<String>) -> Self {
		self.settings.callback_path = Some(path.into());

		self
	}

	/// Sets the outbound request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Resolves the configuration against the process-wide [`ClientDefaults::global`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.build_with_defaults(ClientDefaults::global())
	}

	/// Resolves the configuration against the provided defaults and validates it.
	pub fn build_with_defaults(self, defaults: &ClientDefaults) -> Result<ClientConfig, ConfigError> {
		let ClientSettings {
			client_id,
			client_secret,
			site,
			authorize_url,
			token_url,
			user_info_url,
			scope,
			audience,
			callback_path,
			request_timeout_secs,
		} = self.settings;
		let endpoints = FleetEndpoints {
			site: resolve_endpoint("site", site, &defaults.site)?,
			authorization: resolve_endpoint("authorization", authorize_url, &defaults.authorize_url)?,
			token: resolve_endpoint("token", token_url, &defaults.token_url)?,
			user_info: resolve_endpoint("user_info", user_info_url, &defaults.user_info_url)?,
		};
		let default_scope = ScopeSet::from_str(scope.as_deref().unwrap_or(&defaults.scope))?;
		let request_timeout = self
			.request_timeout
			.or_else(|| request_timeout_secs.map(StdDuration::from_secs))
			.unwrap_or(defaults.request_timeout);

		if request_timeout.is_zero() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(ClientConfig {
			client_id: client_id.or_else(|| defaults.client_id.clone()),
			client_secret: client_secret.or_else(|| defaults.client_secret.clone()),
			endpoints,
			default_scope,
			audience: audience.unwrap_or_else(|| defaults.audience.clone()),
			callback_path: normalize_callback_path(
				callback_path.unwrap_or_else(|| defaults.callback_path.clone()),
			),
			request_timeout,
		})
	}
}

fn resolve_endpoint(
	name: &'static str,
	explicit: Option<Url>,
	fallback: &str,
) -> Result<Url, ConfigError> {
	let url = match explicit {
		Some(url) => url,
		None => Url::parse(fallback)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: name, source })?,
	};

	validate_endpoint(name, &url)?;

	Ok(url)
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" || url.cannot_be_a_base() {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn normalize_callback_path(path: String) -> String {
	if path.starts_with('/') { path } else { format!("/{path}") }
}
