//! Authorization redirect construction and per-attempt login sessions.
//!
//! [`Authenticator::authorization_request`] is a pure function of the configuration and its
//! inputs; [`Authenticator::start_authorization`] adds a fresh CSRF state and packages the
//! result into an [`AuthorizationSession`] the host keeps until the callback arrives.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use subtle::ConstantTimeEq;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	flows::{Authenticator, common},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const STATE_LEN: usize = 32;
/// Query keys the builder always owns, whatever the caller passes in `extra_params`.
const RESERVED_KEYS: [&str; 5] = ["response_type", "client_id", "redirect_uri", "scope", "state"];

/// Caller-controlled inputs for an authorization redirect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationOptions {
	/// Space-delimited scope; blank or absent falls back to the configured default.
	pub scope: Option<String>,
	/// Additional query parameters such as `prompt` or `locale`.
	pub extra_params: BTreeMap<String, String>,
}
impl AuthorizationOptions {
	/// Requests a specific scope instead of the configured default.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Adds an extra query parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_params.insert(key.into(), value.into());

		self
	}
}

/// Query parameters of the authorization redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	/// Always `code`.
	pub response_type: String,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Callback the provider redirects to; must match the one used for the exchange.
	pub redirect_uri: Url,
	/// Requested scopes.
	pub scope: ScopeSet,
	/// Opaque CSRF state.
	pub state: String,
	/// Additional parameters, never containing a reserved key.
	pub extra_params: BTreeMap<String, String>,
}
impl AuthorizationRequest {
	/// Parameters in wire order: the standard set first, then extras sorted by key.
	pub fn pairs(&self) -> Vec<(&str, String)> {
		let mut pairs = vec![
			("response_type", self.response_type.clone()),
			("client_id", self.client_id.clone()),
			("redirect_uri", self.redirect_uri.to_string()),
		];

		if !self.scope.is_empty() {
			pairs.push(("scope", self.scope.normalized()));
		}

		pairs.push(("state", self.state.clone()));
		pairs.extend(self.extra_params.iter().map(|(key, value)| (key.as_str(), value.clone())));

		pairs
	}

	/// Encoded query string, spaces written as `%20`.
	pub fn query_string(&self) -> String {
		common::encode_query_pairs(self.pairs().iter().map(|(key, value)| (*key, value.as_str())))
	}

	/// Appends the encoded query to `endpoint`, preserving any query it already has.
	pub fn authorize_url(&self, endpoint: &Url) -> Url {
		let mut url = endpoint.clone();
		let query = match endpoint.query().filter(|existing| !existing.is_empty()) {
			Some(existing) => format!("{existing}&{}", self.query_string()),
			None => self.query_string(),
		};

		url.set_query(Some(&query));

		url
	}
}

/// Per-attempt login state handed to the host between redirect and callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSession {
	/// Parameters sent to the provider.
	pub request: AuthorizationRequest,
	/// Fully-formed HTTPS authorize URL that callers should send end-users to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// State value that must round-trip through the provider.
	pub fn state(&self) -> &str {
		&self.request.state
	}

	/// Redirect URI the code exchange has to repeat verbatim.
	pub fn redirect_uri(&self) -> &Url {
		&self.request.redirect_uri
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	///
	/// The comparison runs in constant time with respect to the expected value.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if bool::from(returned_state.as_bytes().ct_eq(self.request.state.as_bytes())) {
			Ok(())
		} else {
			Err(Error::StateMismatch)
		}
	}
}

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorization redirect parameters without any side effects.
	///
	/// `response_type`, `client_id`, `redirect_uri`, `scope`, and `state` are always set by
	/// this method; values for those keys in [`AuthorizationOptions::extra_params`] are
	/// dropped. Only a missing client identifier fails.
	pub fn authorization_request(
		&self,
		options: &AuthorizationOptions,
		redirect_uri: &Url,
		state: &str,
	) -> Result<AuthorizationRequest> {
		let client_id = self.config.require_client_id()?.to_owned();
		let scope = match options.scope.as_deref().filter(|scope| !scope.trim().is_empty()) {
			Some(scope) => ScopeSet::from_str(scope).map_err(ConfigError::from)?,
			None => self.config.default_scope.clone(),
		};
		let extra_params = options
			.extra_params
			.iter()
			.filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();

		Ok(AuthorizationRequest {
			response_type: "code".into(),
			client_id,
			redirect_uri: redirect_uri.clone(),
			scope,
			state: state.to_owned(),
			extra_params,
		})
	}

	/// Starts a login attempt with a freshly generated CSRF state.
	pub fn start_authorization(
		&self,
		options: &AuthorizationOptions,
		redirect_uri: &Url,
	) -> Result<AuthorizationSession> {
		const KIND: FlowKind = FlowKind::Authorization;

		let _guard = FlowSpan::new(KIND, "start_authorization").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.authorization_request(options, redirect_uri, &random_state()).map(
			|request| {
				let authorize_url = request.authorize_url(&self.config.endpoints.authorization);

				AuthorizationSession { request, authorize_url }
			},
		);

		obs::record_result(KIND, &result);

		result
	}
}

fn random_state() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}
