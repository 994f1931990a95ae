//! Strategy-level error types shared across configuration, token, and identity flows.

// self
use crate::{
	_prelude::*,
	provider::{GrantType, ProviderErrorKind},
};

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced by the login (authorization + callback) APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; aborts the flow immediately.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization code could not be exchanged for tokens.
	#[error("Authentication failed: {0}")]
	TokenExchange(#[from] TokenEndpointError),

	/// Provider redirected back with an OAuth error instead of a code.
	#[error("Provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` query parameter.
		error: String,
		/// OAuth `error_description` query parameter, when supplied.
		description: Option<String>,
	},
	/// Returned `state` does not match the one issued with the authorization request.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Callback did not carry an authorization code.
	#[error("Callback is missing the authorization code.")]
	MissingCode,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An endpoint URL cannot be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must be absolute HTTPS URLs.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},

	/// Client identifier is required before contacting the provider.
	#[error("Client identifier is not configured.")]
	MissingClientId,
	/// Client secret is required before contacting the token endpoint.
	#[error("Client secret is not configured.")]
	MissingClientSecret,
	/// Scope string cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Outbound request timeout must be positive.
	#[error("Request timeout must be greater than zero.")]
	NonPositiveTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures produced while talking to the token endpoint (code exchange or refresh).
///
/// None of these are retried internally: authorization codes are single-use and refresh
/// tokens may be revoked, so callers decide what to do next.
#[derive(Debug, ThisError)]
pub enum TokenEndpointError {
	/// Provider answered with an OAuth error payload.
	#[error("Token endpoint rejected the {grant} grant: {reason}.")]
	Rejected {
		/// Grant that was rejected.
		grant: GrantType,
		/// Classification chosen by the provider strategy.
		kind: ProviderErrorKind,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Provider-supplied reason string.
		reason: String,
		/// Raw provider response body, when captured.
		body: Option<String>,
	},
	/// Token endpoint responded with JSON that does not describe a token.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Raw provider response body.
		body: Option<String>,
	},
	/// Provider returned something that is neither a token nor an OAuth error.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Raw provider response body, when captured.
		body: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The outbound request exceeded the configured timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout,
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl TokenEndpointError {
	/// HTTP status code returned by the provider, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::MalformedResponse { status, .. }
			| Self::UnexpectedResponse { status, .. } => *status,
			Self::Timeout | Self::Transport(_) => None,
		}
	}

	/// Raw provider body attached to the failure, when available.
	pub fn provider_body(&self) -> Option<&str> {
		match self {
			Self::Rejected { body, .. }
			| Self::MalformedResponse { body, .. }
			| Self::UnexpectedResponse { body, .. } => body.as_deref(),
			Self::Timeout | Self::Transport(_) => None,
		}
	}

	/// Returns `true` when the provider rejected the grant or client outright.
	///
	/// Terminal failures (used code, revoked refresh token, bad client credentials) require a
	/// new authorization instead of another attempt.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			Self::Rejected {
				kind: ProviderErrorKind::InvalidGrant | ProviderErrorKind::InvalidClient,
				..
			}
		)
	}
}

/// Failure returned by the refresh helpers; never raised past the caller's loop.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Client configuration is incomplete.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint refused or failed the refresh grant.
	#[error("Refresh failed: {0}")]
	TokenEndpoint(#[from] TokenEndpointError),
}
impl RefreshError {
	/// Returns `true` when the stored refresh token can no longer be used.
	pub fn is_terminal(&self) -> bool {
		match self {
			Self::Config(_) => true,
			Self::TokenEndpoint(err) => err.is_terminal(),
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Outbound HTTP request could not be assembled.
	#[error("HTTP request could not be constructed.")]
	Request(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Identity (user-info) fetch failures.
///
/// These never reach login callers: the resolver degrades them into an empty identity and
/// reports them through tracing. [`IdentityResolver::fetch_raw_info`] exposes them for
/// callers that want the raw outcome.
///
/// [`IdentityResolver::fetch_raw_info`]: crate::flows::IdentityResolver::fetch_raw_info
#[derive(Debug, ThisError)]
pub enum IdentityError {
	/// Request could not be sent or the response could not be read.
	#[error("User-info request failed.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: BoxError,
	},
	/// Provider answered with a non-success status.
	#[error("User-info endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw provider response body.
		body: Option<String>,
	},
	/// Response body is not valid JSON.
	#[error("User-info endpoint returned malformed JSON.")]
	Parse {
		/// JSON decoding failure.
		#[source]
		source: serde_json::Error,
		/// Raw provider response body.
		body: Option<String>,
	},
}
impl IdentityError {
	/// Wraps a transport failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Raw provider body attached to the failure, when available.
	pub fn provider_body(&self) -> Option<&str> {
		match self {
			Self::Status { body, .. } | Self::Parse { body, .. } => body.as_deref(),
			Self::Transport { .. } => None,
		}
	}
}
