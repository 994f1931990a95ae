//! Login, identity, and refresh flows orchestrated by [`Authenticator`].

pub mod authorize;
pub mod callback;
pub mod common;
pub mod exchange;
pub mod identity;
pub mod refresh;

pub use authorize::*;
pub use callback::*;
pub use common::*;
pub use identity::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	provider::{ClientConfig, FleetStrategy, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Authenticator specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthenticator = Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Coordinates the Tesla Fleet login against a single immutable [`ClientConfig`].
///
/// The authenticator owns the HTTP client, error mapper, configuration, and strategy so
/// individual flows can focus on their own request/response shaping. It holds no
/// per-attempt state: sessions and identity caches are created per call, which keeps
/// concurrent logins isolated while the value itself is cheap to clone and share.
#[derive(Clone)]
pub struct Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Resolved client configuration, immutable once built.
	pub config: Arc<ClientConfig>,
	/// Strategy responsible for provider-specific token request adjustments.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an authenticator that reuses the caller-provided transport + mapper pair.
	///
	/// Uses [`FleetStrategy`]; swap it with [`Authenticator::with_strategy`].
	pub fn with_http_client(
		config: impl Into<Arc<ClientConfig>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: config.into(),
			strategy: Arc::new(FleetStrategy),
			refresh_metrics: Default::default(),
		}
	}

	/// Replaces the provider strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an authenticator with its own reqwest transport.
	///
	/// The transport applies [`ClientConfig::request_timeout`] to every request and never
	/// follows redirects.
	pub fn new(config: impl Into<Arc<ClientConfig>>) -> Result<Self> {
		let config = config.into();
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("config", &self.config)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
