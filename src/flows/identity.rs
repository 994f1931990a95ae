//! User-info lookup with per-attempt caching and graceful degradation.
//!
//! [`IdentityResolver::fetch_raw_info`] exposes every failure as an [`IdentityError`].
//! [`IdentityResolver::resolve`] is what the login uses: it fetches at most once, and any
//! failure becomes [`Identity::empty`] plus a warning, so a broken user-info endpoint never
//! blocks an otherwise successful login.

// crates.io
use async_lock::OnceCell;
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenSecret, TokenSet},
	error::IdentityError,
	flows::Authenticator,
	http::{ResponseMetadataSlot, TokenHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Resolves the identity behind one access token, caching the result for its lifetime.
///
/// Create one resolver per login attempt; it is not meant to be shared across attempts.
pub struct IdentityResolver<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
	user_info: Url,
	access_token: TokenSecret,
	identity: OnceCell<Identity>,
}
impl<C> IdentityResolver<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a resolver for `access_token` against the `user_info` endpoint.
	pub fn new(http_client: Arc<C>, user_info: Url, access_token: TokenSecret) -> Self {
		Self { http_client, user_info, access_token, identity: OnceCell::new() }
	}

	/// Performs the user-info request and parses the body; never cached.
	pub async fn fetch_raw_info(&self) -> Result<Value, IdentityError> {
		let request = Request::builder()
			.method(Method::GET)
			.uri(self.user_info.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", self.access_token.expose()))
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(IdentityError::transport)?;
		let handle = self.http_client.with_metadata(ResponseMetadataSlot::default());
		let response = handle.call(request).await.map_err(IdentityError::transport)?;
		let status = response.status();
		let body = response.body();

		if !status.is_success() {
			return Err(IdentityError::Status {
				status: status.as_u16(),
				body: Some(String::from_utf8_lossy(body).into_owned()),
			});
		}

		serde_json::from_slice(body).map_err(|source| IdentityError::Parse {
			source,
			body: Some(String::from_utf8_lossy(body).into_owned()),
		})
	}

	/// Returns the cached identity, fetching it on first access.
	///
	/// Failures are logged and yield an empty identity; they are cached too, so repeated
	/// calls within one attempt never hit the endpoint again.
	pub async fn resolve(&self) -> &Identity {
		self.identity
			.get_or_init(|| async {
				const KIND: FlowKind = FlowKind::Identity;

				let span = FlowSpan::new(KIND, "resolve_identity");

				obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

				let result = span.instrument(self.fetch_raw_info()).await;

				obs::record_result(KIND, &result);

				match result {
					Ok(raw_info) => Identity::from_raw_info(raw_info),
					Err(err) => {
						obs::warn_identity_degraded(&err);

						Identity::empty()
					},
				}
			})
			.await
	}

	/// Resolves (if needed) and returns the owned identity.
	pub async fn into_identity(self) -> Identity {
		self.resolve().await;

		self.identity.into_inner().unwrap_or_default()
	}
}
impl<C> Debug for IdentityResolver<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityResolver")
			.field("user_info", &self.user_info)
			.field("access_token", &self.access_token)
			.field("resolved", &self.identity.is_initialized())
			.finish()
	}
}

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a per-attempt resolver for the access token in `tokens`.
	pub fn identity_resolver(&self, tokens: &TokenSet) -> IdentityResolver<C> {
		IdentityResolver::new(
			self.http_client.clone(),
			self.config.endpoints.user_info.clone(),
			tokens.access_token.clone(),
		)
	}

	/// Fetches and normalizes the identity behind `tokens`; never fails.
	pub async fn fetch_identity(&self, tokens: &TokenSet) -> Identity {
		self.identity_resolver(tokens).into_identity().await
	}
}
