//! Refresh token grant for renewing stored credentials outside a login.
//!
//! Refreshes are single attempts: a revoked or expired refresh token is terminal, so the
//! error is handed back (and logged) for the caller to decide on re-authentication.
//! [`refresh_with`] needs nothing but a [`ClientConfig`], which suits background jobs that
//! renew tokens for many users without any live session.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	error::RefreshError,
	flows::{Authenticator, common},
	http::TokenHttpClient,
	oauth::{BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ClientConfig, GrantType},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges a stored refresh token for a new token set.
	///
	/// When the provider does not rotate the refresh token, the returned set keeps
	/// `refresh_token` so it can be stored again as-is.
	pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, RefreshError> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let facade = <BasicFacade<C, M>>::from_config(
					&self.config,
					self.http_client.clone(),
					self.transport_mapper.clone(),
				)?;
				let form = common::build_token_request(
					&self.config,
					self.strategy.as_ref(),
					GrantType::RefreshToken,
					BTreeMap::new(),
				);
				let extra_params = common::extra_token_params(form);
				let tokens = facade
					.refresh_token(self.strategy.as_ref(), refresh_token, &extra_params)
					.await?;

				Ok(tokens)
			})
			.await;

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(err) => {
				self.refresh_metrics.record_failure();
				obs::warn_refresh_failed(err);
			},
		}

		obs::record_result(KIND, &result);

		result
	}
}

/// Refreshes `refresh_token` with a one-off reqwest client built from `config` alone.
#[cfg(feature = "reqwest")]
pub async fn refresh_with(config: &ClientConfig, refresh_token: &str) -> Result<TokenSet, RefreshError> {
	let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;
	let authenticator = <Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper>>::with_http_client(
		config.clone(),
		http_client,
		ReqwestTransportErrorMapper,
	);

	authenticator.refresh(refresh_token).await
}
