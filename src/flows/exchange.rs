//! Authorization code exchange against the Fleet token endpoint.

// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	flows::{Authenticator, common},
	http::TokenHttpClient,
	oauth::{BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for tokens using the configured audience.
	///
	/// `redirect_uri` must be the exact URI sent with the authorization request. Codes are
	/// single-use, so failures are returned as-is and never retried; a second exchange of
	/// the same code is expected to fail with a terminal invalid-grant rejection.
	pub async fn exchange_code_for_token(&self, code: &str, redirect_uri: &Url) -> Result<TokenSet> {
		self.exchange_code(code, redirect_uri, None).await
	}

	/// Same as [`exchange_code_for_token`](Self::exchange_code_for_token) but sends
	/// `audience` instead of the configured value.
	pub async fn exchange_code_for_token_with_audience(
		&self,
		code: &str,
		redirect_uri: &Url,
		audience: &str,
	) -> Result<TokenSet> {
		self.exchange_code(code, redirect_uri, Some(audience)).await
	}

	async fn exchange_code(
		&self,
		code: &str,
		redirect_uri: &Url,
		audience: Option<&str>,
	) -> Result<TokenSet> {
		const KIND: FlowKind = FlowKind::CodeExchange;

		let span = FlowSpan::new(KIND, "exchange_code_for_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade = <BasicFacade<C, M>>::from_config(
					&self.config,
					self.http_client.clone(),
					self.transport_mapper.clone(),
				)?;
				let mut base = BTreeMap::new();

				if let Some(audience) = audience {
					base.insert("audience".to_owned(), audience.to_owned());
				}

				let form = common::build_token_request(
					&self.config,
					self.strategy.as_ref(),
					GrantType::AuthorizationCode,
					base,
				);
				let extra_params = common::extra_token_params(form);
				let tokens = facade
					.exchange_authorization_code(
						self.strategy.as_ref(),
						code,
						redirect_uri,
						&extra_params,
					)
					.await?;

				Ok(tokens)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
