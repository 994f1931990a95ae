//! Internal OAuth client facade built on the `oauth2` crate.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AccessToken, AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError,
	Scope, StandardRevocableToken, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
	helpers,
};
// self
use crate::{
	_prelude::*,
	auth::TokenSet,
	error::{ConfigError, RefreshError, TokenEndpointError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientConfig, GrantType, ProviderErrorContext, ProviderStrategy},
};

type ConfiguredClient = Client<
	BasicErrorResponse,
	FleetTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FacadeError>> + 'a + Send>>;

/// Maps HTTP transport failures into token endpoint errors.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a token endpoint error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> TokenEndpointError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> TokenEndpointError {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(grant, meta, *inner),
			HttpClientError::Http(inner) => TransportError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

/// Successful token endpoint payload.
///
/// Only `access_token` is required. The Fleet token endpoint is not strict about
/// `token_type`, so a missing value is read as `Bearer`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FleetTokenResponse {
	access_token: AccessToken,
	#[serde(
		default = "bearer_token_type",
		deserialize_with = "helpers::deserialize_untagged_enum_case_insensitive"
	)]
	token_type: BasicTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
	#[serde(
		rename = "scope",
		default,
		deserialize_with = "helpers::deserialize_space_delimited_vec",
		serialize_with = "helpers::serialize_space_delimited_vec",
		skip_serializing_if = "Option::is_none"
	)]
	scopes: Option<Vec<Scope>>,
}
impl TokenResponse for FleetTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<StdDuration> {
		self.expires_in.map(StdDuration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		self.scopes.as_ref()
	}
}

fn bearer_token_type() -> BasicTokenType {
	BasicTokenType::Bearer
}

/// Failure of a facade call: either local configuration or the token endpoint itself.
#[derive(Debug)]
pub(crate) enum FacadeError {
	Config(ConfigError),
	Endpoint(TokenEndpointError),
}
impl From<ConfigError> for FacadeError {
	fn from(e: ConfigError) -> Self {
		Self::Config(e)
	}
}
impl From<TokenEndpointError> for FacadeError {
	fn from(e: TokenEndpointError) -> Self {
		Self::Endpoint(e)
	}
}
impl From<FacadeError> for Error {
	fn from(e: FacadeError) -> Self {
		match e {
			FacadeError::Config(e) => e.into(),
			FacadeError::Endpoint(e) => e.into(),
		}
	}
}
impl From<FacadeError> for RefreshError {
	fn from(e: FacadeError) -> Self {
		match e {
			FacadeError::Config(e) => e.into(),
			FacadeError::Endpoint(e) => e.into(),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect Url,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenSet>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a,
		'params: 'a;

	fn refresh_token<'a, 'strategy, 'refresh, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenSet>
	where
		'strategy: 'a,
		'refresh: 'a,
		'params: 'a;
}

/// `oauth2`-backed facade that sends client credentials in the form body.
pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds a facade from configuration alone; fails fast on missing credentials.
	pub(crate) fn from_config(
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self, ConfigError> {
		let credentials = config.credentials()?;
		let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let oauth_client: ConfiguredClient =
			Client::new(ClientId::new(credentials.client_id.to_owned()))
				.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
				.set_auth_uri(auth_url)
				.set_token_uri(token_url)
				.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client: http_client.into(), error_mapper: error_mapper.into() })
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect Url,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenSet>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a,
		'params: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;
			let mut request = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url));

			for (key, value) in extra_params {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			Ok(map_token_response(response, None)?)
		})
	}

	fn refresh_token<'a, 'strategy, 'refresh, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenSet>
	where
		'strategy: 'a,
		'refresh: 'a,
		'params: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			for (key, value) in extra_params {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			// Providers may omit a rotated refresh token; the stored one stays valid then.
			Ok(map_token_response(response, Some(refresh_token))?)
		})
	}
}

fn map_token_response(
	response: FleetTokenResponse,
	previous_refresh: Option<&str>,
) -> Result<TokenSet, TokenEndpointError> {
	let issued_at = OffsetDateTime::now_utc();
	let mut builder =
		TokenSet::builder().access_token(response.access_token().secret().to_owned()).issued_at(issued_at);

	if let Some(expires_in) = response.expires_in() {
		let secs = i64::try_from(expires_in.as_secs()).map_err(|_| {
			TokenEndpointError::UnexpectedResponse {
				message: "expires_in exceeds the supported range".into(),
				status: Some(200),
				body: None,
				retry_after: None,
			}
		})?;

		builder = builder.expires_in(Duration::seconds(secs));
	}

	match (response.refresh_token(), previous_refresh) {
		(Some(refresh), _) => builder = builder.refresh_token(refresh.secret().to_owned()),
		(None, Some(previous)) => builder = builder.refresh_token(previous),
		(None, None) => {},
	}

	builder.build().map_err(|err| TokenEndpointError::UnexpectedResponse {
		message: err.to_string(),
		status: Some(200),
		body: None,
		retry_after: None,
	})
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> TokenEndpointError
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta_ref, error),
		RequestTokenError::Parse(error, body) => TokenEndpointError::MalformedResponse {
			source: error,
			status: meta_status(meta_ref),
			body: Some(String::from_utf8_lossy(&body).into_owned()),
		},
		RequestTokenError::Other(message) => TokenEndpointError::UnexpectedResponse {
			message,
			status: meta_status(meta_ref),
			body: meta_body(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		},
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> TokenEndpointError {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}
	if let Some(body) = meta_body(meta) {
		ctx = ctx.with_body_preview(body);
	}

	let kind = strategy.classify_token_error(&ctx);
	let reason = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_string(),
	};

	TokenEndpointError::Rejected {
		grant,
		kind,
		status: meta_status(meta),
		reason,
		body: meta_body(meta),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	grant: GrantType,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> TokenEndpointError {
	if err.is_timeout() {
		return TokenEndpointError::Timeout;
	}
	if err.is_body() || err.is_decode() {
		return TokenEndpointError::UnexpectedResponse {
			message: format!("{grant} response body could not be read: {err}"),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			body: None,
			retry_after: meta_retry_after(meta),
		};
	}

	TransportError::from(err).into()
}

fn map_generic_transport_error(
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> TokenEndpointError {
	TokenEndpointError::UnexpectedResponse {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
		body: meta_body(meta),
		retry_after: meta_retry_after(meta),
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

fn meta_body(meta: Option<&ResponseMetadata>) -> Option<String> {
	meta.and_then(|value| value.body.clone())
}
