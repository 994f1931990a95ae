//! Callback phase: validates the provider redirect and assembles the [`AuthHash`].

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::AuthHash,
	flows::{Authenticator, AuthorizationSession},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
};

/// Provider name reported in every [`AuthHash`].
pub const PROVIDER_NAME: &str = "tesla";

/// Query parameters the provider appends to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Returned CSRF state.
	pub state: Option<String>,
	/// OAuth error code when the user or provider denied the request.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Reads the parameters from a full callback URL.
	pub fn from_query(url: &Url) -> Self {
		Self::from_pairs(url.query_pairs())
	}

	/// Reads the parameters from a raw query string (without the leading `?`).
	pub fn from_query_str(query: &str) -> Self {
		Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
	}

	/// Reads the parameters from decoded key/value pairs; the first occurrence of a key wins.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut params = Self::default();

		for (key, value) in pairs {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into());
			}
		}

		params
	}
}

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes a login attempt started with [`start_authorization`](Self::start_authorization).
	///
	/// Checks run in order: provider error, state, code. The code exchange must succeed;
	/// the identity lookup degrades to an empty profile instead of failing the login.
	pub async fn callback(
		&self,
		session: &AuthorizationSession,
		params: &CallbackParams,
	) -> Result<AuthHash> {
		if let Some(error) = &params.error {
			return Err(Error::AuthorizationDenied {
				error: error.clone(),
				description: params.error_description.clone(),
			});
		}

		session.validate_state(params.state.as_deref().ok_or(Error::StateMismatch)?)?;

		let code =
			params.code.as_deref().filter(|code| !code.is_empty()).ok_or(Error::MissingCode)?;
		let tokens = self.exchange_code_for_token(code, session.redirect_uri()).await?;
		let identity = self.fetch_identity(&tokens).await;

		Ok(AuthHash::new(PROVIDER_NAME, identity, tokens.credentials()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_callback_query() {
		let url = Url::parse(
			"https://app.example.com/auth/tesla/callback?code=NA_abc%2B1&state=xyz&locale=en-US",
		)
		.expect("Callback fixture should parse.");
		let params = CallbackParams::from_query(&url);

		assert_eq!(params.code.as_deref(), Some("NA_abc+1"));
		assert_eq!(params.state.as_deref(), Some("xyz"));
		assert_eq!(params.error, None);
	}

	#[test]
	fn parses_denied_callback_and_keeps_first_value() {
		let params = CallbackParams::from_query_str(
			"error=access_denied&error_description=User+cancelled&error=second",
		);

		assert_eq!(params.error.as_deref(), Some("access_denied"));
		assert_eq!(params.error_description.as_deref(), Some("User cancelled"));
		assert_eq!(params.code, None);
	}
}
