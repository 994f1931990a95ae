//! Token sets produced by code exchanges and refreshes, plus their credential view.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Errors produced by [`TokenSetBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenSetBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the expiry falls outside the representable date range.
	#[error("Token expiry overflows the supported date range.")]
	ExpiryOutOfRange,
}

/// Tokens issued by the provider. Owned by the caller; nothing here persists them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant at which the token set was received.
	#[serde(with = "time::serde::timestamp")]
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from `expires_in`, when the provider returned one.
	#[serde(with = "time::serde::timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenSet {
	/// Returns a builder for token sets.
	pub fn builder() -> TokenSetBuilder {
		TokenSetBuilder::default()
	}

	/// Returns `true` when the provider supplied an expiry for the access token.
	pub fn is_expiring(&self) -> bool {
		self.expires_at.is_some()
	}

	/// Returns `true` if the access token has expired at the provided instant.
	///
	/// Tokens without an expiry never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the access token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Projects the token set into the credential block of an auth hash.
	pub fn credentials(&self) -> Credentials {
		Credentials {
			token: self.access_token.clone(),
			refresh_token: self.refresh_token.clone(),
			expires_at: self.expires_at.map(OffsetDateTime::unix_timestamp),
			expires: self.is_expiring(),
		}
	}
}
impl Debug for TokenSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSet")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenSet`].
#[derive(Clone, Debug, Default)]
pub struct TokenSetBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenSetBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the issued-at instant (defaults to the current clock).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`TokenSet`].
	pub fn build(self) -> Result<TokenSet, TokenSetBuilderError> {
		let access_token = self.access_token.ok_or(TokenSetBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) =>
				Some(issued_at.checked_add(delta).ok_or(TokenSetBuilderError::ExpiryOutOfRange)?),
			(None, None) => None,
		};

		Ok(TokenSet { access_token, refresh_token: self.refresh_token, issued_at, expires_at })
	}
}

/// Credential block of an auth hash (`token`, `refresh_token`, `expires_at`, `expires`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access token.
	pub token: TokenSecret,
	/// Refresh token, when issued.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Expiry as a Unix timestamp (seconds), when the token expires.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Whether the access token expires at all.
	pub expires: bool,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn builder_handles_relative_expiry() {
		let tokens = TokenSet::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(8))
			.build()
			.expect("Token set builder should support relative expiry calculations.");

		assert!(tokens.is_expiring());
		assert_eq!(tokens.expires_at, Some(macros::datetime!(2025-01-01 08:00 UTC)));
		assert!(!tokens.is_expired_at(macros::datetime!(2025-01-01 07:59 UTC)));
		assert!(tokens.is_expired_at(macros::datetime!(2025-01-01 08:00 UTC)));
	}

	#[test]
	fn tokens_without_expiry_never_expire() {
		let tokens = TokenSet::builder()
			.access_token("access")
			.build()
			.expect("Token set without expiry should build.");

		assert!(!tokens.is_expiring());
		assert!(!tokens.is_expired());
		assert_eq!(
			TokenSet::builder().build().expect_err("Access token must be required."),
			TokenSetBuilderError::MissingAccessToken
		);
	}

	#[test]
	fn oversized_relative_expiry_is_rejected() {
		let err = TokenSet::builder()
			.access_token("access")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::seconds(100_000_000_000_000))
			.build()
			.expect_err("An expiry past the supported range must fail.");

		assert_eq!(err, TokenSetBuilderError::ExpiryOutOfRange);
	}

	#[test]
	fn credentials_mirror_token_set() {
		let tokens = TokenSet::builder()
			.access_token("access")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::seconds(60))
			.build()
			.expect("Token set should build.");
		let credentials = tokens.credentials();

		assert_eq!(credentials.token.expose(), "access");
		assert_eq!(credentials.refresh_token, None);
		assert_eq!(credentials.expires_at, Some(1_735_689_660));
		assert!(credentials.expires);

		let json = serde_json::to_value(&credentials).expect("Credentials should serialize.");

		assert_eq!(
			json,
			serde_json::json!({ "token": "access", "expires_at": 1_735_689_660, "expires": true })
		);
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let tokens = TokenSet::builder()
			.access_token("very-secret")
			.refresh_token("also-secret")
			.build()
			.expect("Token set should build.");
		let rendered = format!("{tokens:?}");

		assert!(!rendered.contains("very-secret"));
		assert!(!rendered.contains("also-secret"));
	}
}
