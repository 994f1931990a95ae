//! Normalized identity derived from the Fleet API `users/me` response, and the auth hash
//! handed back to hosts after a successful login.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::Credentials};

/// Identity extracted from the user-info payload.
///
/// Every field is optional: a missing `response` object, a missing key, or a non-string
/// value all yield `None` rather than an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable user identifier (`response.vault_uuid`).
	pub uid: Option<String>,
	/// Account email address.
	pub email: Option<String>,
	/// Display name (`response.full_name`).
	pub full_name: Option<String>,
	/// Avatar URL (`response.profile_image_url`).
	pub profile_image_url: Option<String>,
	/// Parsed user-info body as returned by the provider.
	pub raw_info: Value,
}
impl Identity {
	/// Identity with every field absent, used when the user-info call fails.
	pub fn empty() -> Self {
		Self {
			uid: None,
			email: None,
			full_name: None,
			profile_image_url: None,
			raw_info: Value::Object(Map::new()),
		}
	}

	/// Maps a parsed user-info body into an identity.
	pub fn from_raw_info(raw_info: Value) -> Self {
		let empty = Map::new();
		let response = raw_info.get("response").and_then(Value::as_object).unwrap_or(&empty);
		let field = |key: &str| response.get(key).and_then(Value::as_str).map(str::to_owned);

		Self {
			uid: field("vault_uuid"),
			email: field("email"),
			full_name: field("full_name"),
			profile_image_url: field("profile_image_url"),
			raw_info,
		}
	}

	/// Returns `true` when no identity field could be resolved.
	pub fn is_empty(&self) -> bool {
		self.uid.is_none()
			&& self.email.is_none()
			&& self.full_name.is_none()
			&& self.profile_image_url.is_none()
	}

	/// Profile block of the auth hash.
	pub fn info(&self) -> Info {
		Info {
			email: self.email.clone(),
			full_name: self.full_name.clone(),
			profile_image_url: self.profile_image_url.clone(),
		}
	}
}
impl Default for Identity {
	fn default() -> Self {
		Self::empty()
	}
}

/// Profile fields surfaced in the auth hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
	/// Account email address.
	pub email: Option<String>,
	/// Display name.
	pub full_name: Option<String>,
	/// Avatar URL.
	pub profile_image_url: Option<String>,
}

/// Provider-specific extras surfaced in the auth hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extra {
	/// Raw user-info payload.
	pub raw_info: Value,
}

/// Normalized login result: who the user is and which credentials were issued.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthHash {
	/// Provider name, always `tesla`.
	pub provider: String,
	/// Stable user identifier; `None` when the identity could not be resolved.
	pub uid: Option<String>,
	/// Profile fields.
	pub info: Info,
	/// Issued credentials.
	pub credentials: Credentials,
	/// Raw provider data.
	pub extra: Extra,
}
impl AuthHash {
	/// Assembles an auth hash from a resolved identity and the issued credentials.
	pub fn new(provider: impl Into<String>, identity: Identity, credentials: Credentials) -> Self {
		let info = identity.info();

		Self {
			provider: provider.into(),
			uid: identity.uid,
			info,
			credentials,
			extra: Extra { raw_info: identity.raw_info },
		}
	}
}
