//! Shared helpers for flow implementations (query encoding, token request assembly).

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	provider::{ClientConfig, GrantType, ProviderStrategy},
};

/// Form keys the `oauth2` client writes itself; strategies cannot override them.
const STANDARD_TOKEN_KEYS: [&str; 6] =
	["grant_type", "code", "redirect_uri", "client_id", "client_secret", "refresh_token"];

/// Percent-encodes one query component, writing spaces as `%20`.
///
/// `application/x-www-form-urlencoded` serializers emit `+` for spaces, which the Tesla
/// authorization server rejects inside `scope`. A literal `+` is always emitted as `%2B`, so
/// rewriting the remaining `+` characters is lossless.
pub fn encode_component(value: &str) -> String {
	form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Encodes `key=value` pairs joined by `&`, with spaces written as `%20`.
pub fn encode_query_pairs<'a, I>(pairs: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut buf = String::new();

	for (key, value) in pairs {
		if !buf.is_empty() {
			buf.push('&');
		}

		buf.push_str(&encode_component(key));
		buf.push('=');
		buf.push_str(&encode_component(value));
	}

	buf
}

/// Assembles the form fields for a token request.
///
/// `base` carries the generic grant fields plus any caller overrides; the strategy then
/// layers provider-specific fields on top. The result is the complete provider-facing
/// parameter set minus client credentials.
pub fn build_token_request(
	config: &ClientConfig,
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	base: BTreeMap<String, String>,
) -> BTreeMap<String, String> {
	let mut form = base;

	form.insert("grant_type".into(), grant.as_str().into());
	strategy.augment_token_request(config, grant, &mut form);

	form
}

/// Extracts the fields the `oauth2` client does not write itself.
pub(crate) fn extra_token_params(form: BTreeMap<String, String>) -> Vec<(String, String)> {
	form.into_iter().filter(|(key, _)| !STANDARD_TOKEN_KEYS.contains(&key.as_str())).collect()
}
