//! Interactive Fleet API login: prints the authorize URL, reads the redirected callback URL
//! from stdin, then exchanges the code and shows the resulting identity.
//!
//! Set `TESLA_CLIENT_ID` and `TESLA_CLIENT_SECRET` (and optionally `TESLA_AUDIENCE`) first.

// std
use std::io::{self, BufRead, Write};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use tesla_oauth2::{
	flows::{AuthorizationOptions, CallbackParams, ReqwestAuthenticator},
	provider::ClientConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::builder().build()?;
	let redirect_uri = config.callback_url("http://localhost:3000", "")?;
	let authenticator = ReqwestAuthenticator::new(config)?;
	let options = AuthorizationOptions::default().with_param("prompt_missing_scopes", "true");
	let session = authenticator.start_authorization(&options, &redirect_uri)?;

	println!("Send your user to {}.", &session.authorize_url);
	print!("Paste the URL Tesla redirected to: ");
	io::stdout().flush()?;

	let mut line = String::new();

	io::stdin().lock().read_line(&mut line)?;

	let callback = Url::parse(line.trim())?;
	let params = CallbackParams::from_query(&callback);
	let hash = authenticator.callback(&session, &params).await?;

	println!("Signed in as {:?} ({:?}).", hash.uid, hash.info.email);

	let refresh_token = hash
		.credentials
		.refresh_token
		.as_ref()
		.ok_or_else(|| eyre!("Tesla did not issue a refresh token; request `offline_access`."))?;

	match authenticator.refresh(refresh_token.expose()).await {
		Ok(tokens) => println!("Refreshed; new token expires at {:?}.", tokens.expires_at),
		Err(e) => eprintln!("Refresh failed (terminal: {}): {e}.", e.is_terminal()),
	}

	Ok(())
}
