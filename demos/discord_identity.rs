//! Interactive "Log in with Discord" walkthrough.
//!
//! Prints the authorize URL, waits for the redirect URL the browser landed on, then
//! resolves it to the Discord user. Optionally reads a guild membership before revoking
//! the token.
//!
//! Credentials come from `DISCORD_CLIENT_ID`, `DISCORD_CLIENT_SECRET`, and
//! `DISCORD_REDIRECT_URI` when set; otherwise the demo prompts for them.

// std
use std::{
	io::{self, Write},
	sync::Arc,
};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use discord_oauth2::{
	auth::{GuildId, RequestId, ScopeSet},
	flows::{CallbackOutcome, CallbackParams, CallbackProcessor},
	oauth::AuthorizationClient,
	provider::AuthorizationConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = match AuthorizationConfig::from_env() {
		Ok(config) => config,
		Err(_) => prompt_config()?,
	};
	let client = Arc::new(AuthorizationClient::new(config)?);
	let processor = CallbackProcessor::new(client);
	let state = RequestId::generate();

	println!("Authorize URL: {}", processor.authorization_url(&state));
	println!("After Discord redirects back, paste the full URL from the address bar.");

	let returned = Url::parse(&prompt_with_default("Redirect URL", None)?)?;
	let params = CallbackParams::from_url(&returned);
	let outcome = processor.process(&params, state.as_ref()).await?;

	let resource = match outcome {
		CallbackOutcome::Success { resource } => resource,
		CallbackOutcome::Cancelled => {
			println!("Authorization cancelled by the user.");

			return Ok(());
		},
		CallbackOutcome::StateMismatch => return Err(eyre!("State mismatch; refusing callback.")),
		CallbackOutcome::ProviderError { code, description } =>
			return Err(eyre!("Discord returned {code}: {}", description.unwrap_or_default())),
		CallbackOutcome::ExchangeFailed { cause } => return Err(cause.into()),
	};

	println!("Granted scopes: {}", resource.token().scope());

	match resource.current_user().await {
		Ok(user) => println!("Logged in as {} ({}).", user.display_name(), user.id),
		Err(e) => eprintln!("Failed to read the current user: {e}"),
	}

	if resource.token().scope().contains("guilds.members.read") {
		if let Some(guild) = prompt_optional("Guild id to inspect (leave blank to skip)")? {
			match resource.guild_membership(&GuildId::new(guild)?).await {
				Ok(member) => println!("Member roles: {:?}", member.roles),
				Err(e) => eprintln!("Failed to read the membership ({}): {e}", e.status_code()),
			}
		}
	}

	resource.revoke_access().await;

	println!("Token revoked.");

	Ok(())
}

fn prompt_config() -> Result<AuthorizationConfig> {
	let client_id = prompt_with_default("Discord client ID", None)?;
	let client_secret = prompt_with_default("Discord client secret", None)?;
	let redirect =
		prompt_with_default("Redirect URI", Some("http://localhost:3000/auth/discord/callback"))?;
	let scopes = prompt_with_default("Scopes", Some("identify"))?;

	Ok(AuthorizationConfig::builder(client_id)
		.client_secret(client_secret)
		.redirect_uri(Url::parse(&redirect)?)
		.scopes(scopes.parse::<ScopeSet>()?)
		.build()?)
}

fn prompt_with_default(message: &str, default: Option<&str>) -> Result<String> {
	loop {
		if let Some(value) = default {
			print!("{message} [{value}]: ");
		} else {
			print!("{message}: ");
		}

		io::stdout().flush()?;

		let mut input = String::new();

		io::stdin().read_line(&mut input)?;

		let trimmed = input.trim();

		if trimmed.is_empty() {
			if let Some(value) = default {
				return Ok(value.to_owned());
			}
		} else {
			return Ok(trimmed.to_owned());
		}
	}
}

fn prompt_optional(message: &str) -> Result<Option<String>> {
	print!("{message}: ");

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() { Ok(None) } else { Ok(Some(trimmed.to_owned())) }
}
