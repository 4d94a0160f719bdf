//! Client configuration, built in code or read from the environment.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, ScopeValidationError, TokenSecret},
	provider::{DiscordEndpoints, EndpointError},
};

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "DISCORD_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "DISCORD_CLIENT_SECRET";
/// Environment variable holding the registered redirect URI.
pub const ENV_REDIRECT_URI: &str = "DISCORD_REDIRECT_URI";
/// Optional environment variable holding space-delimited scopes (defaults to `identify`).
pub const ENV_SCOPES: &str = "DISCORD_SCOPES";

/// Errors raised while assembling an [`AuthorizationConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigBuildError {
	/// Client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Client secret was not supplied.
	#[error("Client secret is required.")]
	MissingClientSecret,
	/// Redirect URI was not supplied.
	#[error("Redirect URI is required.")]
	MissingRedirectUri,
	/// Redirect URI could not be parsed.
	#[error("Redirect URI is invalid: {value}.")]
	InvalidRedirectUri {
		/// Raw redirect URI value.
		value: String,
	},
	/// At least one scope must be requested.
	#[error("At least one scope must be requested.")]
	NoScopes,
	/// Scope list failed validation.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Endpoint set failed validation.
	#[error(transparent)]
	Endpoint(#[from] EndpointError),
	/// Required environment variable is missing or not valid unicode.
	#[error("Environment variable `{0}` is missing.")]
	MissingEnvVar(&'static str),
}

/// Immutable client configuration shared by every flow of one authorization client.
#[derive(Clone)]
pub struct AuthorizationConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret, sent in the request body.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested during authorization and the code exchange.
	pub scopes: ScopeSet,
	/// Endpoint set (Discord production by default).
	pub endpoints: DiscordEndpoints,
}
impl AuthorizationConfig {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> AuthorizationConfigBuilder {
		AuthorizationConfigBuilder::new(client_id)
	}

	/// Reads the configuration from `DISCORD_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigBuildError> {
		let var = |name: &'static str| env::var(name).map_err(|_| ConfigBuildError::MissingEnvVar(name));
		let redirect = var(ENV_REDIRECT_URI)?;
		let redirect_uri = Url::parse(&redirect)
			.map_err(|_| ConfigBuildError::InvalidRedirectUri { value: redirect })?;
		let scopes = match env::var(ENV_SCOPES) {
			Ok(raw) => ScopeSet::from_str(&raw)?,
			Err(_) => ScopeSet::identify(),
		};

		Self::builder(var(ENV_CLIENT_ID)?)
			.client_secret(var(ENV_CLIENT_SECRET)?)
			.redirect_uri(redirect_uri)
			.scopes(scopes)
			.build()
	}
}
impl Debug for AuthorizationConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("redirect_uri", &self.redirect_uri)
			.field("scopes", &self.scopes)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

/// Builder for [`AuthorizationConfig`] values.
#[derive(Debug)]
pub struct AuthorizationConfigBuilder {
	client_id: String,
	client_secret: Option<TokenSecret>,
	redirect_uri: Option<Url>,
	scopes: ScopeSet,
	endpoints: DiscordEndpoints,
}
impl AuthorizationConfigBuilder {
	/// Creates a builder seeded with the client identifier, `identify` scope, and
	/// production endpoints.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri: None,
			scopes: ScopeSet::identify(),
			endpoints: DiscordEndpoints::default(),
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the redirect URI registered with the provider.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the requested scopes.
	pub fn scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the endpoint set.
	pub fn endpoints(mut self, endpoints: DiscordEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<AuthorizationConfig, ConfigBuildError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigBuildError::MissingClientId);
		}

		let client_secret = self
			.client_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigBuildError::MissingClientSecret)?;
		let redirect_uri = self.redirect_uri.ok_or(ConfigBuildError::MissingRedirectUri)?;

		if self.scopes.is_empty() {
			return Err(ConfigBuildError::NoScopes);
		}

		self.endpoints.validate()?;

		Ok(AuthorizationConfig {
			client_id: self.client_id,
			client_secret,
			redirect_uri,
			scopes: self.scopes,
			endpoints: self.endpoints,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn redirect() -> Url {
		Url::parse("https://app.example.com/callback").expect("Failed to parse redirect fixture.")
	}

	#[test]
	fn builder_applies_defaults() {
		let config = AuthorizationConfig::builder("client")
			.client_secret("secret")
			.redirect_uri(redirect())
			.build()
			.expect("Config builder should succeed.");

		assert_eq!(config.scopes, ScopeSet::identify());
		assert_eq!(config.endpoints, DiscordEndpoints::default());
		assert!(!format!("{config:?}").contains("\"secret\""), "Debug output must redact the secret.");
	}

	#[test]
	fn builder_rejects_missing_fields() {
		let err = AuthorizationConfig::builder(" ")
			.client_secret("secret")
			.redirect_uri(redirect())
			.build()
			.expect_err("Blank client ids must be rejected.");

		assert_eq!(err, ConfigBuildError::MissingClientId);

		let err = AuthorizationConfig::builder("client")
			.redirect_uri(redirect())
			.build()
			.expect_err("Missing secrets must be rejected.");

		assert_eq!(err, ConfigBuildError::MissingClientSecret);

		let err = AuthorizationConfig::builder("client")
			.client_secret("secret")
			.build()
			.expect_err("Missing redirect URIs must be rejected.");

		assert_eq!(err, ConfigBuildError::MissingRedirectUri);

		let err = AuthorizationConfig::builder("client")
			.client_secret("secret")
			.redirect_uri(redirect())
			.scopes(ScopeSet::default())
			.build()
			.expect_err("Empty scope sets must be rejected.");

		assert_eq!(err, ConfigBuildError::NoScopes);
	}

	#[test]
	fn builder_validates_endpoints() {
		let mut endpoints = DiscordEndpoints::default();

		endpoints.token = Url::parse("http://discord.example.com/token").expect("Fixture should parse.");

		let err = AuthorizationConfig::builder("client")
			.client_secret("secret")
			.redirect_uri(redirect())
			.endpoints(endpoints)
			.build()
			.expect_err("Insecure token endpoints must be rejected.");

		assert!(matches!(
			err,
			ConfigBuildError::Endpoint(EndpointError::InsecureEndpoint { endpoint: "token", .. })
		));
	}
}
