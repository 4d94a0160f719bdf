//! Discord endpoint set and resource URL construction.

// self
use crate::{_prelude::*, auth::GuildId};

const AUTHORIZATION_ENDPOINT: &str = "https://discord.com/oauth2/authorize";
const TOKEN_ENDPOINT: &str = "https://discord.com/api/oauth2/token";
const REVOCATION_ENDPOINT: &str = "https://discord.com/api/oauth2/token/revoke";
const API_BASE: &str = "https://discord.com/api/";

/// Errors raised while validating endpoint URLs.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum EndpointError {
	/// Endpoints must use HTTPS (plain HTTP is accepted for loopback hosts only).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The API base cannot carry path segments.
	#[error("The API base URL cannot be used as a base: {url}.")]
	InvalidApiBase {
		/// API base URL that failed validation.
		url: String,
	},
}

/// Endpoint set the client talks to.
///
/// [`Default`] yields Discord's production endpoints. Overrides exist so tests and
/// staging deployments can point the client at a mock server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
	/// Token revocation endpoint.
	pub revocation: Url,
	/// Base URL for resource reads (`users/@me`, ...).
	pub api_base: Url,
}
impl DiscordEndpoints {
	/// Builds an endpoint set rooted at `origin`, mirroring Discord's path layout.
	pub fn with_origin(origin: &Url) -> Result<Self, EndpointError> {
		let join = |path: &str| {
			origin.join(path).map_err(|_| EndpointError::InvalidApiBase { url: origin.to_string() })
		};
		let endpoints = Self {
			authorization: join("/oauth2/authorize")?,
			token: join("/api/oauth2/token")?,
			revocation: join("/api/oauth2/token/revoke")?,
			api_base: join("/api/")?,
		};

		endpoints.validate()?;

		Ok(endpoints)
	}

	/// Validates every endpoint.
	pub fn validate(&self) -> Result<(), EndpointError> {
		validate_endpoint("authorization", &self.authorization)?;
		validate_endpoint("token", &self.token)?;
		validate_endpoint("revocation", &self.revocation)?;
		validate_endpoint("api", &self.api_base)?;

		if self.api_base.cannot_be_a_base() {
			return Err(EndpointError::InvalidApiBase { url: self.api_base.to_string() });
		}

		Ok(())
	}

	/// Current-user resource URL.
	pub fn current_user(&self) -> Url {
		self.api_url(&["users", "@me"])
	}

	/// Current user's membership in `guild`.
	pub fn guild_membership(&self, guild: &GuildId) -> Url {
		self.api_url(&["users", "@me", "guilds", guild.as_ref(), "member"])
	}

	fn api_url(&self, segments: &[&str]) -> Url {
		let mut url = self.api_base.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}
}
impl Default for DiscordEndpoints {
	fn default() -> Self {
		Self {
			authorization: production_url(AUTHORIZATION_ENDPOINT),
			token: production_url(TOKEN_ENDPOINT),
			revocation: production_url(REVOCATION_ENDPOINT),
			api_base: production_url(API_BASE),
		}
	}
}

fn production_url(raw: &'static str) -> Url {
	Url::parse(raw).expect("Production endpoint constants are valid URLs.")
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), EndpointError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(EndpointError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}
