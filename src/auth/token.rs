//! Access token issued by the authorization-code exchange, plus its builder.

pub mod secret;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
};

const SECRET_FIELDS: [&str; 2] = ["access_token", "refresh_token"];

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenBuildError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the provider returned a non-positive lifetime.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}

/// Token obtained from the provider's token endpoint.
///
/// Secrets stay wrapped in [`TokenSecret`]; [`Debug`] never prints them and the
/// [`raw`](Self::raw) payload is stored with the secret fields removed.
#[derive(Clone)]
pub struct Token {
	access_token: TokenSecret,
	refresh_token: Option<TokenSecret>,
	token_type: String,
	scope: ScopeSet,
	issued_at: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
	raw: Value,
}
impl Token {
	/// Returns a builder for assembling a token.
	pub fn builder() -> TokenBuilder {
		TokenBuilder::default()
	}

	/// Access token secret; callers must avoid logging or persisting it carelessly.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Refresh token secret, if the provider issued one.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref()
	}

	/// Token type reported by the provider (`Bearer` for Discord).
	pub fn token_type(&self) -> &str {
		&self.token_type
	}

	/// Scopes granted to this token.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Instant the token response was received.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Expiry instant derived from `expires_in`, when the provider reported one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Provider payload with `access_token`/`refresh_token` stripped.
	pub fn raw(&self) -> &Value {
		&self.raw
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Token`].
#[derive(Clone, Debug, Default)]
pub struct TokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	scope: ScopeSet,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	raw: Option<Value>,
}
impl TokenBuilder {
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

	/// Sets the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scope set.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Sets the issued-at instant (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the relative lifetime reported by the provider.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Attaches the provider payload; secret fields are removed on [`build`](Self::build).
	pub fn raw(mut self, raw: Value) -> Self {
		self.raw = Some(raw);

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuildError> {
		let access_token = self
			.access_token
			.filter(|secret| !secret.is_empty())
			.ok_or(TokenBuildError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match self.expires_in {
			Some(delta) if !delta.is_positive() => return Err(TokenBuildError::NonPositiveExpiresIn),
			Some(delta) => Some(issued_at + delta),
			None => None,
		};
		let mut raw = self.raw.unwrap_or_default();

		if let Some(object) = raw.as_object_mut() {
			for field in SECRET_FIELDS {
				object.remove(field);
			}
		}

		Ok(Token {
			access_token,
			refresh_token: self.refresh_token.filter(|secret| !secret.is_empty()),
			token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
			scope: self.scope,
			issued_at,
			expires_at,
			raw,
		})
	}
}
