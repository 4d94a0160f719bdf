//! Token-scoped reads against the Discord API.

pub mod model;

pub use model::*;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{GuildId, Token, TokenSecret},
	error::ResourceError,
	http::TokenHttpClient,
	oauth::AuthorizationClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Wraps one [`Token`] and performs authenticated reads with it.
///
/// After [`revoke_access`](Self::revoke_access) every read fails with
/// [`ResourceError::Revoked`] without touching the network.
pub struct ResourceAccessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	token: Token,
	client: Arc<AuthorizationClient<C>>,
	revoked: AtomicBool,
}
impl<C> ResourceAccessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Binds `token` to the client that issued it.
	pub fn new(token: Token, client: Arc<AuthorizationClient<C>>) -> Self {
		Self { token, client, revoked: AtomicBool::new(false) }
	}

	/// Token held by this accessor.
	pub fn token(&self) -> &Token {
		&self.token
	}

	/// Access token secret held by this accessor.
	pub fn access_token(&self) -> &TokenSecret {
		self.token.access_token()
	}

	/// Returns `true` once [`revoke_access`](Self::revoke_access) has run.
	pub fn is_revoked(&self) -> bool {
		self.revoked.load(Ordering::Acquire)
	}

	/// Fetches the authenticated user (`GET users/@me`).
	pub async fn current_user(&self) -> Result<User, ResourceError> {
		let url = self.client.config().endpoints.current_user();

		self.read("current_user", url).await
	}

	/// Fetches the user's membership in `guild` (`GET users/@me/guilds/{guild.id}/member`).
	///
	/// Malformed guild ids are not rejected locally; the provider answers with an HTTP status
	/// failure instead.
	pub async fn guild_membership(&self, guild: &GuildId) -> Result<GuildMember, ResourceError> {
		let url = self.client.config().endpoints.guild_membership(guild);

		self.read("guild_membership", url).await
	}

	/// Revokes the token with the provider and marks this accessor revoked.
	///
	/// Never fails: revocation is best-effort cleanup, see [`AuthorizationClient::revoke`].
	/// Calling it twice is harmless but sends a second, pointless request.
	pub async fn revoke_access(&self) {
		self.revoked.store(true, Ordering::Release);
		self.client.revoke(&self.token).await;
	}

	async fn read<T>(&self, stage: &'static str, url: Url) -> Result<T, ResourceError>
	where
		T: serde::de::DeserializeOwned,
	{
		const KIND: FlowKind = FlowKind::Resource;

		if self.is_revoked() {
			return Err(ResourceError::Revoked);
		}

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			span.instrument(self.client.transport().get(self.token.access_token(), url)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
impl<C> Debug for ResourceAccessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResourceAccessor")
			.field("token", &self.token)
			.field("revoked", &self.is_revoked())
			.finish()
	}
}
