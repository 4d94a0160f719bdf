//! "Log in with Discord" convenience flow.
//!
//! Requests only the `identify` scope, resolves the callback to the user's record, and
//! revokes the token straight away so no credential outlives the login.

// self
use crate::{
	_prelude::*,
	auth::{RequestId, ScopeSet},
	error::ResourceError,
	flows::{CallbackOutcome, CallbackParams, CallbackProcessor, MalformedCallback},
	http::TokenHttpClient,
	oauth::AuthorizationClient,
	obs::{FlowKind, FlowSpan},
	provider::AuthorizationConfig,
	resource::User,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Flattened result of an identity login.
#[derive(Debug)]
pub enum IdentityOutcome {
	/// User authorized the application and their record was fetched.
	Authenticated(User),
	/// User declined the authorization request.
	Cancelled,
	/// Returned `state` did not match the pending request identifier.
	StateMismatch,
	/// Provider reported an error other than `access_denied`.
	ProviderError {
		/// OAuth `error` value.
		code: String,
		/// OAuth `error_description` value, when sent.
		description: Option<String>,
	},
	/// Code exchange failed.
	ExchangeFailed(Error),
	/// Exchange succeeded but the user read failed. The token was still revoked.
	ResourceFailed(ResourceError),
}
impl IdentityOutcome {
	/// Authenticated user, if any.
	pub fn user(&self) -> Option<&User> {
		match self {
			Self::Authenticated(user) => Some(user),
			_ => None,
		}
	}

	/// Returns `true` when the user cancelled.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	/// Consumes the outcome, returning the user or the typed failure.
	///
	/// Cancellation maps to `Ok(None)`.
	pub fn into_result(self) -> Result<Option<User>, IdentityError> {
		match self {
			Self::Authenticated(user) => Ok(Some(user)),
			Self::Cancelled => Ok(None),
			Self::StateMismatch => Err(IdentityError::StateMismatch),
			Self::ProviderError { code, description } =>
				Err(IdentityError::Provider { code, description }),
			Self::ExchangeFailed(e) => Err(IdentityError::Exchange(e)),
			Self::ResourceFailed(e) => Err(IdentityError::Resource(e)),
		}
	}
}

/// Failed identity login, as returned by [`IdentityOutcome::into_result`].
#[derive(Debug, ThisError)]
pub enum IdentityError {
	/// Returned `state` did not match the pending request identifier.
	#[error("Callback state did not match the pending request.")]
	StateMismatch,
	/// Provider reported an error other than `access_denied`.
	#[error("Provider reported {code}{}.", description.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
	Provider {
		/// OAuth `error` value.
		code: String,
		/// OAuth `error_description` value, when sent.
		description: Option<String>,
	},
	/// Code exchange failed.
	#[error(transparent)]
	Exchange(Error),
	/// User read failed after a successful exchange.
	#[error(transparent)]
	Resource(ResourceError),
}

#[cfg(feature = "reqwest")]
/// Identity login specialized for the crate's default reqwest transport.
pub type ReqwestIdentityLogin = IdentityLogin<ReqwestHttpClient>;

/// Identity-only login on top of [`CallbackProcessor`].
pub struct IdentityLogin<C>
where
	C: ?Sized + TokenHttpClient,
{
	processor: CallbackProcessor<C>,
}
impl<C> IdentityLogin<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Builds the flow with the caller's transport. The configured scopes are replaced by
	/// `identify`.
	pub fn with_http_client(
		mut config: AuthorizationConfig,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		config.scopes = ScopeSet::identify();

		let client = AuthorizationClient::with_http_client(config, http_client)?;

		Ok(Self { processor: CallbackProcessor::new(Arc::new(client)) })
	}

	/// Underlying callback processor.
	pub fn processor(&self) -> &CallbackProcessor<C> {
		&self.processor
	}

	/// Redirect URL for a new login keyed by `state`.
	pub fn authorization_url(&self, state: &RequestId) -> Url {
		self.processor.authorization_url(state)
	}

	/// Resolves a callback to the user's record.
	///
	/// On a successful exchange the user is fetched and the token is revoked whether or not
	/// the fetch succeeded.
	pub async fn resolve(
		&self,
		params: &CallbackParams,
		expected: &str,
	) -> Result<IdentityOutcome, MalformedCallback> {
		let span = FlowSpan::new(FlowKind::Callback, "identity_resolve");

		span.instrument(async move {
			let outcome = match self.processor.process(params, expected).await? {
				CallbackOutcome::Cancelled => IdentityOutcome::Cancelled,
				CallbackOutcome::StateMismatch => IdentityOutcome::StateMismatch,
				CallbackOutcome::ProviderError { code, description } =>
					IdentityOutcome::ProviderError { code, description },
				CallbackOutcome::ExchangeFailed { cause } => IdentityOutcome::ExchangeFailed(cause),
				CallbackOutcome::Success { resource } => {
					let user = resource.current_user().await;

					resource.revoke_access().await;

					match user {
						Ok(user) => IdentityOutcome::Authenticated(user),
						Err(e) => IdentityOutcome::ResourceFailed(e),
					}
				},
			};

			Ok::<_, MalformedCallback>(outcome)
		})
		.await
	}
}
#[cfg(feature = "reqwest")]
impl IdentityLogin<ReqwestHttpClient> {
	/// Builds the flow with its own reqwest transport.
	pub fn new(config: AuthorizationConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::new()?)
	}
}
impl<C> Debug for IdentityLogin<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityLogin").field("processor", &self.processor).finish()
	}
}
