//! Interpretation of the provider's redirect back to the application.
//!
//! Fields are evaluated in a fixed order: the `state` check runs first and a mismatch wins
//! over everything else, then `error`, then `code`. Nothing about `error` or `code` is
//! inspected until `state` has been verified in constant time.

// self
use crate::{
	_prelude::*,
	auth::{RequestId, verify_state},
	http::TokenHttpClient,
	oauth::AuthorizationClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	resource::ResourceAccessor,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const ACCESS_DENIED: &str = "access_denied";

/// Raised when a callback carries neither `code` nor `error` (after a valid `state`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Callback carried neither an authorization code nor an error.")]
pub struct MalformedCallback;

/// Query parameters delivered to the redirect URI.
///
/// Deserializes directly from the callback query string with any serde-based extractor.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// Echoed `state` value.
	#[serde(default)]
	pub state: Option<String>,
	/// OAuth error code (`access_denied` when the user cancelled).
	#[serde(default)]
	pub error: Option<String>,
	/// Human-readable error description.
	#[serde(default)]
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from a full redirect URL.
	///
	/// The first occurrence of each parameter wins.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match &*key {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}

	fn code(&self) -> Option<&str> {
		self.code.as_deref().filter(|code| !code.is_empty())
	}

	fn error(&self) -> Option<&str> {
		self.error.as_deref().filter(|error| !error.is_empty())
	}
}
impl Debug for CallbackParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackParams")
			.field("code", &self.code.as_ref().map(|_| "<redacted>"))
			.field("state", &self.state.as_ref().map(|_| "<redacted>"))
			.field("error", &self.error)
			.field("error_description", &self.error_description)
			.finish()
	}
}

/// Terminal result of processing one callback.
pub enum CallbackOutcome<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// User declined the authorization request.
	Cancelled,
	/// Provider reported an error other than `access_denied`.
	ProviderError {
		/// OAuth `error` value.
		code: String,
		/// OAuth `error_description` value, when sent.
		description: Option<String>,
	},
	/// Returned `state` did not match the pending request identifier.
	///
	/// Treat as a possible CSRF attempt or a stale session; never retry.
	StateMismatch,
	/// Code exchange failed; the flow must be restarted.
	ExchangeFailed {
		/// Exchange failure.
		cause: Error,
	},
	/// Exchange succeeded.
	Success {
		/// Accessor bound to the issued token.
		resource: ResourceAccessor<C>,
	},
}
impl<C> CallbackOutcome<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Stable label used for metrics and logs.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Cancelled => "cancelled",
			Self::ProviderError { .. } => "provider_error",
			Self::StateMismatch => "state_mismatch",
			Self::ExchangeFailed { .. } => "exchange_failed",
			Self::Success { .. } => "success",
		}
	}

	/// Returns `true` for [`CallbackOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Consumes the outcome, returning the accessor on success.
	pub fn into_resource(self) -> Option<ResourceAccessor<C>> {
		match self {
			Self::Success { resource } => Some(resource),
			_ => None,
		}
	}
}
impl<C> Debug for CallbackOutcome<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Cancelled => f.write_str("Cancelled"),
			Self::ProviderError { code, description } => f
				.debug_struct("ProviderError")
				.field("code", code)
				.field("description", description)
				.finish(),
			Self::StateMismatch => f.write_str("StateMismatch"),
			Self::ExchangeFailed { cause } =>
				f.debug_struct("ExchangeFailed").field("cause", cause).finish(),
			Self::Success { resource } =>
				f.debug_struct("Success").field("resource", resource).finish(),
		}
	}
}

#[cfg(feature = "reqwest")]
/// Callback processor specialized for the crate's default reqwest transport.
pub type ReqwestCallbackProcessor = CallbackProcessor<ReqwestHttpClient>;

/// Drives one authorization attempt from redirect URL to [`CallbackOutcome`].
///
/// The processor holds no per-attempt state. Callers keep the [`RequestId`] used for the
/// redirect (typically in their session store) and pass it back to
/// [`process`](Self::process).
pub struct CallbackProcessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	client: Arc<AuthorizationClient<C>>,
}
impl<C> CallbackProcessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a shared authorization client.
	pub fn new(client: Arc<AuthorizationClient<C>>) -> Self {
		Self { client }
	}

	/// Shared authorization client.
	pub fn client(&self) -> &Arc<AuthorizationClient<C>> {
		&self.client
	}

	/// Redirect URL for a new attempt keyed by `state`.
	pub fn authorization_url(&self, state: &RequestId) -> Url {
		self.client.authorization_url(state)
	}

	/// Interprets a callback against the expected request identifier.
	///
	/// Returns [`MalformedCallback`] only when `state` matched and neither `code` nor `error`
	/// is present.
	pub async fn process(
		&self,
		params: &CallbackParams,
		expected: &str,
	) -> Result<CallbackOutcome<C>, MalformedCallback> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "process");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.interpret(params, expected)).await;

		match &result {
			Ok(outcome) => {
				obs::record_callback_outcome(outcome.label());
				obs::record_flow_outcome(
					KIND,
					if outcome.is_success() { FlowOutcome::Success } else { FlowOutcome::Failure },
				);
			},
			Err(_) => {
				obs::record_callback_outcome("malformed");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn interpret(
		&self,
		params: &CallbackParams,
		expected: &str,
	) -> Result<CallbackOutcome<C>, MalformedCallback> {
		if !verify_state(expected, params.state.as_deref()) {
			obs::state_mismatch_event(params.state.is_some());

			return Ok(CallbackOutcome::StateMismatch);
		}
		if let Some(error) = params.error() {
			if error == ACCESS_DENIED {
				return Ok(CallbackOutcome::Cancelled);
			}

			return Ok(CallbackOutcome::ProviderError {
				code: error.to_owned(),
				description: params.error_description.clone(),
			});
		}

		let code = params.code().ok_or(MalformedCallback)?;

		match self.client.exchange_code(code).await {
			Ok(token) => Ok(CallbackOutcome::Success {
				resource: ResourceAccessor::new(token, Arc::clone(&self.client)),
			}),
			Err(cause) => Ok(CallbackOutcome::ExchangeFailed { cause }),
		}
	}
}
impl<C> Clone for CallbackProcessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { client: Arc::clone(&self.client) }
	}
}
impl<C> Debug for CallbackProcessor<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CallbackProcessor").field("client", &self.client).finish()
	}
}
