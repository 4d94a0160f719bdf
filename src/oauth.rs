//! Authorization-code client: authorize URL construction, code exchange, and revocation.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{RequestId, ScopeSet, Token, TokenSecret},
	error::{ConfigError, ResourceError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, TransportClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{AuthorizationConfig, ExchangeErrorKind, ProviderErrorContext},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

#[cfg(feature = "reqwest")]
/// Authorization client specialized for the crate's default reqwest transport.
pub type ReqwestAuthorizationClient = AuthorizationClient<ReqwestHttpClient>;

/// Performs the provider-facing half of the authorization-code grant.
///
/// The configuration is immutable for the lifetime of the client. Every method is safe to
/// call concurrently from independent flows.
pub struct AuthorizationClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: Arc<AuthorizationConfig>,
	transport: TransportClient<C>,
	oauth_client: ConfiguredBasicClient,
}
impl<C> AuthorizationClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		config: AuthorizationConfig,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let redirect_url = RedirectUrl::new(config.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "redirect", source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			config: Arc::new(config),
			transport: TransportClient::new(http_client),
			oauth_client,
		})
	}

	/// Immutable configuration shared by every flow.
	pub fn config(&self) -> &AuthorizationConfig {
		&self.config
	}

	/// Transport used for resource reads and revocation.
	pub fn transport(&self) -> &TransportClient<C> {
		&self.transport
	}

	/// Builds the URL the user agent is redirected to.
	///
	/// The query carries exactly `response_type=code`, `client_id`, `redirect_uri`, `scope`,
	/// and `state`. The result depends only on the configuration and `state`.
	///
	/// `state` is a [`RequestId`], so callers holding their own session identifiers must
	/// pass them through [`RequestId::new`] first; values with whitespace or more than 128
	/// characters are rejected there. The matching callback check takes the raw `&str`.
	pub fn authorization_url(&self, state: &RequestId) -> Url {
		let _guard = FlowSpan::new(FlowKind::Callback, "authorization_url").entered();
		let mut url = self.config.endpoints.authorization.clone();

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", self.config.redirect_uri.as_str())
			.append_pair("scope", &self.config.scopes.normalized())
			.append_pair("state", state);

		url
	}

	/// Exchanges an authorization code for a [`Token`].
	///
	/// The request body carries `grant_type=authorization_code`, `code`, `redirect_uri`,
	/// `scope`, `client_id`, and `client_secret`. No retries are performed.
	pub async fn exchange_code(&self, code: &str) -> Result<Token> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let meta = ResponseMetadataSlot::default();
				let instrumented = self.transport.http_client().with_metadata(meta.clone());
				let requested_scope = &self.config.scopes;
				let response = self
					.oauth_client
					.exchange_code(AuthorizationCode::new(code.to_owned()))
					.add_extra_param("scope", requested_scope.normalized())
					.request_async(&instrumented)
					.await
					.map_err(|err| map_request_error(meta.take(), err))?;

				map_token_response(requested_scope, response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Revokes the access token (and the refresh token, when present).
	///
	/// Best effort: this never reports failure. Unreachable endpoints, non-2xx answers, and
	/// transport errors are logged at debug level and otherwise discarded, so callers can use
	/// it as unconditional cleanup. Do not rely on it to confirm that a token is dead.
	pub async fn revoke(&self, token: &Token) {
		const KIND: FlowKind = FlowKind::Revoke;

		let span = FlowSpan::new(KIND, "revoke");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let clean = span
			.instrument(async move {
				let mut clean = true;

				for (hint, secret) in
					[("access_token", Some(token.access_token())), ("refresh_token", token.refresh_token())]
				{
					let Some(secret) = secret else {
						continue;
					};

					if let Err(e) = self.revoke_secret(hint, secret).await {
						obs::revoke_failure_event(hint, &e);

						clean = false;
					}
				}

				clean
			})
			.await;

		obs::record_flow_outcome(KIND, if clean { FlowOutcome::Success } else { FlowOutcome::Failure });
	}

	async fn revoke_secret(
		&self,
		token_type_hint: &'static str,
		secret: &TokenSecret,
	) -> Result<(), ResourceError> {
		let form = [
			("token", secret.expose()),
			("token_type_hint", token_type_hint),
			("client_id", self.config.client_id.as_str()),
			("client_secret", self.config.client_secret.expose()),
		];

		self.transport.post_form(self.config.endpoints.revocation.clone(), &form).await.map(|_| ())
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationClient<ReqwestHttpClient> {
	/// Creates a client backed by its own reqwest transport (10 s timeout, no redirects).
	pub fn new(config: AuthorizationConfig) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::new()?)
	}
}
impl<C> Debug for AuthorizationClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationClient").field("config", &self.config).finish()
	}
}

fn map_token_response(requested_scope: &ScopeSet, response: BasicTokenResponse) -> Result<Token> {
	let raw = serde_json::to_value(&response).map_err(|e| TransientError::TokenEndpoint {
		message: format!("Token response could not be captured: {e}"),
		status: None,
	})?;
	let granted_scope = response
		.scopes()
		.and_then(|scopes| ScopeSet::new(scopes.iter().map(|scope| scope.as_str())).ok())
		.filter(|scope| !scope.is_empty())
		.unwrap_or_else(|| requested_scope.clone());
	let mut builder = Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(canonical_token_type(response.token_type().as_ref()))
		.scope(granted_scope)
		.issued_at(OffsetDateTime::now_utc())
		.raw(raw);

	if let Some(expires_in) = response.expires_in() {
		let expires_in = Duration::try_from(expires_in)
			.map_err(|_| TransientError::TokenEndpoint {
				message: "Token endpoint returned an out-of-range expires_in".into(),
				status: None,
			})?;

		builder = builder.expires_in(expires_in);
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn canonical_token_type(value: &str) -> String {
	if value.eq_ignore_ascii_case("bearer") { "Bearer".into() } else { value.to_owned() }
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(error, body) => {
			let ctx = status_context(status).with_body_preview(String::from_utf8_lossy(&body));
			let message = match status {
				Some(status) => format!("Token endpoint returned a non-OAuth error body (HTTP {status})"),
				None => "Token endpoint returned a non-OAuth error body".into(),
			};

			classified_error(ctx.classify(), message, |_| {
				TransientError::TokenResponseParse { source: error, status }.into()
			})
		},
		RequestTokenError::Other(message) => {
			let ctx = status_context(status).with_body_preview(message.as_str());
			let message = format!("Token endpoint returned an unexpected response: {message}");

			classified_error(ctx.classify(), message, |message| {
				TransientError::TokenEndpoint { message, status }.into()
			})
		},
	}
}

fn status_context(status: Option<u16>) -> ProviderErrorContext {
	match status {
		Some(status) => ProviderErrorContext::default().with_http_status(status),
		None => ProviderErrorContext::default(),
	}
}

fn classified_error(
	kind: ExchangeErrorKind,
	message: String,
	transient: impl FnOnce(String) -> Error,
) -> Error {
	match kind {
		ExchangeErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ExchangeErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ExchangeErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ExchangeErrorKind::Transient => transient(message),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let mut ctx = status_context(status).with_oauth_error(response.error().as_ref());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}

	let message = match response.error_description() {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}"),
		None => format!("Token endpoint returned an OAuth error: {}", response.error().as_ref()),
	};

	classified_error(ctx.classify(), message, |message| {
		TransientError::TokenEndpoint { message, status }.into()
	})
}

fn map_transport_error<E>(err: HttpClientError<E>, status: Option<u16>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::Network { source: inner }.into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status,
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}
