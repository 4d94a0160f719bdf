#![cfg(feature = "reqwest")]

// std
use std::collections::{HashMap, VecDeque};
// self
use discord_oauth2::{
	_preludet::*,
	auth::{GuildId, Token},
	error::{ResourceError, TransientError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	oauth::{
		AuthorizationClient,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{HeaderValue, Method, StatusCode, header},
		},
	},
	provider::{AuthorizationConfig, DiscordEndpoints},
	resource::ResourceAccessor,
	url,
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-rec\",\"refresh_token\":\"refresh-rec\",\"token_type\":\"Bearer\",\"expires_in\":604800,\"scope\":\"identify\"}";

#[derive(Debug)]
enum FakeTransportError {
	Unreachable,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Unreachable => write!(f, "Host unreachable."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Debug)]
struct RecordedRequest {
	method: Method,
	uri: String,
	authorization: Option<String>,
	body: Vec<u8>,
}
impl From<&HttpRequest> for RecordedRequest {
	fn from(request: &HttpRequest) -> Self {
		Self {
			method: request.method().clone(),
			uri: request.uri().to_string(),
			authorization: request
				.headers()
				.get(header::AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.map(Into::into),
			body: request.body().clone(),
		}
	}
}

#[derive(Clone, Copy)]
enum Scripted {
	Respond(u16, &'static str),
	Fail,
}

/// Records every request and answers from a script; an exhausted script fails.
#[derive(Clone, Default)]
struct RecordingHttpClient {
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	script: Arc<Mutex<VecDeque<Scripted>>>,
	statuses: Arc<Mutex<Vec<Option<u16>>>>,
}
impl RecordingHttpClient {
	fn scripted(script: impl IntoIterator<Item = Scripted>) -> Self {
		let client = Self::default();

		client.script.lock().extend(script);

		client
	}

	fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}
}
impl TokenHttpClient for RecordingHttpClient {
	type Handle = RecordingHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		RecordingHandle { client: self.clone(), slot }
	}
}

struct RecordingHandle {
	client: RecordingHttpClient,
	slot: ResponseMetadataSlot,
}
impl<'a> AsyncHttpClient<'a> for RecordingHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let client = self.client.clone();
		let slot = self.slot.clone();

		Box::pin(async move {
			client.statuses.lock().push(slot.take().and_then(|meta| meta.status));
			client.requests.lock().push(RecordedRequest::from(&request));

			let next = client.script.lock().pop_front().unwrap_or(Scripted::Fail);

			match next {
				Scripted::Respond(status, body) => {
					slot.store(ResponseMetadata { status: Some(status) });

					let mut response = HttpResponse::new(body.as_bytes().to_vec());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");
					response
						.headers_mut()
						.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

					Ok(response)
				},
				Scripted::Fail =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Unreachable))),
			}
		})
	}
}

fn config() -> AuthorizationConfig {
	AuthorizationConfig::builder(TEST_CLIENT_ID)
		.client_secret(TEST_CLIENT_SECRET)
		.redirect_uri(Url::parse(TEST_REDIRECT_URI).expect("Failed to parse redirect URI."))
		.endpoints(DiscordEndpoints::default())
		.build()
		.expect("Failed to build recording configuration.")
}

fn client(http: &RecordingHttpClient) -> Arc<AuthorizationClient<RecordingHttpClient>> {
	let client = AuthorizationClient::with_http_client(config(), http.clone())
		.expect("Failed to build recording authorization client.");

	Arc::new(client)
}

fn form(request: &RecordedRequest) -> HashMap<String, String> {
	url::form_urlencoded::parse(&request.body).into_owned().collect()
}

fn token(refresh: bool) -> Token {
	let mut builder = Token::builder().access_token("access-held");

	if refresh {
		builder = builder.refresh_token("refresh-held");
	}

	builder.build().expect("Token fixture should build.")
}

#[tokio::test]
async fn exchange_posts_credentials_in_body() {
	let http = RecordingHttpClient::scripted([Scripted::Respond(200, TOKEN_BODY)]);
	let token = client(&http).exchange_code("abc123").await.expect("Exchange should succeed.");

	assert_eq!(token.access_token().expose(), "access-rec");

	let requests = http.requests();

	assert_eq!(requests.len(), 1);

	let request = &requests[0];

	assert_eq!(request.method, Method::POST);
	assert_eq!(request.uri, "https://discord.com/api/oauth2/token");
	assert!(
		request.authorization.is_none(),
		"Client credentials must travel in the body, not a Basic header."
	);

	let body = form(request);

	assert_eq!(body.get("grant_type").map(String::as_str), Some("authorization_code"));
	assert_eq!(body.get("code").map(String::as_str), Some("abc123"));
	assert_eq!(body.get("redirect_uri").map(String::as_str), Some(TEST_REDIRECT_URI));
	assert_eq!(body.get("scope").map(String::as_str), Some("identify"));
	assert_eq!(body.get("client_id").map(String::as_str), Some(TEST_CLIENT_ID));
	assert_eq!(body.get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
	assert_eq!(http.statuses.lock().as_slice(), &[None], "Metadata slots start empty.");
}

#[tokio::test]
async fn exchange_maps_transport_and_server_failures() {
	let http = RecordingHttpClient::scripted([Scripted::Fail]);
	let err = client(&http).exchange_code("abc123").await.expect_err("Transport failures must fail.");

	assert!(matches!(err, Error::Transport(_)), "Unexpected error: {err:?}.");

	let http = RecordingHttpClient::scripted([Scripted::Respond(
		401,
		"{\"error\":\"invalid_client\",\"error_description\":\"Invalid client secret\"}",
	)]);
	let err = client(&http).exchange_code("abc123").await.expect_err("Bad secrets must fail.");

	assert!(matches!(err, Error::InvalidClient { .. }), "Unexpected error: {err:?}.");

	let http = RecordingHttpClient::scripted([Scripted::Respond(
		503,
		"{\"error\":\"temporarily_unavailable\"}",
	)]);
	let err = client(&http).exchange_code("abc123").await.expect_err("Outages must fail.");

	assert!(
		matches!(err, Error::Transient(TransientError::TokenEndpoint { status: Some(503), .. })),
		"Unexpected error: {err:?}."
	);
}

#[tokio::test]
async fn revoke_posts_both_tokens_with_hints() {
	let http =
		RecordingHttpClient::scripted([Scripted::Respond(200, "{}"), Scripted::Respond(200, "{}")]);

	client(&http).revoke(&token(true)).await;

	let requests = http.requests();

	assert_eq!(requests.len(), 2);

	for (request, (secret, hint)) in
		requests.iter().zip([("access-held", "access_token"), ("refresh-held", "refresh_token")])
	{
		let body = form(request);

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.uri, "https://discord.com/api/oauth2/token/revoke");
		assert_eq!(body.get("token").map(String::as_str), Some(secret));
		assert_eq!(body.get("token_type_hint").map(String::as_str), Some(hint));
		assert_eq!(body.get("client_id").map(String::as_str), Some(TEST_CLIENT_ID));
		assert_eq!(body.get("client_secret").map(String::as_str), Some(TEST_CLIENT_SECRET));
	}
}

#[tokio::test]
async fn revoke_swallows_failures_and_keeps_going() {
	let http = RecordingHttpClient::scripted([Scripted::Fail, Scripted::Respond(500, "{}")]);

	client(&http).revoke(&token(true)).await;

	assert_eq!(http.requests().len(), 2, "A failed access-token revoke must not skip the refresh token.");

	let http = RecordingHttpClient::default();

	client(&http).revoke(&token(false)).await;

	assert_eq!(http.requests().len(), 1, "Only the access token is revoked without a refresh token.");
}

#[tokio::test]
async fn resource_reads_send_bearer_and_decode_with_paths() {
	let http = RecordingHttpClient::scripted([
		Scripted::Respond(200, "{\"nick\":\"kit\",\"roles\":[\"1\",\"2\"],\"deaf\":false,\"mute\":false}"),
		Scripted::Respond(200, "<html>maintenance</html>"),
		Scripted::Respond(404, "{\"message\":\"Unknown Guild\",\"code\":10004}"),
	]);
	let accessor = ResourceAccessor::new(token(false), client(&http));
	let guild = GuildId::new("81384788765712384").expect("Guild fixture should be valid.");
	let member = accessor.guild_membership(&guild).await.expect("Membership read should succeed.");

	assert_eq!(member.nick.as_deref(), Some("kit"));
	assert!(member.has_role("2"));

	let err = accessor.current_user().await.expect_err("Non-JSON bodies must fail to decode.");

	assert!(matches!(err, ResourceError::Decode { status: 200, .. }), "Unexpected error: {err:?}.");
	assert!(!err.is_retryable());

	let err = accessor.guild_membership(&guild).await.expect_err("Unknown guilds must fail.");

	assert_eq!(err.status_code(), 404);

	let requests = http.requests();

	assert_eq!(
		requests[0].uri,
		"https://discord.com/api/users/@me/guilds/81384788765712384/member"
	);
	assert_eq!(requests[1].uri, "https://discord.com/api/users/@me");

	for request in &requests {
		assert_eq!(request.method, Method::GET);
		assert_eq!(request.authorization.as_deref(), Some("Bearer access-held"));
	}
}

#[tokio::test]
async fn resource_transport_failures_are_retryable() {
	let http = RecordingHttpClient::default();
	let accessor = ResourceAccessor::new(token(false), client(&http));
	let err = accessor.current_user().await.expect_err("Transport failures must fail.");

	assert!(matches!(err, ResourceError::Transport { .. }));
	assert_eq!(err.status_code(), 0);
	assert!(err.is_retryable());
}

#[tokio::test]
async fn revoked_accessor_refuses_reads_locally() {
	let http = RecordingHttpClient::scripted([Scripted::Respond(200, "{}")]);
	let accessor = ResourceAccessor::new(token(false), client(&http));

	accessor.revoke_access().await;

	assert!(accessor.is_revoked());

	let err = accessor.current_user().await.expect_err("Revoked accessors must refuse reads.");

	assert!(matches!(err, ResourceError::Revoked));
	assert_eq!(http.requests().len(), 1, "Only the revocation request may reach the transport.");
}
