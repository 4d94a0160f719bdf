#![cfg(feature = "reqwest")]

// std
use std::time::{Duration as StdDuration, Instant};
// crates.io
use httpmock::prelude::*;
// self
use discord_oauth2::{
	_preludet::*,
	auth::RequestId,
	error::{ResourceError, TransientError},
	flows::{CallbackOutcome, CallbackParams, MalformedCallback},
};

const EXPECTED: &str = "req-7f3a9c";
const UNREACHABLE: &str = "http://127.0.0.1:1";
const TOKEN_BODY: &str = "{\"access_token\":\"access-abc\",\"refresh_token\":\"refresh-abc\",\"token_type\":\"Bearer\",\"expires_in\":604800,\"scope\":\"identify\"}";
const USER_BODY: &str =
	"{\"id\":\"80351110224678912\",\"username\":\"nelly\",\"global_name\":\"Nelly\",\"avatar\":null}";

fn params(
	code: Option<&str>,
	state: Option<&str>,
	error: Option<&str>,
	description: Option<&str>,
) -> CallbackParams {
	CallbackParams {
		code: code.map(Into::into),
		state: state.map(Into::into),
		error: error.map(Into::into),
		error_description: description.map(Into::into),
	}
}

async fn mock_token_success(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await
}

#[tokio::test]
async fn state_mismatch_wins_over_every_other_field() {
	let processor = build_test_processor(UNREACHABLE);
	let cases = [
		params(None, Some("req-other"), Some("access_denied"), None),
		params(None, Some("req-other"), Some("invalid_scope"), Some("bad scope")),
		params(Some("abc123"), Some("req-other"), None, None),
		params(Some("abc123"), None, None, None),
		params(None, None, None, None),
		params(Some("abc123"), Some(""), None, None),
		params(Some("abc123"), Some("req-7f3a9"), None, None),
		params(Some("abc123"), Some("req-7f3a9c0"), None, None),
	];

	for case in cases {
		let outcome = processor
			.process(&case, EXPECTED)
			.await
			.expect("State mismatches must be reported as an outcome.");

		assert!(
			matches!(outcome, CallbackOutcome::StateMismatch),
			"Expected StateMismatch for {case:?}, got {outcome:?}."
		);
	}
}

#[tokio::test]
async fn empty_expected_identifier_never_matches() {
	let processor = build_test_processor(UNREACHABLE);
	let outcome = processor
		.process(&params(Some("abc123"), Some(""), None, None), "")
		.await
		.expect("Empty identifiers must be reported as an outcome.");

	assert!(matches!(outcome, CallbackOutcome::StateMismatch));
}

#[tokio::test]
async fn access_denied_is_cancelled() {
	let processor = build_test_processor(UNREACHABLE);
	let outcome = processor
		.process(&params(None, Some(EXPECTED), Some("access_denied"), None), EXPECTED)
		.await
		.expect("Cancellations must be reported as an outcome.");

	assert!(matches!(outcome, CallbackOutcome::Cancelled));
	assert_eq!(outcome.label(), "cancelled");
}

#[tokio::test]
async fn provider_errors_carry_code_and_description() {
	let processor = build_test_processor(UNREACHABLE);
	let outcome = processor
		.process(
			&params(Some("abc123"), Some(EXPECTED), Some("invalid_scope"), Some("bad scope")),
			EXPECTED,
		)
		.await
		.expect("Provider errors must be reported as an outcome.");

	match outcome {
		CallbackOutcome::ProviderError { code, description } => {
			assert_eq!(code, "invalid_scope");
			assert_eq!(description.as_deref(), Some("bad scope"));
		},
		other => panic!("Expected ProviderError, got {other:?}."),
	}
}

#[tokio::test]
async fn callback_without_code_or_error_is_malformed() {
	let processor = build_test_processor(UNREACHABLE);
	let err = processor
		.process(&params(None, Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect_err("Callbacks without code or error are malformed.");

	assert_eq!(err, MalformedCallback);

	let err = processor
		.process(&params(Some(""), Some(EXPECTED), Some(""), None), EXPECTED)
		.await
		.expect_err("Empty code and error values count as absent.");

	assert_eq!(err, MalformedCallback);
}

#[tokio::test]
async fn rejected_code_yields_exchange_failed() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth2/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid \\\"code\\\" in request.\"}",
			);
		})
		.await;
	let processor = build_test_processor(&server.base_url());
	let outcome = processor
		.process(&params(Some("abc123"), Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect("Exchange failures must be reported as an outcome.");

	mock.assert_async().await;

	match outcome {
		CallbackOutcome::ExchangeFailed { cause } =>
			assert!(matches!(cause, Error::InvalidGrant { .. }), "Unexpected cause: {cause:?}."),
		other => panic!("Expected ExchangeFailed, got {other:?}."),
	}
}

#[tokio::test]
async fn plain_text_rejection_is_classified_from_body_and_status() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth2/token");
			then.status(400).header("content-type", "text/plain").body("invalid_grant: code expired");
		})
		.await;
	let processor = build_test_processor(&server.base_url());
	let outcome = processor
		.process(&params(Some("abc123"), Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect("Exchange failures must be reported as an outcome.");

	mock.assert_async().await;

	match outcome {
		CallbackOutcome::ExchangeFailed { cause } =>
			assert!(matches!(cause, Error::InvalidGrant { .. }), "Unexpected cause: {cause:?}."),
		other => panic!("Expected ExchangeFailed, got {other:?}."),
	}
}

#[tokio::test]
async fn html_gateway_error_stays_transient() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth2/token");
			then.status(502).header("content-type", "text/html").body("<html>Bad Gateway</html>");
		})
		.await;
	let err = build_test_client(&server.base_url())
		.exchange_code("abc123")
		.await
		.expect_err("Gateway errors must fail.");

	assert!(
		matches!(err, Error::Transient(TransientError::TokenResponseParse { status: Some(502), .. })),
		"Unexpected error: {err:?}."
	);
}

#[tokio::test]
async fn stalled_token_endpoint_hits_request_deadline() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(TOKEN_BODY)
				.delay(StdDuration::from_secs(13));
		})
		.await;
	let started = Instant::now();
	let err = build_test_client(&server.base_url())
		.exchange_code("abc123")
		.await
		.expect_err("Exchanges past the deadline must fail.");
	let elapsed = started.elapsed();

	assert!(matches!(err, Error::Transport(_)), "Unexpected error: {err:?}.");
	assert!(
		(StdDuration::from_secs(9)..StdDuration::from_secs(12)).contains(&elapsed),
		"Deadline fired after {elapsed:?}."
	);
}

#[tokio::test]
async fn unreachable_token_endpoint_yields_exchange_failed() {
	let processor = build_test_processor(UNREACHABLE);
	let outcome = processor
		.process(&params(Some("abc123"), Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect("Exchange failures must be reported as an outcome.");

	match outcome {
		CallbackOutcome::ExchangeFailed { cause } =>
			assert!(matches!(cause, Error::Transport(_)), "Unexpected cause: {cause:?}."),
		other => panic!("Expected ExchangeFailed, got {other:?}."),
	}
}

#[tokio::test]
async fn successful_exchange_yields_resource_accessor() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token_success(&server).await;
	let user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/@me").header("authorization", "Bearer access-abc");
			then.status(200).header("content-type", "application/json").body(USER_BODY);
		})
		.await;
	let processor = build_test_processor(&server.base_url());
	let outcome = processor
		.process(&params(Some("abc123"), Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect("Successful callbacks must be reported as an outcome.");

	token_mock.assert_async().await;

	assert_eq!(outcome.label(), "success");

	let resource = outcome.into_resource().expect("Successful outcome should carry a resource.");

	assert_eq!(resource.access_token().expose(), "access-abc");
	assert_eq!(resource.token().refresh_token().map(|secret| secret.expose()), Some("refresh-abc"));
	assert_eq!(resource.token().token_type(), "Bearer");
	assert!(resource.token().scope().contains("identify"));
	assert!(resource.token().expires_at().is_some());
	assert!(
		!format!("{resource:?}").contains("access-abc"),
		"Debug output must not leak the access token."
	);

	let user = resource.current_user().await.expect("Current user read should succeed.");

	user_mock.assert_async().await;

	assert_eq!(user.id, "80351110224678912");
	assert_eq!(user.username, "nelly");
	assert_eq!(user.display_name(), "Nelly");
}

#[tokio::test]
async fn unauthorized_user_read_yields_http_status_failure() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token_success(&server).await;
	let _user_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/@me");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"401: Unauthorized\",\"code\":0}");
		})
		.await;
	let processor = build_test_processor(&server.base_url());
	let resource = processor
		.process(&params(Some("abc123"), Some(EXPECTED), None, None), EXPECTED)
		.await
		.expect("Successful callbacks must be reported as an outcome.")
		.into_resource()
		.expect("Successful outcome should carry a resource.");
	let err = resource.current_user().await.expect_err("401 responses must fail.");

	assert!(matches!(err, ResourceError::HttpStatus { status: 401, .. }), "Unexpected error: {err:?}.");
	assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn authorization_url_round_trips_through_processor() {
	let processor = build_test_processor(UNREACHABLE);
	let state = RequestId::generate();
	let url = processor.authorization_url(&state);
	let returned = url
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Authorize URL must carry state.");

	assert_eq!(returned, state.as_ref());
	assert!(url.as_str().starts_with("http://127.0.0.1:1/oauth2/authorize?"));

	let callback = Url::parse(&format!("{TEST_REDIRECT_URI}?error=access_denied&state={returned}"))
		.expect("Callback fixture should parse.");
	let outcome = processor
		.process(&CallbackParams::from_url(&callback), state.as_ref())
		.await
		.expect("Cancellations must be reported as an outcome.");

	assert!(matches!(outcome, CallbackOutcome::Cancelled));
}
