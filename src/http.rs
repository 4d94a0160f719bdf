//! Transport primitives for token exchanges and token-scoped resource reads.
//!
//! The module exposes [`TokenHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can integrate custom HTTP clients
//! without losing the instrumentation hooks. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status is known, enabling the exchange
//! error mapping to classify failures with consistent metadata.
//!
//! [`TransportClient`] sits on top of the same trait and performs the bearer-authenticated
//! GETs and form POSTs used by [`ResourceAccessor`](crate::resource::ResourceAccessor) and
//! revocation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, auth::TokenSecret, error::ResourceError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Deadline applied to every outbound token, revocation, and resource request.
pub const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Abstraction over HTTP transports capable of executing token exchanges and resource reads
/// while publishing response metadata to the instrumentation pipeline.
///
/// The trait acts as the crate's only dependency on an HTTP stack. Callers provide
/// an implementation (typically behind `Arc<T>` where `T: TokenHttpClient`) and the client
/// requests short-lived [`AsyncHttpClient`] handles that each carry a clone of a
/// [`ResponseMetadataSlot`]. Implementations must be `Send + Sync + 'static` so they
/// can be shared across clients without additional wrappers, and the handles they return
/// must own whatever state is required so their request futures remain `Send`.
///
/// Implementations are expected to bound each request by [`REQUEST_TIMEOUT`] and surface an
/// expired deadline as a transport error.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	///
	/// The request future returned by [`AsyncHttpClient::call`] must be `Send` so flow
	/// futures inherit the same guarantee.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across requests.
	/// - Once an HTTP response (successful or erroneous) provides a status, save it with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Bearer-authenticated JSON reads and form posts over a [`TokenHttpClient`].
///
/// No retries are performed. Every read carries `Authorization: Bearer <token>`.
pub struct TransportClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	http_client: Arc<C>,
}
impl<C> TransportClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps the provided HTTP client.
	pub fn new(http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into() }
	}

	/// Shared HTTP client handle.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Issues a GET to `url` and decodes a `200` JSON body into `T`.
	///
	/// Any other status yields [`ResourceError::HttpStatus`]; a body that does not decode into
	/// `T` yields [`ResourceError::Decode`] carrying the failing JSON path.
	pub async fn get<T>(&self, bearer: &TokenSecret, url: Url) -> Result<T, ResourceError>
	where
		T: DeserializeOwned,
	{
		let request = oauth2::http::Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", bearer.expose()))
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ResourceError::transport)?;
		let response = self.send(request).await?;
		let status = response.status().as_u16();

		if status != 200 {
			return Err(ResourceError::http_status(status));
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ResourceError::Decode { status, source })
	}

	/// POSTs `pairs` as `application/x-www-form-urlencoded` and returns the response status.
	///
	/// Non-2xx statuses yield [`ResourceError::HttpStatus`].
	pub async fn post_form(&self, url: Url, pairs: &[(&str, &str)]) -> Result<u16, ResourceError> {
		let body = url::form_urlencoded::Serializer::new(String::new())
			.extend_pairs(pairs.iter().copied())
			.finish();
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ResourceError::transport)?;
		let response = self.send(request).await?;
		let status = response.status();

		if !status.is_success() {
			return Err(ResourceError::http_status(status.as_u16()));
		}

		Ok(status.as_u16())
	}

	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ResourceError> {
		let handle = self.http_client.with_metadata(ResponseMetadataSlot::default());

		handle.call(request).await.map_err(ResourceError::transport)
	}
}
impl<C> Clone for TransportClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self { http_client: Arc::clone(&self.http_client) }
	}
}
impl<C> Debug for TransportClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TransportClient(..)")
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Requests never follow redirects (token endpoints answer directly) and are bounded by
/// [`REQUEST_TIMEOUT`]. Any custom [`ReqwestClient`] passed to
/// [`with_client`](Self::with_client) should be configured the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with the request timeout applied and redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(REQUEST_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds an instrumented HTTP client that captures response metadata.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

#[cfg(feature = "reqwest")]
/// Instrumented adapter that implements [`AsyncHttpClient`] for reqwest.
pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

#[cfg(feature = "reqwest")]
/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
#[cfg(feature = "reqwest")]
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
