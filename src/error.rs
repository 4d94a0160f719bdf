//! Error types shared by the authorization client, resource accessor, and callback flows.

// self
use crate::{_prelude::*, auth::TokenBuildError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error raised by the authorization-code exchange.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the caller may restart the flow.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the grant (invalid, expired, or reused code; redirect mismatch).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Requested scopes were refused by the provider.
	#[error("Provider refused the requested scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
}

/// Configuration failures raised while wiring the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL was rejected by the OAuth client.
	#[error("The {endpoint} endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Token endpoint returned a payload that cannot form a [`Token`](crate::auth::Token).
	#[error(transparent)]
	TokenBuild(#[from] TokenBuildError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants reported by the token endpoint.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure or timed out.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failure of a token-scoped resource read (or the revocation POST).
///
/// [`status_code`](Self::status_code) reports `0` for failures that never produced an HTTP
/// status (transport errors and locally refused reads).
#[derive(Debug, ThisError)]
pub enum ResourceError {
	/// Connection could not be established, or the request exceeded its timeout.
	#[error("HTTP transaction failed.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Provider answered with a non-200 status.
	#[error("Resource returned HTTP {status}: {message}.")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Canonical reason phrase for the status.
		message: String,
	},
	/// Body was not valid JSON for the expected record.
	#[error("Failed to parse response.")]
	Decode {
		/// HTTP status code of the undecodable response.
		status: u16,
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// The accessor's token was revoked locally; no request was sent.
	#[error("Access token has been revoked.")]
	Revoked,
}
impl ResourceError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Builds an HTTP status failure, using the canonical reason phrase as message.
	pub fn http_status(status: u16) -> Self {
		let message = oauth2::http::StatusCode::from_u16(status)
			.ok()
			.and_then(|code| code.canonical_reason())
			.unwrap_or("Unknown status")
			.to_owned();

		Self::HttpStatus { status, message }
	}

	/// HTTP status associated with the failure, `0` when none was received.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::HttpStatus { status, .. } | Self::Decode { status, .. } => *status,
			Self::Transport { .. } | Self::Revoked => 0,
		}
	}

	/// Returns `true` for failures a caller may retry unchanged.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport { .. })
	}
}
