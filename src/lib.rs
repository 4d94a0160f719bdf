//! Discord OAuth 2.0 authorization-code client: CSRF-safe callback handling, code exchange,
//! and token-scoped identity and guild-membership reads.
//!
//! The crate is layered leaf to root:
//!
//! - [`http::TransportClient`] performs bearer-authenticated reads with a fixed 10 second
//!   deadline.
//! - [`oauth::AuthorizationClient`] builds the authorize URL, exchanges codes, and revokes
//!   tokens on a best-effort basis.
//! - [`resource::ResourceAccessor`] owns one token and reads the current user and guild
//!   membership.
//! - [`flows::CallbackProcessor`] verifies `state` in constant time and turns a callback into
//!   one [`flows::CallbackOutcome`]. [`flows::IdentityLogin`] resolves it all the way to a
//!   [`resource::User`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod auth;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod resource;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::{CallbackProcessor, ReqwestCallbackProcessor},
		http::{REQUEST_TIMEOUT, ReqwestHttpClient},
		oauth::{AuthorizationClient, ReqwestAuthorizationClient},
		provider::{AuthorizationConfig, DiscordEndpoints},
	};

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "client-id";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "client-secret";
	/// Redirect URI used by test configurations.
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/auth/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests, with the production timeout applied.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(REQUEST_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Configuration whose endpoints all live under `origin` (usually a mock server).
	pub fn test_config(origin: &str) -> AuthorizationConfig {
		let origin = Url::parse(origin).expect("Failed to parse mock origin.");
		let endpoints =
			DiscordEndpoints::with_origin(&origin).expect("Mock origin should be a valid endpoint.");

		AuthorizationConfig::builder(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.redirect_uri(Url::parse(TEST_REDIRECT_URI).expect("Failed to parse redirect URI."))
			.endpoints(endpoints)
			.build()
			.expect("Failed to build test configuration.")
	}

	/// Authorization client pointed at `origin`.
	pub fn build_test_client(origin: &str) -> Arc<ReqwestAuthorizationClient> {
		let client =
			AuthorizationClient::with_http_client(test_config(origin), test_reqwest_http_client())
				.expect("Failed to build test authorization client.");

		Arc::new(client)
	}

	/// Callback processor pointed at `origin`.
	pub fn build_test_processor(origin: &str) -> ReqwestCallbackProcessor {
		CallbackProcessor::new(build_test_client(origin))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
