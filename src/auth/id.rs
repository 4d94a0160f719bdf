//! Strongly typed identifiers used by the authorization flow and resource reads.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:ident) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const GENERATED_REQUEST_ID_LEN: usize = 32;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (request, guild).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (request, guild).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (request, guild).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! {
	RequestId,
	"Unguessable per-attempt value round-tripped through the `state` parameter.\n\nNarrower than an arbitrary string: it must be non-empty, free of whitespace, and at most 128 characters, so it survives the query string unchanged.",
	"Request",
	validate_request_id
}
def_id! {
	GuildId,
	"Provider-defined guild identifier; content is validated by the provider, not locally.",
	"Guild",
	validate_non_empty
}

impl RequestId {
	/// Generates a fresh 32-character alphanumeric request identifier.
	pub fn generate() -> Self {
		let value: String = rand::rng()
			.sample_iter(Alphanumeric)
			.take(GENERATED_REQUEST_ID_LEN)
			.map(char::from)
			.collect();

		Self(value)
	}
}
impl Debug for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Request(<redacted>)")
	}
}

impl Debug for GuildId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Guild({})", self.0)
	}
}

fn validate_request_id(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	validate_non_empty(kind, view)?;

	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_non_empty(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() { Err(IdentifierError::Empty { kind }) } else { Ok(()) }
}
