//! Records returned by the Discord resource endpoints.
//!
//! Only the identifying fields are typed. Everything else the provider sends is kept in
//! `extra` so new fields never break decoding.

// self
use crate::_prelude::*;

/// Current user as returned by `GET users/@me`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
	/// Snowflake identifier.
	pub id: String,
	/// Unique username.
	pub username: String,
	/// Legacy discriminator (`"0"` for migrated accounts).
	#[serde(default)]
	pub discriminator: Option<String>,
	/// Display name, when set.
	#[serde(default)]
	pub global_name: Option<String>,
	/// Avatar hash.
	#[serde(default)]
	pub avatar: Option<String>,
	/// Whether the account belongs to an OAuth2 application.
	#[serde(default)]
	pub bot: Option<bool>,
	/// Verified email, only present with the `email` scope.
	#[serde(default)]
	pub email: Option<String>,
	/// Whether the email is verified.
	#[serde(default)]
	pub verified: Option<bool>,
	/// Chosen language option.
	#[serde(default)]
	pub locale: Option<String>,
	/// Remaining provider fields.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl User {
	/// Display name if set, otherwise the username.
	pub fn display_name(&self) -> &str {
		self.global_name.as_deref().unwrap_or(&self.username)
	}
}

/// Membership of the current user in one guild, as returned by
/// `GET users/@me/guilds/{guild.id}/member`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuildMember {
	/// Member's user record, when included.
	#[serde(default)]
	pub user: Option<Value>,
	/// Guild-specific nickname.
	#[serde(default)]
	pub nick: Option<String>,
	/// Role snowflakes held by the member.
	#[serde(default)]
	pub roles: Vec<String>,
	/// ISO-8601 timestamp of when the user joined the guild.
	#[serde(default)]
	pub joined_at: Option<String>,
	/// Whether the member is deafened in voice channels.
	#[serde(default)]
	pub deaf: Option<bool>,
	/// Whether the member is muted in voice channels.
	#[serde(default)]
	pub mute: Option<bool>,
	/// Remaining provider fields.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}
impl GuildMember {
	/// Returns `true` if the member holds `role`.
	pub fn has_role(&self, role: &str) -> bool {
		self.roles.iter().any(|held| held == role)
	}
}
