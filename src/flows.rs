//! Callback-driven flows built on [`AuthorizationClient`](crate::oauth::AuthorizationClient).
//!
//! [`CallbackProcessor`] turns one provider callback into exactly one [`CallbackOutcome`].
//! [`IdentityLogin`] layers the common "who is this user" case on top of it.

pub mod callback;
pub mod identity;

pub use callback::*;
pub use identity::*;
