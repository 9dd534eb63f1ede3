//! Token kinds, redacted secrets, and the access/refresh pair issued by the backend.

pub mod secret;

pub use secret::TokenSecret;

// self
use crate::_prelude::*;

/// Which credential of a [`TokenPair`] a store entry holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived credential attached to API calls.
	Access,
	/// Longer-lived credential used only against the refresh endpoint.
	Refresh,
}
impl TokenKind {
	/// Every kind, in clearing order.
	pub const ALL: [TokenKind; 2] = [TokenKind::Access, TokenKind::Refresh];

	/// Returns the storage key conventionally used for this kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Access => "access_token",
			TokenKind::Refresh => "refresh_token",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access and refresh tokens issued together on login or refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token carrying identity and role claims.
	pub access_token: TokenSecret,
	/// Refresh token; never sent as an `Authorization` header.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Returns the secret stored under `kind`.
	pub fn get(&self, kind: TokenKind) -> &TokenSecret {
		match kind {
			TokenKind::Access => &self.access_token,
			TokenKind::Refresh => &self.refresh_token,
		}
	}
}
