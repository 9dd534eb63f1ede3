//! Token values that never print themselves.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Bearer or refresh token value.
///
/// `Debug` and `Display` both render a placeholder; [`TokenSecret::expose`] is the only way to
/// reach the raw string. Serialization is transparent so stores persist the real value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token text, for headers and request bodies only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the backend handed out an empty string.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({REDACTED})")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
