//! Token storage contract and the built-in backends selected by the hosting shell.

pub mod file;
pub mod memory;
pub mod noop;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use noop::NoopStore;

// self
use crate::{
	_prelude::*,
	token::{TokenKind, TokenPair, TokenSecret},
};

/// Key/value storage for the access and refresh tokens.
///
/// Reads never fail: a backend that cannot answer (no storage in the current execution
/// context, unreadable snapshot) reports `None`. The client reads the store before every
/// outbound request, so implementations must not cache values on behalf of callers.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the stored token of the provided kind.
	fn get(&self, kind: TokenKind) -> Option<TokenSecret>;

	/// Stores (or overwrites) the token of the provided kind.
	fn set(&self, kind: TokenKind, token: TokenSecret) -> Result<(), StoreError>;

	/// Removes the token of the provided kind; clearing a missing token is not an error.
	fn clear(&self, kind: TokenKind) -> Result<(), StoreError>;

	/// Returns both tokens when both are present.
	fn pair(&self) -> Option<TokenPair> {
		Some(TokenPair {
			access_token: self.get(TokenKind::Access)?,
			refresh_token: self.get(TokenKind::Refresh)?,
		})
	}

	/// Stores both tokens of a freshly issued pair.
	fn set_pair(&self, pair: TokenPair) -> Result<(), StoreError> {
		self.set(TokenKind::Access, pair.access_token)?;
		self.set(TokenKind::Refresh, pair.refresh_token)
	}

	/// Clears every token, attempting all kinds even if one fails.
	fn clear_all(&self) -> Result<(), StoreError> {
		TokenKind::ALL
			.into_iter()
			.map(|kind| self.clear(kind))
			.fold(Ok(()), |acc, result| acc.and(result))
	}
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
