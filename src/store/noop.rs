//! [`TokenStore`] for execution contexts without durable storage (e.g. server-side rendering).

// self
use crate::{
	store::{StoreError, TokenStore},
	token::{TokenKind, TokenSecret},
};

/// Store that remembers nothing: every read is `None` and every write is discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;
impl TokenStore for NoopStore {
	fn get(&self, _kind: TokenKind) -> Option<TokenSecret> {
		None
	}

	fn set(&self, _kind: TokenKind, _token: TokenSecret) -> Result<(), StoreError> {
		Ok(())
	}

	fn clear(&self, _kind: TokenKind) -> Result<(), StoreError> {
		Ok(())
	}
}
