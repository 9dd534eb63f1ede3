//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{
	_prelude::*,
	store::{StoreError, TokenStore},
	token::{TokenKind, TokenPair, TokenSecret},
};

/// Keeps tokens in-process; clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<TokenKind, TokenSecret>>>);
impl MemoryStore {
	/// Creates a store pre-populated with the provided pair.
	pub fn with_pair(pair: TokenPair) -> Self {
		let map = HashMap::from_iter([
			(TokenKind::Access, pair.access_token),
			(TokenKind::Refresh, pair.refresh_token),
		]);

		Self(Arc::new(RwLock::new(map)))
	}

	/// Returns `true` if no token is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn get(&self, kind: TokenKind) -> Option<TokenSecret> {
		self.0.read().get(&kind).cloned()
	}

	fn set(&self, kind: TokenKind, token: TokenSecret) -> Result<(), StoreError> {
		self.0.write().insert(kind, token);

		Ok(())
	}

	fn clear(&self, kind: TokenKind) -> Result<(), StoreError> {
		self.0.write().remove(&kind);

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn clones_share_state() {
		let store = MemoryStore::default();
		let view = store.clone();

		store
			.set(TokenKind::Access, TokenSecret::new("shared"))
			.expect("Memory store writes should succeed.");

		assert_eq!(view.get(TokenKind::Access).map(|t| t.expose().to_owned()), Some("shared".into()));

		view.clear_all().expect("Memory store clears should succeed.");

		assert!(store.is_empty());
	}
}
