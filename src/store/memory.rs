//! Thread-safe in-memory [`HintStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::StoredHint,
	store::{HintStore, StoreError, StoreFuture},
};

type HintSlot = Arc<RwLock<Option<StoredHint>>>;

/// Keeps the hint in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryHintStore(HintSlot);
impl MemoryHintStore {
	/// Returns the current hint without going through the async contract.
	pub fn snapshot(&self) -> Option<StoredHint> {
		self.0.read().clone()
	}
}
impl HintStore for MemoryHintStore {
	fn load(&self) -> StoreFuture<'_, Option<StoredHint>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, hint: StoredHint) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(hint);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = None;

			Ok(())
		})
	}
}
