//! Storage contracts and built-in hint-store implementations.
//!
//! The broker persists exactly one soft fact: the last-known end-user email.
//! [`HintStore`] is the seam; [`MemoryHintStore`] keeps the hint in-process
//! for tests and demos, [`FileHintStore`] makes it survive restarts.

pub mod file;
pub mod memory;

pub use file::FileHintStore;
pub use memory::MemoryHintStore;

// self
use crate::{_prelude::*, auth::StoredHint};

/// Boxed future returned by hint-store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the identity hint.
///
/// Stores hold at most one hint; saving replaces the previous value whole.
/// Absence is a valid state and never an error.
pub trait HintStore: Send + Sync {
	/// Returns the remembered hint, if any.
	fn load(&self) -> StoreFuture<'_, Option<StoredHint>>;

	/// Persists or replaces the remembered hint.
	fn save(&self, hint: StoredHint) -> StoreFuture<'_, ()>;

	/// Forgets the remembered hint.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`HintStore`] implementations.
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

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "hint file unreachable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("hint file unreachable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
