//! Result routing between the caller's callback and the persistence endpoint.

// self
use crate::{
	_prelude::*,
	backend::CollaboratorApi,
	error::PersistenceError,
	flows::{Broker, FileDescriptor, SelectionConfig, SelectionOutcome},
};

impl<A> Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	// Exactly one destination per invocation: the callback fires first when
	// present, and only the skip flag stops the persistence call after it.
	// Persistence failures propagate verbatim, unlike the token broker's
	// internal fall-through.
	pub(crate) async fn dispatch(
		&self,
		descriptor: FileDescriptor,
		config: SelectionConfig,
	) -> Result<SelectionOutcome> {
		if let Some(on_picked) = &config.on_picked {
			on_picked(descriptor.clone());

			if config.skip_persistence {
				return Ok(SelectionOutcome::Picked(descriptor));
			}
		}

		let record = descriptor.to_record(config.default_category);
		let stored = self
			.collaborator
			.persist_selection(record)
			.await
			.map_err(|source| PersistenceError { endpoint: "persist-selection", source })?;

		Ok(SelectionOutcome::Stored(stored))
	}
}
