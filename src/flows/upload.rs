//! Local-file upload path, independent of the token/selection machinery.

// self
use crate::{
	_prelude::*,
	backend::{CollaboratorApi, LocalUpload, StoredFile},
	error::PersistenceError,
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<A> Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	/// Stores a locally-chosen file through the collaborator upload endpoint.
	///
	/// No remote credential is involved: the caller supplies the bytes and
	/// the broker forwards them, sharing only the error-propagation contract
	/// with the selection path.
	pub async fn upload_local_file(&self, upload: LocalUpload) -> Result<StoredFile> {
		const KIND: FlowKind = FlowKind::LocalUpload;

		let span = FlowSpan::new(KIND, "upload_local_file");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.collaborator
					.persist_local_upload(upload)
					.await
					.map_err(|source| PersistenceError { endpoint: "persist-local-upload", source })
					.map_err(Error::from)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
