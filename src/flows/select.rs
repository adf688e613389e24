//! Selection-session orchestration: busy rejection, lazy picker-module
//! loading, widget configuration, and outcome normalization.
//!
//! One broker runs at most one selection session at a time; a second call
//! while one is pending is rejected with `SessionBusyError` instead of
//! opening a second widget. The widget always shows exactly two views—an
//! existing-files browser first, an upload surface second—and allows a
//! single selection only.

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	backend::CollaboratorApi,
	bootstrap::BootstrapHandles,
	error::{BootstrapError, NotReadyError, SessionBusyError},
	flows::{Broker, FileDescriptor, SelectionConfig, SelectionOutcome},
	host::{PickerOutcome, PickerRequest, PickerView},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<A> Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	/// Opens the remote file-selection widget and routes the outcome.
	///
	/// Bootstraps and acquires a credential on demand; the credential captured
	/// here rides the eventual descriptor un-refetched. Dismissal resolves to
	/// [`SelectionOutcome::Cancelled`] without touching the dispatcher.
	pub async fn open_selection(&self, config: SelectionConfig) -> Result<SelectionOutcome> {
		const KIND: FlowKind = FlowKind::Selection;

		let span = FlowSpan::new(KIND, "open_selection");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let Some(_session) = self.session_guard.try_lock() else {
					return Err(SessionBusyError.into());
				};

				if self.bootstrapper.is_disposed() {
					return Err(NotReadyError { state: self.bootstrapper.state() }.into());
				}

				let handles = self.ready_handles().await?;
				let credential = self.acquire_token().await?;

				self.ensure_picker_module(&handles).await?;

				let request = PickerRequest {
					api_key: self.api_key.clone(),
					credential: credential.clone(),
					views: vec![
						PickerView::Browse { thumbnails: self.descriptor.picker.thumbnails },
						PickerView::Upload,
					],
					multi_select: false,
				};

				match handles.api.open_picker(request).await {
					PickerOutcome::Picked(document) =>
						self.dispatch(FileDescriptor::from_picked(document, credential), config)
							.await,
					PickerOutcome::Dismissed => Ok(SelectionOutcome::Cancelled),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	// Lazy and memoized: the sub-module is loaded on first use and never
	// reloaded for the broker's lifetime.
	async fn ensure_picker_module(&self, handles: &BootstrapHandles) -> Result<()> {
		if self.picker_loaded.load(Ordering::Acquire) {
			return Ok(());
		}

		handles
			.api
			.load_picker_module()
			.await
			.map_err(|source| BootstrapError::PickerModuleLoad { source })?;
		self.picker_loaded.store(true, Ordering::Release);

		Ok(())
	}
}
