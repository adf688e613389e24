//! High-level flow orchestrators powered by the broker facade.

pub mod acquire;
pub mod common;

mod dispatch;
mod select;
mod upload;

pub use acquire::*;
pub use common::*;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	backend::CollaboratorApi,
	bootstrap::{BootstrapHandles, BootstrapState, Bootstrapper, PollTimer},
	host::HostRuntime,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
	store::HintStore,
};
#[cfg(feature = "reqwest")] use crate::backend::ReqwestCollaborator;
#[cfg(all(feature = "reqwest", feature = "tokio"))] use crate::bootstrap::TokioTimer;

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest collaborator.
pub type ReqwestBroker = Broker<ReqwestCollaborator>;

/// Coordinates credential acquisition and file selection for one mount.
///
/// The broker owns every mutable ref the original design kept ambient: the
/// cached credential, the pending-session guard, and the picker-module memo.
/// It is constructed on mount and torn down with [`Broker::dispose`]; clones
/// share all state. Flow implementations live in the sibling modules and
/// focus on their own sequencing while the facade carries the collaborator,
/// hint store, and bootstrapper references.
pub struct Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	/// Collaborator transport used for every backend request.
	pub collaborator: Arc<A>,
	/// Durable identity-hint storage.
	pub hint_store: Arc<dyn HintStore>,
	/// Descriptor of the third-party picker stack.
	pub descriptor: ProviderDescriptor,
	/// Shared counters for credential-acquisition outcomes.
	pub acquire_metrics: Arc<AcquireMetrics>,
	api_key: String,
	bootstrapper: Arc<Bootstrapper>,
	credential: Arc<RwLock<Option<Credential>>>,
	acquire_serial: Arc<AsyncMutex<()>>,
	session_guard: Arc<AsyncMutex<()>>,
	picker_loaded: Arc<AtomicBool>,
}
impl<A> Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	/// Creates a broker that reuses the caller-provided collaborator, host
	/// runtime, and poll timer.
	pub fn with_collaborator(
		collaborator: impl Into<Arc<A>>,
		hint_store: Arc<dyn HintStore>,
		runtime: Arc<dyn HostRuntime>,
		timer: Arc<dyn PollTimer>,
		descriptor: ProviderDescriptor,
		api_key: impl Into<String>,
		client_id: impl Into<String>,
	) -> Self {
		let api_key = api_key.into();
		let hint_store_for_probe = hint_store.clone();
		let bootstrapper = Bootstrapper::new(
			runtime,
			timer,
			hint_store_for_probe,
			descriptor.clone(),
			api_key.clone(),
			client_id,
		);

		Self {
			collaborator: collaborator.into(),
			hint_store,
			descriptor,
			acquire_metrics: Default::default(),
			api_key,
			bootstrapper: Arc::new(bootstrapper),
			credential: Default::default(),
			acquire_serial: Default::default(),
			session_guard: Default::default(),
			picker_loaded: Default::default(),
		}
	}

	/// Current bootstrap state.
	pub fn bootstrap_state(&self) -> BootstrapState {
		self.bootstrapper.state()
	}

	/// Warms the broker up: loads both libraries and resolves once usable.
	pub async fn ensure_ready(&self) -> Result<()> {
		self.ready_handles().await.map(|_| ())
	}

	/// Tears the broker down: halts an in-flight readiness poll, suppresses
	/// late callbacks, and drops the cached credential. A disposed broker
	/// rejects every further call.
	pub fn dispose(&self) {
		self.bootstrapper.dispose();
		*self.credential.write() = None;
		self.picker_loaded.store(false, Ordering::Release);
	}

	pub(crate) async fn ready_handles(&self) -> Result<BootstrapHandles> {
		const KIND: FlowKind = FlowKind::Bootstrap;

		let span = FlowSpan::new(KIND, "ensure_ready");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move { self.bootstrapper.ensure_ready().await.map_err(Error::from) })
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl Broker<ReqwestCollaborator> {
	/// Creates a new broker over the default reqwest collaborator and tokio
	/// poll timer.
	///
	/// `base_url` is the dashboard backend the collaborator endpoints hang
	/// off; use [`Broker::with_collaborator`] to supply a custom transport or
	/// timer.
	pub fn new(
		base_url: Url,
		hint_store: Arc<dyn HintStore>,
		runtime: Arc<dyn HostRuntime>,
		descriptor: ProviderDescriptor,
		api_key: impl Into<String>,
		client_id: impl Into<String>,
	) -> Self {
		Self::with_collaborator(
			ReqwestCollaborator::new(base_url),
			hint_store,
			runtime,
			Arc::new(TokioTimer),
			descriptor,
			api_key,
			client_id,
		)
	}
}
impl<A> Clone for Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	fn clone(&self) -> Self {
		Self {
			collaborator: self.collaborator.clone(),
			hint_store: self.hint_store.clone(),
			descriptor: self.descriptor.clone(),
			acquire_metrics: self.acquire_metrics.clone(),
			api_key: self.api_key.clone(),
			bootstrapper: self.bootstrapper.clone(),
			credential: self.credential.clone(),
			acquire_serial: self.acquire_serial.clone(),
			session_guard: self.session_guard.clone(),
			picker_loaded: self.picker_loaded.clone(),
		}
	}
}
impl<A> Debug for Broker<A>
where
	A: ?Sized + CollaboratorApi,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor.id)
			.field("bootstrap_state", &self.bootstrap_state())
			.field("credential_cached", &self.credential.read().is_some())
			.finish()
	}
}
