//! Library bootstrap orchestration: idempotent script injection, the bounded
//! readiness poll, client initialization, and teardown cancellation.
//!
//! The two third-party libraries attach their global entry points some time
//! after their scripts resolve, so the bootstrapper polls a readiness
//! predicate on a fixed cadence instead of trusting script completion. The
//! poll sleeps through an injectable [`PollTimer`] so tests drive the clock.

// std
use std::{
	sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
	time::Duration as StdDuration,
};
// self
use crate::{
	_prelude::*,
	auth::{IdentityHint, StoredHint},
	error::BootstrapError,
	host::{ApiLibrary, HostRuntime, IdentityLibrary, TokenRequestHandle},
	provider::ProviderDescriptor,
	store::HintStore,
};

/// Lifecycle of the third-party libraries.
///
/// Transitions only move forward (`NotReady` → `Polling` → `Ready`), except
/// on broker teardown, which resets to `NotReady` for the next mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BootstrapState {
	/// Nothing has been injected yet.
	#[default]
	NotReady,
	/// Scripts are loading or the readiness predicate is being polled.
	Polling,
	/// Both libraries are initialized and usable.
	Ready,
}
impl BootstrapState {
	/// Returns a stable label suitable for span or error fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			BootstrapState::NotReady => "not-ready",
			BootstrapState::Polling => "polling",
			BootstrapState::Ready => "ready",
		}
	}
}
impl Display for BootstrapState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Timer seam used by the readiness poll.
pub trait PollTimer: Send + Sync {
	/// Sleeps for the provided duration.
	fn sleep(&self, duration: StdDuration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Tokio-backed timer used by default.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;
#[cfg(feature = "tokio")]
impl PollTimer for TokioTimer {
	fn sleep(&self, duration: StdDuration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(tokio::time::sleep(duration))
	}
}

/// Non-sleeping timer for local development and tests.
///
/// Every sleep resolves immediately; the call count and the total requested
/// duration are recorded so tests can assert poll cadence without waiting.
#[derive(Debug, Default)]
pub struct InstantTimer {
	sleeps: AtomicU32,
	requested_ms: AtomicU64,
}
impl InstantTimer {
	/// Number of sleeps requested so far.
	pub fn sleeps(&self) -> u32 {
		self.sleeps.load(Ordering::Relaxed)
	}

	/// Total requested sleep time so far, in milliseconds.
	pub fn requested_ms(&self) -> u64 {
		self.requested_ms.load(Ordering::Relaxed)
	}
}
impl PollTimer for InstantTimer {
	fn sleep(&self, duration: StdDuration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		self.sleeps.fetch_add(1, Ordering::Relaxed);
		self.requested_ms.fetch_add(duration.as_millis() as u64, Ordering::Relaxed);

		Box::pin(async {})
	}
}

/// Handles exposed once both libraries are usable.
#[derive(Clone)]
pub struct BootstrapHandles {
	/// API client library handle.
	pub api: Arc<dyn ApiLibrary>,
	/// Identity library handle.
	pub identity: Arc<dyn IdentityLibrary>,
	/// Reusable token-request handle bound to the descriptor's scope set.
	pub token_handle: Arc<dyn TokenRequestHandle>,
}
impl Debug for BootstrapHandles {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BootstrapHandles(..)")
	}
}

/// Loads and initializes the two client libraries exactly once per mount.
pub struct Bootstrapper {
	runtime: Arc<dyn HostRuntime>,
	timer: Arc<dyn PollTimer>,
	hint_store: Arc<dyn HintStore>,
	descriptor: ProviderDescriptor,
	api_key: String,
	client_id: String,
	state: Mutex<BootstrapState>,
	handles: Mutex<Option<BootstrapHandles>>,
	disposed: AtomicBool,
	serial: AsyncMutex<()>,
}
impl Bootstrapper {
	pub(crate) fn new(
		runtime: Arc<dyn HostRuntime>,
		timer: Arc<dyn PollTimer>,
		hint_store: Arc<dyn HintStore>,
		descriptor: ProviderDescriptor,
		api_key: impl Into<String>,
		client_id: impl Into<String>,
	) -> Self {
		Self {
			runtime,
			timer,
			hint_store,
			descriptor,
			api_key: api_key.into(),
			client_id: client_id.into(),
			state: Mutex::new(BootstrapState::NotReady),
			handles: Mutex::new(None),
			disposed: AtomicBool::new(false),
			serial: AsyncMutex::new(()),
		}
	}

	/// Current bootstrap state.
	pub fn state(&self) -> BootstrapState {
		*self.state.lock()
	}

	/// Whether the owning broker has been torn down.
	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::Acquire)
	}

	pub(crate) fn handles(&self) -> Option<BootstrapHandles> {
		self.handles.lock().clone()
	}

	/// Tears the bootstrapper down: an in-flight poll stops at its next
	/// check, the identity-probe write is suppressed, and the state resets to
	/// [`BootstrapState::NotReady`].
	pub fn dispose(&self) {
		self.disposed.store(true, Ordering::Release);
		*self.handles.lock() = None;
		*self.state.lock() = BootstrapState::NotReady;
	}

	/// Loads both libraries and resolves once they are usable, memoized.
	pub async fn ensure_ready(&self) -> Result<BootstrapHandles, BootstrapError> {
		let _serial = self.serial.lock().await;

		if self.is_disposed() {
			return Err(BootstrapError::Disposed);
		}
		if let Some(handles) = self.handles() {
			return Ok(handles);
		}

		*self.state.lock() = BootstrapState::Polling;

		let scripts = self.descriptor.scripts.clone();

		for url in [&scripts.api, &scripts.identity] {
			self.runtime
				.inject_script(url)
				.await
				.map_err(|source| BootstrapError::ScriptLoad { url: url.clone(), source })?;
		}

		let (api, identity) = self.poll_entry_points().await?;

		if self.is_disposed() {
			return Err(BootstrapError::Disposed);
		}

		api.init_client(&self.api_key)
			.await
			.map_err(|source| BootstrapError::ClientInit { source })?;

		let token_handle = identity
			.init_token_client(&self.client_id, &self.descriptor.scope)
			.map_err(|source| BootstrapError::TokenClientInit { source })?;

		self.probe_identity(identity.as_ref()).await;

		if self.is_disposed() {
			return Err(BootstrapError::Disposed);
		}

		let handles = BootstrapHandles { api, identity, token_handle };

		*self.handles.lock() = Some(handles.clone());
		*self.state.lock() = BootstrapState::Ready;

		Ok(handles)
	}

	async fn poll_entry_points(
		&self,
	) -> Result<(Arc<dyn ApiLibrary>, Arc<dyn IdentityLibrary>), BootstrapError> {
		let cadence = self.descriptor.readiness;

		for _ in 0..cadence.max_attempts {
			if self.is_disposed() {
				return Err(BootstrapError::Disposed);
			}
			if let (Some(api), Some(identity)) =
				(self.runtime.api_library(), self.runtime.identity_library())
			{
				return Ok((api, identity));
			}

			self.timer.sleep(cadence.interval()).await;
		}

		Err(BootstrapError::NeverReady {
			attempts: cadence.max_attempts,
			waited_ms: cadence.waited_ms(),
		})
	}

	// One-time, best-effort: a yielded email is remembered, everything else
	// is swallowed. Never writes after teardown.
	async fn probe_identity(&self, identity: &dyn IdentityLibrary) {
		let Ok(Some(email)) = identity.probe_identity().await else {
			return;
		};
		if self.is_disposed() {
			return;
		}
		if let Ok(hint) = IdentityHint::new(email) {
			let _ = self.hint_store.save(StoredHint::new(hint)).await;
		}
	}
}
impl Debug for Bootstrapper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Bootstrapper")
			.field("descriptor", &self.descriptor.id)
			.field("state", &self.state())
			.field("disposed", &self.is_disposed())
			.finish()
	}
}
