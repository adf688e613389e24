//! Programmable in-process host runtime for local development and tests.
//!
//! [`ScriptedHost`] stands in for a real script runtime: tests program which
//! scripts fail, how many readiness checks pass before the library entry
//! points attach, which token grants the identity library hands out, and what
//! the picker widget answers. Every interaction is recorded for assertions.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicBool, AtomicU32, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{Credential, ScopeSet},
	host::{
		ApiLibrary, ConsentPrompt, HostFuture, HostRuntime, IdentityLibrary, LibraryError,
		PickerFuture, PickerOutcome, PickerRequest, TokenGrant, TokenRequestHandle,
	},
};

type GrantQueue = Arc<Mutex<VecDeque<Result<TokenGrant, LibraryError>>>>;
type TokenRequestLog = Arc<Mutex<Vec<(ConsentPrompt, Option<String>)>>>;

/// Shared programmable host runtime.
///
/// Clones share state, so tests keep one handle for programming and pass
/// another as the broker's [`HostRuntime`].
#[derive(Clone, Default)]
pub struct ScriptedHost {
	inner: Arc<ScriptedHostInner>,
}

struct ScriptedHostInner {
	scripts: Mutex<Vec<Url>>,
	failing_scripts: Mutex<Vec<(Url, LibraryError)>>,
	// `None` means the entry points never attach.
	attach_after: Mutex<Option<u32>>,
	readiness_checks: AtomicU32,
	api: Arc<ScriptedApiLibrary>,
	identity: Arc<ScriptedIdentityLibrary>,
}
impl Default for ScriptedHostInner {
	fn default() -> Self {
		Self {
			scripts: Mutex::new(Vec::new()),
			failing_scripts: Mutex::new(Vec::new()),
			attach_after: Mutex::new(Some(0)),
			readiness_checks: AtomicU32::new(0),
			api: Arc::new(ScriptedApiLibrary::default()),
			identity: Arc::new(ScriptedIdentityLibrary::default()),
		}
	}
}
impl ScriptedHost {
	/// Creates a host whose libraries attach on the first readiness check.
	pub fn new() -> Self {
		Self::default()
	}

	/// Programs the entry points to attach only after `checks` failed checks.
	pub fn set_ready_after(&self, checks: u32) {
		*self.inner.attach_after.lock() = Some(checks);
	}

	/// Programs the entry points to never attach.
	pub fn set_never_ready(&self) {
		*self.inner.attach_after.lock() = None;
	}

	/// Programs injection of `url` to fail with the provided error.
	pub fn fail_script(&self, url: Url, error: LibraryError) {
		self.inner.failing_scripts.lock().push((url, error));
	}

	/// Script URLs present in the context, in injection order, deduplicated.
	pub fn injected_scripts(&self) -> Vec<Url> {
		self.inner.scripts.lock().clone()
	}

	/// Number of readiness checks observed so far.
	pub fn readiness_checks(&self) -> u32 {
		self.inner.readiness_checks.load(Ordering::Relaxed)
	}

	/// Handle to the scripted API library for programming and assertions.
	pub fn api(&self) -> Arc<ScriptedApiLibrary> {
		self.inner.api.clone()
	}

	/// Handle to the scripted identity library for programming and assertions.
	pub fn identity(&self) -> Arc<ScriptedIdentityLibrary> {
		self.inner.identity.clone()
	}

	fn attached(&self, checks: u32) -> bool {
		match *self.inner.attach_after.lock() {
			Some(threshold) => checks > threshold,
			None => false,
		}
	}
}
impl HostRuntime for ScriptedHost {
	fn inject_script(&self, url: &Url) -> HostFuture<'_, ()> {
		let url = url.clone();

		Box::pin(async move {
			if let Some((_, error)) =
				self.inner.failing_scripts.lock().iter().find(|(candidate, _)| *candidate == url)
			{
				return Err(error.clone());
			}

			let mut scripts = self.inner.scripts.lock();

			// Already-present URLs resolve as loaded without re-fetching.
			if !scripts.contains(&url) {
				scripts.push(url);
			}

			Ok(())
		})
	}

	// Readiness checks are counted here; `identity_library` mirrors the state
	// without counting, because the bootstrapper probes the API namespace
	// first on every attempt.
	fn api_library(&self) -> Option<Arc<dyn ApiLibrary>> {
		let checks = self.inner.readiness_checks.fetch_add(1, Ordering::Relaxed) + 1;

		self.attached(checks).then(|| self.inner.api.clone() as Arc<dyn ApiLibrary>)
	}

	fn identity_library(&self) -> Option<Arc<dyn IdentityLibrary>> {
		let checks = self.inner.readiness_checks.load(Ordering::Relaxed);

		self.attached(checks).then(|| self.inner.identity.clone() as Arc<dyn IdentityLibrary>)
	}
}
impl Debug for ScriptedHost {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ScriptedHost")
			.field("readiness_checks", &self.readiness_checks())
			.finish()
	}
}

/// Scripted stand-in for the API client library.
#[derive(Default)]
pub struct ScriptedApiLibrary {
	init_keys: Mutex<Vec<String>>,
	init_error: Mutex<Option<LibraryError>>,
	bearer_log: Mutex<Vec<String>>,
	picker_module_loads: AtomicU32,
	picker_module_error: Mutex<Option<LibraryError>>,
	picker_outcomes: Mutex<VecDeque<PickerOutcome>>,
	picker_requests: Mutex<Vec<PickerRequest>>,
	picker_gate: Arc<AsyncMutex<()>>,
	picker_gated: AtomicBool,
}
impl ScriptedApiLibrary {
	/// Programs `init_client` to fail.
	pub fn fail_init(&self, error: LibraryError) {
		*self.init_error.lock() = Some(error);
	}

	/// Programs `load_picker_module` to fail.
	pub fn fail_picker_module(&self, error: LibraryError) {
		*self.picker_module_error.lock() = Some(error);
	}

	/// Queues the widget decision for the next `open_picker` call.
	///
	/// An empty queue answers with a dismissal.
	pub fn queue_picker_outcome(&self, outcome: PickerOutcome) {
		self.picker_outcomes.lock().push_back(outcome);
	}

	/// Makes `open_picker` wait on the returned gate before settling.
	///
	/// Tests lock the gate up front to keep a session pending, then drop the
	/// guard to let it settle.
	pub fn hold_picker(&self) -> Arc<AsyncMutex<()>> {
		self.picker_gated.store(true, Ordering::Relaxed);

		self.picker_gate.clone()
	}

	/// API keys passed to `init_client`, in call order.
	pub fn init_keys(&self) -> Vec<String> {
		self.init_keys.lock().clone()
	}

	/// Exposed credentials mirrored into the authorization state, in order.
	pub fn bearer_credentials(&self) -> Vec<String> {
		self.bearer_log.lock().clone()
	}

	/// Number of picker-module loads performed.
	pub fn picker_module_loads(&self) -> u32 {
		self.picker_module_loads.load(Ordering::Relaxed)
	}

	/// Widget configurations received by `open_picker`, in call order.
	pub fn picker_requests(&self) -> Vec<PickerRequest> {
		self.picker_requests.lock().clone()
	}
}
impl ApiLibrary for ScriptedApiLibrary {
	fn init_client(&self, api_key: &str) -> HostFuture<'_, ()> {
		let api_key = api_key.to_owned();

		Box::pin(async move {
			if let Some(error) = self.init_error.lock().clone() {
				return Err(error);
			}

			self.init_keys.lock().push(api_key);

			Ok(())
		})
	}

	fn set_bearer_credential(&self, credential: &Credential) {
		self.bearer_log.lock().push(credential.expose().to_owned());
	}

	fn load_picker_module(&self) -> HostFuture<'_, ()> {
		Box::pin(async move {
			if let Some(error) = self.picker_module_error.lock().clone() {
				return Err(error);
			}

			self.picker_module_loads.fetch_add(1, Ordering::Relaxed);

			Ok(())
		})
	}

	fn open_picker(&self, request: PickerRequest) -> PickerFuture<'_> {
		Box::pin(async move {
			self.picker_requests.lock().push(request);

			if self.picker_gated.load(Ordering::Relaxed) {
				let _released = self.picker_gate.lock().await;
			}

			self.picker_outcomes.lock().pop_front().unwrap_or(PickerOutcome::Dismissed)
		})
	}
}
impl Debug for ScriptedApiLibrary {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ScriptedApiLibrary")
			.field("picker_module_loads", &self.picker_module_loads())
			.finish()
	}
}

/// Scripted stand-in for the identity library.
pub struct ScriptedIdentityLibrary {
	token_client_inits: Mutex<Vec<(String, String)>>,
	token_client_error: Mutex<Option<LibraryError>>,
	grants: GrantQueue,
	requests: TokenRequestLog,
	probe: Mutex<Result<Option<String>, LibraryError>>,
}
impl Default for ScriptedIdentityLibrary {
	fn default() -> Self {
		Self {
			token_client_inits: Mutex::new(Vec::new()),
			token_client_error: Mutex::new(None),
			grants: Arc::new(Mutex::new(VecDeque::new())),
			requests: Arc::new(Mutex::new(Vec::new())),
			probe: Mutex::new(Ok(None)),
		}
	}
}
impl ScriptedIdentityLibrary {
	/// Programs `init_token_client` to fail.
	pub fn fail_token_client(&self, error: LibraryError) {
		*self.token_client_error.lock() = Some(error);
	}

	/// Queues the result for the next token request.
	///
	/// An empty queue settles with an empty grant.
	pub fn queue_grant(&self, grant: Result<TokenGrant, LibraryError>) {
		self.grants.lock().push_back(grant);
	}

	/// Programs the silent identity probe to yield an email.
	pub fn set_probe_email(&self, email: impl Into<String>) {
		*self.probe.lock() = Ok(Some(email.into()));
	}

	/// Programs the silent identity probe to fail.
	pub fn fail_probe(&self, error: LibraryError) {
		*self.probe.lock() = Err(error);
	}

	/// `(client_id, normalized scope)` pairs seen by `init_token_client`.
	pub fn token_client_inits(&self) -> Vec<(String, String)> {
		self.token_client_inits.lock().clone()
	}

	/// `(prompt, login hint)` pairs seen by the token handle, in call order.
	pub fn token_requests(&self) -> Vec<(ConsentPrompt, Option<String>)> {
		self.requests.lock().clone()
	}
}
impl IdentityLibrary for ScriptedIdentityLibrary {
	fn init_token_client(
		&self,
		client_id: &str,
		scope: &ScopeSet,
	) -> Result<Arc<dyn TokenRequestHandle>, LibraryError> {
		if let Some(error) = self.token_client_error.lock().clone() {
			return Err(error);
		}

		self.token_client_inits.lock().push((client_id.to_owned(), scope.normalized()));

		Ok(Arc::new(ScriptedTokenHandle {
			grants: self.grants.clone(),
			requests: self.requests.clone(),
		}))
	}

	fn probe_identity(&self) -> HostFuture<'_, Option<String>> {
		Box::pin(async move { self.probe.lock().clone() })
	}
}
impl Debug for ScriptedIdentityLibrary {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ScriptedIdentityLibrary")
			.field("token_requests", &self.requests.lock().len())
			.finish()
	}
}

struct ScriptedTokenHandle {
	grants: GrantQueue,
	requests: TokenRequestLog,
}
impl TokenRequestHandle for ScriptedTokenHandle {
	fn request_access_token(
		&self,
		prompt: ConsentPrompt,
		login_hint: Option<&str>,
	) -> HostFuture<'_, TokenGrant> {
		let login_hint = login_hint.map(str::to_owned);

		Box::pin(async move {
			self.requests.lock().push((prompt, login_hint));

			self.grants.lock().pop_front().unwrap_or_else(|| Ok(TokenGrant::empty()))
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse scripted host URL fixture.")
	}

	#[tokio::test]
	async fn script_injection_is_idempotent() {
		let host = ScriptedHost::new();
		let script = url("https://example.com/lib.js");

		host.inject_script(&script).await.expect("First injection should succeed.");
		host.inject_script(&script).await.expect("Repeated injection should succeed.");

		assert_eq!(host.injected_scripts(), vec![script]);
	}

	#[tokio::test]
	async fn readiness_attaches_after_the_programmed_checks() {
		let host = ScriptedHost::new();

		host.set_ready_after(2);

		assert!(host.api_library().is_none());
		assert!(host.identity_library().is_none());
		assert!(host.api_library().is_none());
		assert!(host.api_library().is_some());
		assert!(host.identity_library().is_some());
		assert_eq!(host.readiness_checks(), 3);
	}

	#[tokio::test]
	async fn token_handle_records_requests_and_drains_grants() {
		let identity = ScriptedIdentityLibrary::default();
		let scope = ScopeSet::new(["drive.file"]).expect("Scope fixture should be valid.");

		identity.queue_grant(Ok(TokenGrant::issued("T1")));

		let handle = identity
			.init_token_client("client-1", &scope)
			.expect("Token client init should succeed.");
		let grant = handle
			.request_access_token(ConsentPrompt::Silent, Some("a@x.edu"))
			.await
			.expect("Queued grant should settle successfully.");

		assert_eq!(grant.access_token.as_deref(), Some("T1"));
		assert_eq!(
			identity.token_requests(),
			vec![(ConsentPrompt::Silent, Some("a@x.edu".into()))],
		);

		let drained = handle
			.request_access_token(ConsentPrompt::SelectAccount, None)
			.await
			.expect("Drained queue should settle with an empty grant.");

		assert_eq!(drained, TokenGrant::empty());
	}
}
