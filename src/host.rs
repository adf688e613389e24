//! Trait seams for the embedding host and the two third-party client libraries.
//!
//! The broker never talks to a real script runtime directly: everything the
//! external libraries do—script injection, client initialization, consent
//! callbacks, the picker widget—is reached through the traits in this module,
//! each returning boxed `Send` futures so flow logic reads as sequential
//! `await`-based chaining. [`ScriptedHost`](scripted::ScriptedHost) provides
//! an in-process implementation for local development and tests.

pub mod scripted;

// self
use crate::{_prelude::*, auth::{Credential, ScopeSet}};

/// Boxed future returned by host and library calls.
pub type HostFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LibraryError>> + 'a + Send>>;

/// Boxed future returned by [`ApiLibrary::open_picker`].
///
/// The widget settles with a pick or a dismissal; it has no error channel of
/// its own, matching the callback contract of the underlying picker API.
pub type PickerFuture<'a> = Pin<Box<dyn Future<Output = PickerOutcome> + 'a + Send>>;

/// Failure reported by a third-party library callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryError {
	/// Machine-readable error code, when the library supplies one.
	pub code: Option<String>,
	/// Human-readable message suitable for display.
	pub message: String,
}
impl LibraryError {
	/// Creates an error carrying only a message.
	pub fn message(message: impl Into<String>) -> Self {
		Self { code: None, message: message.into() }
	}

	/// Creates an error carrying a library code and a message.
	pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { code: Some(code.into()), message: message.into() }
	}
}
impl Display for LibraryError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.code {
			Some(code) => write!(f, "{} ({code})", self.message),
			None => f.write_str(&self.message),
		}
	}
}
impl StdError for LibraryError {}

/// Execution context that can inject scripts and expose library namespaces.
///
/// Script injection must be idempotent: a URL already present in the context
/// resolves as loaded without re-fetching. The two accessor methods are the
/// readiness predicate—the libraries attach their global entry points
/// asynchronously after their scripts resolve, so both may return `None` for
/// a while even after successful injection.
pub trait HostRuntime: Send + Sync + 'static {
	/// Injects a script by URL, resolving once it has executed.
	fn inject_script(&self, url: &Url) -> HostFuture<'_, ()>;

	/// Handle to the API client library, once its entry points attached.
	fn api_library(&self) -> Option<Arc<dyn ApiLibrary>>;

	/// Handle to the identity library, once its entry points attached.
	fn identity_library(&self) -> Option<Arc<dyn IdentityLibrary>>;
}

/// API client library surface: client init, authorization state, picker.
pub trait ApiLibrary: Send + Sync {
	/// Initializes the client with the application's API key.
	fn init_client(&self, api_key: &str) -> HostFuture<'_, ()>;

	/// Mirrors a credential into the library's request-authorization state so
	/// dependent library calls implicitly carry it.
	fn set_bearer_credential(&self, credential: &Credential);

	/// Loads the picker sub-module; called lazily, at most once per broker.
	fn load_picker_module(&self) -> HostFuture<'_, ()>;

	/// Opens the picker widget and settles with the user's decision.
	fn open_picker(&self, request: PickerRequest) -> PickerFuture<'_>;
}

/// Identity library surface: token-request handle and the silent probe.
pub trait IdentityLibrary: Send + Sync {
	/// Builds the reusable token-request handle bound to a fixed scope set.
	fn init_token_client(
		&self,
		client_id: &str,
		scope: &ScopeSet,
	) -> Result<Arc<dyn TokenRequestHandle>, LibraryError>;

	/// Best-effort silent probe for the signed-in account's email.
	fn probe_identity(&self) -> HostFuture<'_, Option<String>>;
}

/// Reusable handle requesting access tokens from the identity library.
pub trait TokenRequestHandle: Send + Sync {
	/// Requests an access token with the given prompt and optional login hint.
	///
	/// An `Err` carries the library's callback error; an `Ok` grant may still
	/// hold no token—the callback settled without one, which callers treat
	/// separately from an error.
	fn request_access_token(
		&self,
		prompt: ConsentPrompt,
		login_hint: Option<&str>,
	) -> HostFuture<'_, TokenGrant>;
}

/// Consent prompt mode forwarded to the identity library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsentPrompt {
	/// Empty prompt: attempt re-authorization without showing UI.
	Silent,
	/// Explicit account chooser; may present UI and suspend the caller.
	SelectAccount,
}
impl ConsentPrompt {
	/// Returns the prompt value the identity library expects.
	pub const fn as_str(self) -> &'static str {
		match self {
			ConsentPrompt::Silent => "",
			ConsentPrompt::SelectAccount => "select_account",
		}
	}
}
impl Display for ConsentPrompt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Settled outcome of one token-request callback.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenGrant {
	/// Access token issued by the callback, if any.
	pub access_token: Option<String>,
}
impl TokenGrant {
	/// Wraps an issued access token.
	pub fn issued(token: impl Into<String>) -> Self {
		Self { access_token: Some(token.into()) }
	}

	/// A callback that settled without a token.
	pub fn empty() -> Self {
		Self::default()
	}
}

/// Widget configuration assembled by the selection session.
#[derive(Clone, Debug)]
pub struct PickerRequest {
	/// Application API key forwarded to the widget.
	pub api_key: String,
	/// Credential captured at widget-open time.
	pub credential: Credential,
	/// Views presented by the widget, in display order.
	pub views: Vec<PickerView>,
	/// Whether the widget allows selecting more than one file.
	pub multi_select: bool,
}

/// A view tab inside the picker widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerView {
	/// Existing-files browser seeded with the most recent documents.
	Browse {
		/// Present documents as a thumbnail grid instead of a list.
		thumbnails: bool,
	},
	/// In-widget upload surface for files not yet in the remote account.
	Upload,
}
impl PickerView {
	/// Returns a stable label for assertions and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			PickerView::Browse { .. } => "browse",
			PickerView::Upload => "upload",
		}
	}
}

/// Decision reported by the picker widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOutcome {
	/// The user confirmed a selection.
	Picked(PickedDocument),
	/// The user dismissed the widget without selecting.
	Dismissed,
}

/// Widget-native description of the document the user picked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickedDocument {
	/// Provider-side document identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Media type reported by the provider.
	pub mime_type: String,
	/// User-facing link to the document.
	pub url: Url,
	/// Icon reference, when the provider supplies one.
	pub icon_url: Option<Url>,
	/// Preview (thumbnail) reference, when the provider supplies one.
	pub preview_url: Option<Url>,
	/// Byte size; providers omit it for some document kinds.
	pub size_bytes: Option<u64>,
}
