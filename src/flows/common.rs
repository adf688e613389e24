//! Shared flow types: selection configuration, normalized outcomes, and the
//! ordered credential-strategy chain.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	backend::{SelectionRecord, StoredFile},
	host::PickedDocument,
};

/// Per-invocation configuration for [`Broker::open_selection`](crate::flows::Broker::open_selection).
pub struct SelectionConfig {
	/// Attachment category forwarded to the persistence endpoint.
	pub default_category: String,
	/// Optional direct-result callback invoked with the normalized descriptor.
	pub on_picked: Option<Box<dyn Fn(FileDescriptor) + Send + Sync>>,
	/// Stops after the callback without calling the persistence endpoint.
	///
	/// Only honored together with `on_picked`; without a callback the
	/// descriptor would otherwise go nowhere.
	pub skip_persistence: bool,
}
impl SelectionConfig {
	/// Creates a configuration that persists into the provided category.
	pub fn new(default_category: impl Into<String>) -> Self {
		Self { default_category: default_category.into(), on_picked: None, skip_persistence: false }
	}

	/// Registers a direct-result callback.
	pub fn with_on_picked(mut self, callback: impl Fn(FileDescriptor) + Send + Sync + 'static) -> Self {
		self.on_picked = Some(Box::new(callback));

		self
	}

	/// Overrides the skip-persistence flag.
	pub fn with_skip_persistence(mut self, skip: bool) -> Self {
		self.skip_persistence = skip;

		self
	}
}
impl Debug for SelectionConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SelectionConfig")
			.field("default_category", &self.default_category)
			.field("on_picked", &self.on_picked.is_some())
			.field("skip_persistence", &self.skip_persistence)
			.finish()
	}
}

/// Normalized result of one remotely selected file.
///
/// Created once per confirmed selection and never mutated; ownership moves to
/// whichever consumer (callback or persistence path) receives it. The
/// credential is the one captured at widget-open time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
	/// Provider-side document identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Media type.
	pub media_type: String,
	/// User-facing link to the document.
	pub link: Url,
	/// Icon reference, when available.
	pub icon: Option<Url>,
	/// Thumbnail (preview) reference, when available.
	pub thumbnail: Option<Url>,
	/// Byte size, when known.
	pub size: Option<u64>,
	/// Credential that can fetch the document's bytes later.
	pub credential: Credential,
}
impl FileDescriptor {
	pub(crate) fn from_picked(document: PickedDocument, credential: Credential) -> Self {
		Self {
			id: document.id,
			name: document.name,
			media_type: document.mime_type,
			link: document.url,
			icon: document.icon_url,
			thumbnail: document.preview_url,
			size: document.size_bytes,
			credential,
		}
	}

	/// Collaborator payload carrying the public fields; the credential stays
	/// behind.
	pub fn to_record(&self, category: impl Into<String>) -> SelectionRecord {
		SelectionRecord {
			id: self.id.clone(),
			name: self.name.clone(),
			mime_type: self.media_type.clone(),
			link: self.link.clone(),
			icon: self.icon.clone(),
			thumbnail: self.thumbnail.clone(),
			size: self.size,
			category: category.into(),
		}
	}
}

/// Settled outcome of one selection invocation.
#[derive(Debug)]
pub enum SelectionOutcome {
	/// Persisted through the collaborator; the canonical record came back.
	Stored(StoredFile),
	/// Delivered to the caller's callback with persistence skipped.
	Picked(FileDescriptor),
	/// The user dismissed the widget without selecting. Not an error.
	Cancelled,
}
impl SelectionOutcome {
	/// Returns true for the dismissed-without-selection outcome.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, SelectionOutcome::Cancelled)
	}
}

/// Ordered credential-acquisition strategies; first success wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireStrategy {
	/// Reuse the credential already held by this broker. No I/O.
	CachedCredential,
	/// Adopt a previously-stored credential from the collaborator backend.
	BackendIssued,
	/// Request a fresh credential without showing UI.
	SilentReauthorize,
	/// Request a fresh credential through the account-chooser UI.
	InteractiveReauthorize,
}
impl AcquireStrategy {
	/// Evaluation order of the chain, tried by short-circuiting sequential
	/// iteration.
	pub const CHAIN: [Self; 4] = [
		Self::CachedCredential,
		Self::BackendIssued,
		Self::SilentReauthorize,
		Self::InteractiveReauthorize,
	];

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireStrategy::CachedCredential => "cached_credential",
			AcquireStrategy::BackendIssued => "backend_issued",
			AcquireStrategy::SilentReauthorize => "silent_reauthorize",
			AcquireStrategy::InteractiveReauthorize => "interactive_reauthorize",
		}
	}
}
impl Display for AcquireStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
