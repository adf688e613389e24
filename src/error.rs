//! Broker-level error types shared across bootstrap, flows, and stores.

// self
use crate::{_prelude::*, bootstrap::BootstrapState, host::LibraryError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Hint-storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The third-party libraries never became usable.
	#[error(transparent)]
	Bootstrap(#[from] BootstrapError),
	/// Every credential-acquisition strategy was exhausted.
	#[error(transparent)]
	TokenAcquisition(#[from] TokenAcquisitionError),
	/// A selection was attempted on a broker whose bootstrap is absent.
	#[error(transparent)]
	NotReady(#[from] NotReadyError),
	/// A second selection session was requested while one is pending.
	#[error(transparent)]
	SessionBusy(#[from] SessionBusyError),
	/// The selection settled but the collaborator failed to store the result.
	#[error(transparent)]
	Persistence(#[from] PersistenceError),
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Descriptor construction or validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Descriptor identifier is invalid.
	#[error(transparent)]
	InvalidProviderId(#[from] crate::provider::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Identity hint failed validation.
	#[error("Identity hint is invalid.")]
	InvalidHint(#[from] crate::auth::HintValidationError),
	/// A library script URL cannot be parsed.
	#[error("Library script URL is invalid.")]
	InvalidScriptUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Bootstrap failures; fatal for the broker instance, no retry inside it.
#[derive(Debug, ThisError)]
pub enum BootstrapError {
	/// One of the two library scripts failed to load.
	#[error("Failed to load the library script at {url}.")]
	ScriptLoad {
		/// Script URL that failed to load.
		url: Url,
		/// Failure reported by the host environment.
		#[source]
		source: LibraryError,
	},
	/// Both scripts loaded but the expected entry points never attached.
	#[error("Picker libraries did not become ready after {attempts} checks (~{waited_ms}ms).")]
	NeverReady {
		/// Number of readiness checks performed.
		attempts: u32,
		/// Approximate time spent polling, in milliseconds.
		waited_ms: u64,
	},
	/// The API client rejected initialization.
	#[error("API client initialization failed.")]
	ClientInit {
		/// Failure reported by the API library.
		#[source]
		source: LibraryError,
	},
	/// The identity library refused to build a token-request handle.
	#[error("Token client initialization failed.")]
	TokenClientInit {
		/// Failure reported by the identity library.
		#[source]
		source: LibraryError,
	},
	/// The picker sub-module failed to load.
	#[error("Picker module failed to load.")]
	PickerModuleLoad {
		/// Failure reported by the API library.
		#[source]
		source: LibraryError,
	},
	/// The broker was disposed while bootstrap was in flight.
	#[error("Broker was disposed during bootstrap.")]
	Disposed,
}

/// All four credential strategies are exhausted; fatal for the current call.
#[derive(Debug, ThisError)]
pub enum TokenAcquisitionError {
	/// The interactive consent request was rejected by the identity library.
	#[error("Interactive authorization failed.")]
	Interactive {
		/// Error reported by the identity library's consent callback.
		#[source]
		source: LibraryError,
	},
	/// The consent callback settled without a usable access token.
	#[error("Identity library settled without an access token.")]
	EmptyGrant,
}

/// Raised when a selection is attempted and bootstrap is knowingly absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Broker is not ready (bootstrap state: {state}).")]
pub struct NotReadyError {
	/// Bootstrap state observed at rejection time.
	pub state: BootstrapState,
}

/// Raised when a second selection session is requested while one is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ThisError)]
#[error("A selection session is already open on this broker.")]
pub struct SessionBusyError;

/// The selection or upload settled but the collaborator failed to store it.
#[derive(Debug, ThisError)]
#[error("Failed to persist via `{endpoint}`.")]
pub struct PersistenceError {
	/// Collaborator endpoint the failure belongs to.
	pub endpoint: &'static str,
	/// Underlying collaborator failure.
	#[source]
	pub source: BackendError,
}

/// Failures produced by collaborator transports.
#[derive(Debug, ThisError)]
pub enum BackendError {
	/// Request could not be constructed (URL join, payload assembly).
	#[error("Failed to build the collaborator request.")]
	Request {
		/// Underlying construction failure.
		#[source]
		source: BoxError,
	},
	/// Transport failure (DNS, TCP, TLS).
	#[error("Network error occurred while calling the collaborator.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Collaborator answered with an unexpected status code.
	#[error("Collaborator returned an unexpected status: {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the collaborator.
		status: u16,
		/// Preview of the response body, when available.
		body_preview: Option<String>,
	},
	/// Collaborator returned malformed JSON.
	#[error("Collaborator returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl BackendError {
	/// Wraps a transport-specific request-construction failure.
	pub fn request(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Request { source: Box::new(src) }
	}

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for BackendError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
