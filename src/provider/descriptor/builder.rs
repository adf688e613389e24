// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	provider::{PickerDefaults, ProviderDescriptor, ProviderId, ProviderScripts, ReadinessCadence},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ProviderDescriptorError {
	/// The API client library script is required.
	#[error("Missing API library script URL.")]
	MissingApiScript,
	/// The identity library script is required.
	#[error("Missing identity library script URL.")]
	MissingIdentityScript,
	/// Library scripts must be served over HTTPS.
	#[error("The {script} library script must use HTTPS: {url}.")]
	InsecureScript {
		/// Which script failed validation.
		script: &'static str,
		/// Script URL that failed validation.
		url: String,
	},
	/// The token-request handle needs at least one scope.
	#[error("Descriptor must declare at least one scope.")]
	EmptyScope,
	/// Readiness polling needs a non-zero interval.
	#[error("Readiness poll interval must be non-zero.")]
	ZeroPollInterval,
	/// Readiness polling needs at least one attempt.
	#[error("Readiness poll needs at least one attempt.")]
	ZeroPollAttempts,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// API client library script (required).
	pub api_script: Option<Url>,
	/// Identity library script (required).
	pub identity_script: Option<Url>,
	/// Scope set bound to the token-request handle.
	pub scope: ScopeSet,
	/// Readiness-poll cadence.
	pub readiness: ReadinessCadence,
	/// Picker widget presentation defaults.
	pub picker: PickerDefaults,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			api_script: None,
			identity_script: None,
			scope: ScopeSet::default(),
			readiness: ReadinessCadence::default(),
			picker: PickerDefaults::default(),
		}
	}

	/// Sets the API client library script.
	pub fn api_script(mut self, url: Url) -> Self {
		self.api_script = Some(url);

		self
	}

	/// Sets the identity library script.
	pub fn identity_script(mut self, url: Url) -> Self {
		self.identity_script = Some(url);

		self
	}

	/// Sets the scope set bound to the token-request handle.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the readiness-poll cadence.
	pub fn readiness(mut self, cadence: ReadinessCadence) -> Self {
		self.readiness = cadence;

		self
	}

	/// Overrides the picker presentation defaults.
	pub fn picker(mut self, picker: PickerDefaults) -> Self {
		self.picker = picker;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let api = self.api_script.ok_or(ProviderDescriptorError::MissingApiScript)?;
		let identity = self.identity_script.ok_or(ProviderDescriptorError::MissingIdentityScript)?;
		let descriptor = ProviderDescriptor {
			id: self.id,
			scripts: ProviderScripts { api, identity },
			scope: self.scope,
			readiness: self.readiness,
			picker: self.picker,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_script("API", &self.scripts.api)?;
		validate_script("identity", &self.scripts.identity)?;

		if self.scope.is_empty() {
			return Err(ProviderDescriptorError::EmptyScope);
		}
		if self.readiness.interval_ms == 0 {
			return Err(ProviderDescriptorError::ZeroPollInterval);
		}
		if self.readiness.max_attempts == 0 {
			return Err(ProviderDescriptorError::ZeroPollAttempts);
		}

		Ok(())
	}
}

fn validate_script(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureScript { script: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
