//! Descriptor data structures shared by bootstrap and selection flows.
//!
//! A descriptor tells the broker everything environment-specific about one
//! third-party picker stack: which two scripts to inject, which scope set the
//! token-request handle is bound to, how patiently to poll for readiness, and
//! how the picker widget is presented by default.

/// Builder API for assembling picker-stack descriptors.
pub mod builder;

pub use builder::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, auth::ScopeSet, error::ConfigError, provider::ProviderId};

/// Scope granting read/write access to files created by this application.
pub const SCOPE_APP_FILES: &str = "https://www.googleapis.com/auth/drive.file";
/// Scope granting read-only access across the connected account.
pub const SCOPE_BROAD_READONLY: &str = "https://www.googleapis.com/auth/drive.readonly";

const GOOGLE_API_SCRIPT: &str = "https://apis.google.com/js/api.js";
const GOOGLE_IDENTITY_SCRIPT: &str = "https://accounts.google.com/gsi/client";

/// Script URL pair for the two client libraries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderScripts {
	/// API client library script.
	pub api: Url,
	/// Identity library script.
	pub identity: Url,
}

/// Bounded readiness-poll cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessCadence {
	/// Interval between readiness checks, in milliseconds.
	pub interval_ms: u64,
	/// Number of checks performed before giving up.
	pub max_attempts: u32,
}
impl Default for ReadinessCadence {
	fn default() -> Self {
		Self { interval_ms: 100, max_attempts: 40 }
	}
}
impl ReadinessCadence {
	/// Interval between readiness checks.
	pub fn interval(&self) -> StdDuration {
		StdDuration::from_millis(self.interval_ms)
	}

	/// Approximate total time spent polling before giving up, in milliseconds.
	pub fn waited_ms(&self) -> u64 {
		self.interval_ms.saturating_mul(u64::from(self.max_attempts))
	}
}

/// Defaults applied to every picker widget opened through the descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerDefaults {
	/// Present the browse view as a thumbnail grid of recent documents.
	pub thumbnails: bool,
}
impl Default for PickerDefaults {
	fn default() -> Self {
		Self { thumbnails: true }
	}
}

/// Immutable descriptor of a third-party picker stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Library scripts injected during bootstrap.
	pub scripts: ProviderScripts,
	/// Scope set the token-request handle is bound to.
	pub scope: ScopeSet,
	/// Readiness-poll cadence.
	pub readiness: ReadinessCadence,
	/// Picker widget presentation defaults.
	pub picker: PickerDefaults,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor preset for the Google Drive picker stack.
	pub fn google_drive() -> Result<Self, ConfigError> {
		let api = Url::parse(GOOGLE_API_SCRIPT)
			.map_err(|source| ConfigError::InvalidScriptUrl { source })?;
		let identity = Url::parse(GOOGLE_IDENTITY_SCRIPT)
			.map_err(|source| ConfigError::InvalidScriptUrl { source })?;
		let descriptor = Self::builder(ProviderId::new("google-drive")?)
			.api_script(api)
			.identity_script(identity)
			.scope(ScopeSet::new([SCOPE_APP_FILES, SCOPE_BROAD_READONLY])?)
			.build()?;

		Ok(descriptor)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn google_drive_preset_builds_with_the_fixed_scope_set() {
		let descriptor =
			ProviderDescriptor::google_drive().expect("Google Drive preset should build.");

		assert_eq!(descriptor.id.as_ref(), "google-drive");
		assert_eq!(descriptor.scripts.api.as_str(), GOOGLE_API_SCRIPT);
		assert_eq!(descriptor.scripts.identity.as_str(), GOOGLE_IDENTITY_SCRIPT);
		assert!(descriptor.scope.contains(SCOPE_APP_FILES));
		assert!(descriptor.scope.contains(SCOPE_BROAD_READONLY));
		assert_eq!(descriptor.readiness, ReadinessCadence::default());
		assert!(descriptor.picker.thumbnails);
	}

	#[test]
	fn default_cadence_matches_the_original_timing() {
		let cadence = ReadinessCadence::default();

		assert_eq!(cadence.interval(), StdDuration::from_millis(100));
		assert_eq!(cadence.max_attempts, 40);
		assert_eq!(cadence.waited_ms(), 4_000);
	}
}
