//! Remembered account-email hint used to bias credential re-acquisition.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::de::Error as DeError;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const HINT_MAX_LEN: usize = 254;

/// Errors emitted when validating identity hints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum HintValidationError {
	/// The hint was empty.
	#[error("Identity hint cannot be empty.")]
	Empty,
	/// The hint contains whitespace characters.
	#[error("Identity hint contains whitespace.")]
	ContainsWhitespace,
	/// The hint does not look like a single email address.
	#[error("Identity hint is not a plausible email address.")]
	NotAnEmail,
	/// The hint exceeded the allowed character count.
	#[error("Identity hint exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Validated end-user email remembered across sessions.
///
/// Absence of a hint is always valid and must never block acquisition; the
/// hint merely biases account selection during re-authorization. Formatters
/// redact the address; use [`fingerprint`](Self::fingerprint) for log-safe
/// correlation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdentityHint(String);
impl IdentityHint {
	/// Creates a new hint after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, HintValidationError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Returns the remembered email address. Callers must avoid logging it.
	pub fn email(&self) -> &str {
		&self.0
	}

	/// Stable log-safe reference: base64 (no padding) SHA-256 of the address.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}
impl AsRef<str> for IdentityHint {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<IdentityHint> for String {
	fn from(value: IdentityHint) -> Self {
		value.0
	}
}
impl TryFrom<String> for IdentityHint {
	type Error = HintValidationError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for IdentityHint {
	type Err = HintValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for IdentityHint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("IdentityHint").field(&"<redacted>").finish()
	}
}
impl Display for IdentityHint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
impl Serialize for IdentityHint {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}
impl<'de> Deserialize<'de> for IdentityHint {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = String::deserialize(deserializer)?;

		Self::try_from(value).map_err(DeError::custom)
	}
}

/// Durable record persisted by hint stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHint {
	/// The remembered address.
	pub email: IdentityHint,
	/// Instant the hint was last written.
	pub remembered_at: OffsetDateTime,
}
impl StoredHint {
	/// Stamps a hint with the current instant.
	pub fn new(email: IdentityHint) -> Self {
		Self { email, remembered_at: OffsetDateTime::now_utc() }
	}
}

fn validate_view(view: &str) -> Result<(), HintValidationError> {
	if view.is_empty() {
		return Err(HintValidationError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(HintValidationError::ContainsWhitespace);
	}
	if view.chars().count() > HINT_MAX_LEN {
		return Err(HintValidationError::TooLong { max: HINT_MAX_LEN });
	}

	let mut parts = view.split('@');

	match (parts.next(), parts.next(), parts.next()) {
		(Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(HintValidationError::NotAnEmail),
	}
}
